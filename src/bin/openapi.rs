use anyhow::Result;

fn main() -> Result<()> {
    println!("{}", cadastro::cadastro::openapi().to_pretty_json()?);

    Ok(())
}
