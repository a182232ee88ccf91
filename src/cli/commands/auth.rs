use anyhow::{Context, Result};
use clap::{builder::BoolishValueParser, Arg, ArgAction, ArgMatches, Command};
use url::Url;

pub const ARG_PUBLIC_URL: &str = "public-url";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_REQUIRE_EMAIL_CONFIRMATION: &str = "require-email-confirmation";

#[derive(Debug)]
pub struct Options {
    pub public_url: String,
    pub frontend_base_url: String,
    pub require_email_confirmation: bool,
}

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// # Errors
    /// Returns an error if `--public-url` is not an absolute URL.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let public_url = matches
            .get_one::<String>(ARG_PUBLIC_URL)
            .cloned()
            .context("missing required argument: --public-url")?;

        Url::parse(&public_url).with_context(|| format!("invalid --public-url: {public_url}"))?;

        Ok(Self {
            public_url,
            frontend_base_url: matches
                .get_one::<String>(ARG_FRONTEND_BASE_URL)
                .cloned()
                .unwrap_or_default(),
            require_email_confirmation: matches.get_flag(ARG_REQUIRE_EMAIL_CONFIRMATION),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PUBLIC_URL)
                .long("public-url")
                .help("Public URL of this service, used in confirmation links")
                .env("CADASTRO_PUBLIC_URL")
                .default_value("http://localhost:8080"),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long("frontend-base-url")
                .help("Frontend base URL where confirmation redirects land (empty for relative)")
                .env("CADASTRO_FRONTEND_BASE_URL"),
        )
        .arg(
            Arg::new(ARG_REQUIRE_EMAIL_CONFIRMATION)
                .long("require-email-confirmation")
                .help("Require new users to confirm their email before login")
                .env("CADASTRO_REQUIRE_EMAIL_CONFIRMATION")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
}
