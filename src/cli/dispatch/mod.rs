//! Map parsed CLI arguments to the action the binary runs.

use crate::cli::{
    actions::{server::Args, Action},
    commands::{auth, store, ARG_PORT},
};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let store_opts = store::Options::parse(matches)?;
    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        backend: store_opts.backend,
        table: store_opts.table,
        public_url: auth_opts.public_url,
        frontend_base_url: auth_opts.frontend_base_url,
        require_email_confirmation: auth_opts.require_email_confirmation,
    }))
}
