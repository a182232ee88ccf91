use crate::store::DEFAULT_TABLE;
use anyhow::{bail, Result};
use clap::{Arg, ArgGroup, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_DSN: &str = "dsn";
pub const ARG_SUPABASE_URL: &str = "supabase-url";
pub const ARG_SUPABASE_KEY: &str = "supabase-key";
pub const ARG_TABLE: &str = "table";

/// Where users are persisted.
#[derive(Debug)]
pub enum Backend {
    Postgres { dsn: SecretString },
    Postgrest { url: String, key: SecretString },
}

#[derive(Debug)]
pub struct Options {
    pub backend: Backend,
    pub table: String,
}

impl Options {
    /// Parse store arguments from matches.
    ///
    /// # Errors
    /// Returns an error if no backend, or an incomplete one, is configured.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        // clap lets empty env values through
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let backend = match (
            get_non_empty(ARG_DSN),
            get_non_empty(ARG_SUPABASE_URL),
            get_non_empty(ARG_SUPABASE_KEY),
        ) {
            (Some(dsn), None, _) => Backend::Postgres {
                dsn: SecretString::from(dsn),
            },
            (None, Some(url), Some(key)) => Backend::Postgrest {
                url,
                key: SecretString::from(key),
            },
            (None, Some(_), None) => {
                bail!("missing required argument: --{ARG_SUPABASE_KEY}")
            }
            (Some(_), Some(_), _) => {
                bail!("--{ARG_DSN} and --{ARG_SUPABASE_URL} are mutually exclusive")
            }
            (None, None, _) => {
                bail!("missing required argument: --{ARG_DSN} or --{ARG_SUPABASE_URL}")
            }
        };

        Ok(Self {
            backend,
            table: get_non_empty(ARG_TABLE).unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("Postgres connection string")
                .env("CADASTRO_DSN"),
        )
        .arg(
            Arg::new(ARG_SUPABASE_URL)
                .long("supabase-url")
                .help("Supabase project URL, example: https://<project>.supabase.co")
                .env("SUPABASE_URL")
                .requires(ARG_SUPABASE_KEY),
        )
        .arg(
            Arg::new(ARG_SUPABASE_KEY)
                .long("supabase-key")
                .help("Supabase API key")
                .env("SUPABASE_ANON_KEY")
                .hide_env_values(true)
                .requires(ARG_SUPABASE_URL),
        )
        .arg(
            Arg::new(ARG_TABLE)
                .long("table")
                .help("Table holding the registered users")
                .env("CADASTRO_TABLE")
                .default_value(DEFAULT_TABLE),
        )
        .group(
            ArgGroup::new("backend")
                .args([ARG_DSN, ARG_SUPABASE_URL])
                .required(true)
                .multiple(false),
        )
}
