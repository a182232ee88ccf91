use crate::{
    cadastro::{self, handlers::AuthConfig},
    cli::commands::store::Backend,
    store::{PgStore, PostgrestStore, Store},
};
use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub backend: Backend,
    pub table: String,
    pub public_url: String,
    pub frontend_base_url: String,
    pub require_email_confirmation: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the store cannot be reached or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let store: Arc<dyn Store> = match args.backend {
        Backend::Postgres { dsn } => Arc::new(
            PgStore::connect(dsn.expose_secret(), &args.table)
                .await
                .context("Failed to connect to database")?,
        ),
        Backend::Postgrest { url, key } => Arc::new(
            PostgrestStore::new(&url, key, &args.table)
                .context("Failed to configure PostgREST store")?,
        ),
    };

    debug!("Using {} store, table: {}", store.kind(), args.table);

    let config = AuthConfig::new(args.public_url, args.frontend_base_url)
        .with_email_confirmation(args.require_email_confirmation);

    cadastro::new(args.port, store, config).await
}
