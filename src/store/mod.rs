//! Storage collaborator.
//!
//! Users live in a managed table (`cadastro` by default) that is reached
//! either through the hosted REST gateway ([`postgrest`]) or as a plain
//! Postgres table ([`postgres`]). Handlers only see [`Store`].

pub mod memory;
pub mod postgres;
pub mod postgrest;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use std::fmt::Debug;

pub use self::{memory::MemoryStore, postgres::PgStore, postgrest::PostgrestStore};

pub const DEFAULT_TABLE: &str = "cadastro";

/// Outbox template used for confirmation links.
pub const CONFIRM_EMAIL_TEMPLATE: &str = "confirm_email";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub cep: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// Confirmation issued at signup. Only the hash of the token is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub token_hash: String,
    pub confirm_url: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub cpf: String,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub address: Address,
    pub interests: Option<String>,
    pub terms_accepted: bool,
    pub newsletter: bool,
    pub events: bool,
    pub confirmation: Option<PendingConfirmation>,
}

impl NewUser {
    #[must_use]
    pub const fn email_confirmed(&self) -> bool {
        self.confirmation.is_none()
    }
}

impl Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("password_hash", &"***")
            .field("cpf", &"***")
            .field("terms_accepted", &self.terms_accepted)
            .field("email_confirmed", &self.email_confirmed())
            .finish_non_exhaustive()
    }
}

/// Minimal data needed to authenticate a user.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub email_confirmed: bool,
}

impl Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"***")
            .field("email_confirmed", &self.email_confirmed)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Created(String),
    /// Email or CPF is already registered.
    Conflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    NotFound,
}

#[async_trait]
pub trait Store: Send + Sync + Debug {
    async fn insert(&self, user: &NewUser) -> Result<InsertOutcome>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Mark the user owning `token_hash` as confirmed and clear the token.
    async fn confirm_email(&self, token_hash: &str) -> Result<ConfirmOutcome>;

    async fn ping(&self) -> Result<()>;

    /// Backend name used in spans and logs.
    fn kind(&self) -> &'static str;
}

/// Table names end up inside SQL text and URL paths.
///
/// # Errors
/// Returns an error unless `table` matches `^[a-z_][a-z0-9_]*$`.
pub fn validate_table_name(table: &str) -> Result<()> {
    let valid = Regex::new(r"^[a-z_][a-z0-9_]*$").is_ok_and(|re| re.is_match(table));

    if valid {
        Ok(())
    } else {
        Err(anyhow!("invalid table name: {table}"))
    }
}
