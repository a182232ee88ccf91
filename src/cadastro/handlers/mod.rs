pub mod health;
pub use self::health::health;

pub mod user_register;
pub use self::user_register::register;

pub mod user_login;
pub use self::user_login::login;

pub mod user_confirm;
pub use self::user_confirm::confirm;

// common functions for the handlers
use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use serde_json::json;
use sha2::{Digest, Sha256};

/// Runtime settings shared by the user handlers.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    public_url: String,
    frontend_base_url: String,
    require_email_confirmation: bool,
}

impl AuthConfig {
    /// `public_url` is where this service is reachable (used in confirmation links),
    /// `frontend_base_url` is where confirmation redirects land. Empty means relative.
    #[must_use]
    pub fn new(public_url: String, frontend_base_url: String) -> Self {
        Self {
            public_url,
            frontend_base_url,
            require_email_confirmation: false,
        }
    }

    #[must_use]
    pub fn with_email_confirmation(mut self, required: bool) -> Self {
        self.require_email_confirmation = required;
        self
    }

    #[must_use]
    pub const fn require_email_confirmation(&self) -> bool {
        self.require_email_confirmation
    }

    #[must_use]
    pub fn confirm_url(&self, token: &str) -> String {
        let base = self.public_url.trim_end_matches('/');
        format!("{base}/user/confirm?token={token}")
    }

    #[must_use]
    pub fn login_redirect(&self, status: &str, message: &str) -> String {
        let base = self.frontend_base_url.trim_end_matches('/');
        format!("{base}/login?status={status}&mensagem={message}")
    }
}

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Treat missing and whitespace-only fields the same.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Create a new confirmation token for email links.
///
/// Returned token is only sent to the user; the store keeps its hash.
///
/// # Errors
/// Returns an error if the OS random source fails.
pub fn generate_confirmation_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate confirmation token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

#[must_use]
pub fn hash_confirmation_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    Base64UrlUnpadded::encode_string(&digest)
}

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
