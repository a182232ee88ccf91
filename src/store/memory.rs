//! In-process store with the same uniqueness rules as the managed table.

use super::{ConfirmOutcome, InsertOutcome, NewUser, Store, UserRecord};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct Row {
    id: String,
    user: NewUser,
    email_confirmed: bool,
    token_hash: Option<String>,
}

/// Queued outbound email, as an external mailer would read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub to_email: String,
    pub template: String,
    pub confirm_url: String,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Row>>,
    outbox: Mutex<Vec<OutboxEntry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn outbox(&self) -> Vec<OutboxEntry> {
        self.outbox.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }

    /// Stored CPF and password hash for `email`, for assertions in tests.
    pub async fn stored_credentials(&self, email: &str) -> Option<(String, String)> {
        self.rows
            .lock()
            .await
            .iter()
            .find(|row| row.user.email == email)
            .map(|row| (row.user.cpf.clone(), row.user.password_hash.clone()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, user: &NewUser) -> Result<InsertOutcome> {
        let mut rows = self.rows.lock().await;

        if rows
            .iter()
            .any(|row| row.user.email == user.email || row.user.cpf == user.cpf)
        {
            return Ok(InsertOutcome::Conflict);
        }

        let id = (rows.len() + 1).to_string();

        rows.push(Row {
            id: id.clone(),
            user: user.clone(),
            email_confirmed: user.email_confirmed(),
            token_hash: user.confirmation.as_ref().map(|c| c.token_hash.clone()),
        });

        if let Some(confirmation) = &user.confirmation {
            self.outbox.lock().await.push(OutboxEntry {
                to_email: user.email.clone(),
                template: super::CONFIRM_EMAIL_TEMPLATE.to_string(),
                confirm_url: confirmation.confirm_url.clone(),
            });
        }

        Ok(InsertOutcome::Created(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|row| row.user.email == email)
            .map(|row| UserRecord {
                id: row.id.clone(),
                name: row.user.name.clone(),
                email: row.user.email.clone(),
                password_hash: row.user.password_hash.clone(),
                email_confirmed: row.email_confirmed,
            }))
    }

    async fn confirm_email(&self, token_hash: &str) -> Result<ConfirmOutcome> {
        let mut rows = self.rows.lock().await;

        match rows
            .iter_mut()
            .find(|row| row.token_hash.as_deref() == Some(token_hash))
        {
            Some(row) => {
                row.email_confirmed = true;
                row.token_hash = None;
                Ok(ConfirmOutcome::Confirmed)
            }
            None => Ok(ConfirmOutcome::NotFound),
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
