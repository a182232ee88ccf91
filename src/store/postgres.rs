//! Direct Postgres access to the managed `cadastro` table.

use super::{
    validate_table_name, ConfirmOutcome, InsertOutcome, NewUser, Store, UserRecord,
    CONFIRM_EMAIL_TEMPLATE,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use sqlx::{postgres::PgPoolOptions, Connection, PgPool, Row};
use std::time::Duration;
use tracing::{info_span, instrument, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    table: String,
}

impl PgStore {
    /// Connect a bounded pool to `dsn`.
    ///
    /// # Errors
    /// Returns an error if the table name is invalid or the database is unreachable.
    pub async fn connect(dsn: &str, table: &str) -> Result<Self> {
        validate_table_name(table)?;

        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// # Errors
    /// Returns an error if the table name is invalid.
    pub fn from_pool(pool: PgPool, table: &str) -> Result<Self> {
        validate_table_name(table)?;

        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl Store for PgStore {
    #[instrument(skip(self))]
    async fn insert(&self, user: &NewUser) -> Result<InsertOutcome> {
        let query = format!(
            "INSERT INTO {} (id, nome_completo, email, senha_hash, cpf, telefone, \
             data_nascimento, cep, logradouro, numero, complemento, bairro, cidade, estado, \
             interesses, termos_aceitos, receber_newsletter, receber_eventos, \
             email_confirmado, confirmacao_token) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20)",
            self.table
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to start signup transaction")?;

        let id = Uuid::now_v7();
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.sql.table = %self.table
        );
        let inserted = sqlx::query(&query)
            .bind(id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.cpf)
            .bind(&user.phone)
            .bind(&user.birth_date)
            .bind(&user.address.cep)
            .bind(&user.address.street)
            .bind(&user.address.number)
            .bind(&user.address.complement)
            .bind(&user.address.district)
            .bind(&user.address.city)
            .bind(&user.address.state)
            .bind(&user.interests)
            .bind(user.terms_accepted)
            .bind(user.newsletter)
            .bind(user.events)
            .bind(user.email_confirmed())
            .bind(user.confirmation.as_ref().map(|c| c.token_hash.as_str()))
            .execute(&mut *tx)
            .instrument(span)
            .await;

        match inserted {
            Ok(_) => (),
            Err(err) if is_unique_violation(&err) => {
                let _ = tx.rollback().await;
                return Ok(InsertOutcome::Conflict);
            }
            Err(err) => return Err(err).context("failed to insert user"),
        }

        if let Some(confirmation) = &user.confirmation {
            let payload = json!({ "confirm_url": confirmation.confirm_url });

            sqlx::query(
                "INSERT INTO email_outbox (id, to_email, template, payload) \
                 VALUES ($1, $2, $3, $4::jsonb)",
            )
            .bind(Uuid::now_v7())
            .bind(&user.email)
            .bind(CONFIRM_EMAIL_TEMPLATE)
            .bind(payload.to_string())
            .execute(&mut *tx)
            .await
            .context("failed to enqueue confirmation email")?;
        }

        tx.commit()
            .await
            .context("failed to commit signup transaction")?;

        Ok(InsertOutcome::Created(id.to_string()))
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let query = format!(
            "SELECT id::text AS id, nome_completo, email, senha_hash, email_confirmado \
             FROM {} WHERE email = $1",
            self.table
        );
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.sql.table = %self.table
        );

        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user by email")?;

        Ok(row.map(|row| UserRecord {
            id: row.get("id"),
            name: row.get("nome_completo"),
            email: row.get("email"),
            password_hash: row.get("senha_hash"),
            email_confirmed: row.get("email_confirmado"),
        }))
    }

    #[instrument(skip(self, token_hash))]
    async fn confirm_email(&self, token_hash: &str) -> Result<ConfirmOutcome> {
        let query = format!(
            "UPDATE {} SET email_confirmado = TRUE, confirmacao_token = NULL \
             WHERE confirmacao_token = $1 RETURNING id",
            self.table
        );
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.sql.table = %self.table
        );

        let row = sqlx::query(&query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to confirm email")?;

        Ok(if row.is_some() {
            ConfirmOutcome::Confirmed
        } else {
            ConfirmOutcome::NotFound
        })
    }

    async fn ping(&self) -> Result<()> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .context("Failed to acquire database connection")?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .context("Failed to ping database")
    }

    fn kind(&self) -> &'static str {
        "postgresql"
    }
}
