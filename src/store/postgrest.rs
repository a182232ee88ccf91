//! Hosted REST gateway (PostgREST behind Supabase).
//!
//! Every request carries the project key twice: as `apikey` for the gateway
//! and as a bearer token for row-level security.

use super::{
    validate_table_name, ConfirmOutcome, InsertOutcome, NewUser, Store, UserRecord,
    CONFIRM_EMAIL_TEMPLATE,
};
use crate::cadastro::APP_USER_AGENT;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

/// SQLSTATE for unique violations, forwarded by the gateway as `code`.
const UNIQUE_VIOLATION: &str = "23505";

/// Function defined in `sql/schema.sql`.
const REGISTER_RPC: &str = "rest/v1/rpc/register_user";

const USER_COLUMNS: &str = "id,nome_completo,email,senha_hash,email_confirmado";

#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    base_url: Url,
    api_key: SecretString,
    table: String,
}

impl std::fmt::Debug for PostgrestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestStore")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"***")
            .field("table", &self.table)
            .finish()
    }
}

impl PostgrestStore {
    /// `project_url` is the project root, e.g. `https://xyz.supabase.co`.
    ///
    /// # Errors
    /// Returns an error if the URL or table name is invalid, or the HTTP client cannot be built.
    pub fn new(project_url: &str, api_key: SecretString, table: &str) -> Result<Self> {
        validate_table_name(table)?;

        let mut base_url = Url::parse(project_url)
            .with_context(|| format!("invalid Supabase URL: {project_url}"))?;

        if base_url.cannot_be_a_base() {
            return Err(anyhow!("invalid Supabase URL: {project_url}"));
        }

        // rest/v1 is resolved relative to the path, so it needs a trailing slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
            table: table.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint: {path}"))
    }

    fn table_url(&self) -> Result<Url> {
        self.endpoint(&format!("rest/v1/{}", self.table))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.api_key.expose_secret();

        request
            .header("apikey", key)
            .header("Authorization", format!("Bearer {key}"))
    }

    /// Select a single row matching `filter` (`column`, `eq.value`).
    async fn select_one(&self, select: &str, filter: (&str, &str)) -> Result<Option<Value>> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("select", select)
            .append_pair(filter.0, filter.1)
            .append_pair("limit", "1");

        let response = self.authorize(self.client.get(url.as_str())).send().await?;

        let rows = json_or_error(response, url.as_str()).await?;

        Ok(rows.as_array().and_then(|rows| rows.first()).cloned())
    }
}

/// Decode a successful response body, or turn the gateway error into `anyhow`.
async fn json_or_error(response: Response, url: &str) -> Result<Value> {
    let status = response.status();

    if !status.is_success() {
        let json_response: Value = response.json().await.unwrap_or_default();

        return Err(anyhow!(
            "{} - {}, {}",
            url,
            status,
            json_response["message"].as_str().unwrap_or("")
        ));
    }

    Ok(response.json().await?)
}

fn insert_payload(user: &NewUser) -> Value {
    json!({
        "nome_completo": user.name,
        "email": user.email,
        "senha_hash": user.password_hash,
        "cpf": user.cpf,
        "telefone": user.phone,
        "data_nascimento": user.birth_date,
        "cep": user.address.cep,
        "logradouro": user.address.street,
        "numero": user.address.number,
        "complemento": user.address.complement,
        "bairro": user.address.district,
        "cidade": user.address.city,
        "estado": user.address.state,
        "interesses": user.interests,
        "termos_aceitos": user.terms_accepted,
        "receber_newsletter": user.newsletter,
        "receber_eventos": user.events,
        "email_confirmado": user.email_confirmed(),
        "confirmacao_token": user.confirmation.as_ref().map(|c| &c.token_hash),
    })
}

/// The gateway returns ids as numbers (serial) or strings (uuid).
fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn user_from_row(row: &Value) -> Result<UserRecord> {
    Ok(UserRecord {
        id: id_to_string(&row["id"])
            .ok_or_else(|| anyhow!("Error parsing JSON response: no id found"))?,
        name: row["nome_completo"].as_str().map(str::to_string),
        email: row["email"]
            .as_str()
            .ok_or_else(|| anyhow!("Error parsing JSON response: no email found"))?
            .to_string(),
        password_hash: row["senha_hash"].as_str().unwrap_or_default().to_string(),
        email_confirmed: row["email_confirmado"].as_bool().unwrap_or(false),
    })
}

#[async_trait]
impl Store for PostgrestStore {
    /// Signup goes through the `register_user` function so the user row and
    /// its outbox row commit in the same transaction.
    #[instrument(skip(self))]
    async fn insert(&self, user: &NewUser) -> Result<InsertOutcome> {
        let url = self.endpoint(REGISTER_RPC)?;

        let confirm_url = user.confirmation.as_ref().map(|c| c.confirm_url.as_str());

        let response = self
            .authorize(self.client.post(url.as_str()))
            .json(&json!({
                "tabela": self.table,
                "usuario": insert_payload(user),
                "template": confirm_url.map(|_| CONFIRM_EMAIL_TEMPLATE),
                "confirm_url": confirm_url,
            }))
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let json_response: Value = response.json().await.unwrap_or_default();

            // 409 is also used for foreign key violations, only 23505 is a duplicate
            if json_response["code"].as_str() == Some(UNIQUE_VIOLATION) {
                debug!("User already exists");
                return Ok(InsertOutcome::Conflict);
            }

            let message = json_response["message"].as_str().unwrap_or_default();

            error!("Failed to insert user: {}", message);

            return Err(anyhow!("{} - {}, {}", url, status, message));
        }

        let id: Value = response.json().await?;
        let id = id_to_string(&id)
            .ok_or_else(|| anyhow!("Error parsing JSON response: no id found"))?;

        Ok(InsertOutcome::Created(id))
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.select_one(USER_COLUMNS, ("email", &format!("eq.{email}")))
            .await?
            .map(|row| user_from_row(&row))
            .transpose()
    }

    #[instrument(skip(self, token_hash))]
    async fn confirm_email(&self, token_hash: &str) -> Result<ConfirmOutcome> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("confirmacao_token", &format!("eq.{token_hash}"))
            .append_pair("select", "id");

        // filter and update in one statement, a token can only match once
        let response = self
            .authorize(self.client.patch(url.as_str()))
            .header("Prefer", "return=representation")
            .json(&json!({
                "email_confirmado": true,
                "confirmacao_token": null,
            }))
            .send()
            .await?;

        let rows = json_or_error(response, url.as_str()).await?;

        if rows.as_array().is_some_and(|rows| !rows.is_empty()) {
            Ok(ConfirmOutcome::Confirmed)
        } else {
            Ok(ConfirmOutcome::NotFound)
        }
    }

    async fn ping(&self) -> Result<()> {
        let url = self.endpoint("rest/v1/")?;

        let response = self.authorize(self.client.get(url.as_str())).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(anyhow!("{} - {}", url, response.status()))
        }
    }

    fn kind(&self) -> &'static str {
        "postgrest"
    }
}
