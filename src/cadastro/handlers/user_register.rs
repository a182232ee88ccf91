use crate::{
    cadastro::{
        handlers::{
            error_response, generate_confirmation_token, hash_confirmation_token, non_blank,
            normalize_email, valid_email, AuthConfig,
        },
        password,
    },
    cpf,
    store::{Address, InsertOutcome, NewUser, PendingConfirmation, Store},
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

pub const MSG_MISSING_FIELDS: &str = "Dados essenciais (e-mail, senha, termos e CPF) ausentes.";
pub const MSG_INVALID_EMAIL: &str = "O formato do e-mail é inválido. Verifique o endereço.";
pub const MSG_INVALID_CPF: &str = "O CPF fornecido é inválido. Verifique os números.";
pub const MSG_CONFLICT: &str = "E-mail ou CPF já cadastrado.";
pub const MSG_INTERNAL: &str = "Erro interno ao salvar os dados.";
pub const MSG_CREATED: &str = "Cadastro realizado com sucesso!";

#[derive(ToSchema, Deserialize)]
pub struct UserRegister {
    #[serde(rename = "nome_completo", alias = "nome")]
    name: Option<String>,
    email: Option<String>,
    #[serde(rename = "senha")]
    password: Option<String>,
    cpf: Option<String>,
    #[serde(rename = "telefone")]
    phone: Option<String>,
    #[serde(rename = "data_nascimento", alias = "data-nascimento")]
    birth_date: Option<String>,
    cep: Option<String>,
    #[serde(rename = "logradouro")]
    street: Option<String>,
    #[serde(rename = "numero")]
    number: Option<String>,
    #[serde(rename = "complemento")]
    complement: Option<String>,
    #[serde(rename = "bairro")]
    district: Option<String>,
    #[serde(rename = "cidade")]
    city: Option<String>,
    #[serde(rename = "estado")]
    state: Option<String>,
    #[serde(rename = "interesses")]
    interests: Option<String>,
    #[serde(rename = "termos_aceitos", default)]
    terms_accepted: bool,
    #[serde(rename = "receber_newsletter", default)]
    newsletter: bool,
    #[serde(rename = "receber_eventos", default)]
    events: bool,
}

impl std::fmt::Debug for UserRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRegister")
            .field("email", &self.email)
            .field("password", &"***")
            .field("cpf", &self.cpf.as_ref().map(|_| "***"))
            .field("terms_accepted", &self.terms_accepted)
            .finish_non_exhaustive()
    }
}

#[utoipa::path(
    post,
    path= "/user/register",
    request_body = UserRegister,
    responses (
        (status = 201, description = "Registration successful"),
        (status = 400, description = "Missing fields, invalid email or invalid CPF"),
        (status = 409, description = "User with the specified email or CPF already exists"),
    ),
    tag= "register"
)]
// axum handler for registration
#[instrument(skip(store, config))]
pub async fn register(
    store: Extension<Arc<dyn Store>>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<UserRegister>>,
) -> impl IntoResponse {
    let user: UserRegister = match payload {
        Some(Json(payload)) => payload,
        None => return error_response(StatusCode::BAD_REQUEST, "Missing payload"),
    };

    debug!("user: {:?}", user);

    let (Some(email), Some(password), Some(raw_cpf), true) = (
        non_blank(user.email.as_deref()),
        // passwords are hashed as sent, only blank ones are rejected
        user.password.as_deref().filter(|p| !p.trim().is_empty()),
        non_blank(user.cpf.as_deref()),
        user.terms_accepted,
    ) else {
        return error_response(StatusCode::BAD_REQUEST, MSG_MISSING_FIELDS);
    };

    let email = normalize_email(email);

    if !valid_email(&email) {
        return error_response(StatusCode::BAD_REQUEST, MSG_INVALID_EMAIL);
    }

    if !cpf::is_valid(raw_cpf) {
        debug!("Invalid CPF");

        return error_response(StatusCode::BAD_REQUEST, MSG_INVALID_CPF);
    }

    let password_hash = match password::hash(password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Error hashing password: {}", e);

            return error_response(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL);
        }
    };

    let confirmation = if config.require_email_confirmation() {
        match generate_confirmation_token() {
            Ok(token) => Some(PendingConfirmation {
                token_hash: hash_confirmation_token(&token),
                confirm_url: config.confirm_url(&token),
            }),
            Err(e) => {
                error!("Error generating confirmation token: {:?}", e);

                return error_response(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL);
            }
        }
    } else {
        None
    };

    let new_user = NewUser {
        name: user.name,
        email,
        password_hash,
        cpf: cpf::normalize(raw_cpf),
        phone: user.phone,
        birth_date: user.birth_date,
        address: Address {
            cep: user.cep,
            street: user.street,
            number: user.number,
            complement: user.complement,
            district: user.district,
            city: user.city,
            state: user.state,
        },
        interests: user.interests,
        terms_accepted: user.terms_accepted,
        newsletter: user.newsletter,
        events: user.events,
        confirmation,
    };

    match store.insert(&new_user).await {
        Ok(InsertOutcome::Created(id)) => {
            info!(user_id = %id, store = store.kind(), "User created");

            (
                StatusCode::CREATED,
                Json(json!({ "message": MSG_CREATED, "email": new_user.email })),
            )
                .into_response()
        }
        Ok(InsertOutcome::Conflict) => {
            error!("User already exists");

            error_response(StatusCode::CONFLICT, MSG_CONFLICT)
        }
        Err(e) => {
            error!("Error inserting user: {:?}", e);

            error_response(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL)
        }
    }
}
