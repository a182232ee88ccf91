use crate::{
    cadastro::{
        handlers::{error_response, non_blank, normalize_email},
        password,
    },
    store::Store,
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

pub const MSG_MISSING_FIELDS: &str = "E-mail e senha são obrigatórios.";
pub const MSG_UNAUTHORIZED: &str = "Credenciais inválidas. Verifique seu e-mail ou senha.";
pub const MSG_UNCONFIRMED: &str = "E-mail ainda não confirmado.";
pub const MSG_INTERNAL: &str = "Falha no servidor. Tente novamente.";
pub const MSG_SUCCESS: &str = "Login bem-sucedido!";

#[derive(ToSchema, Deserialize)]
pub struct UserLogin {
    email: Option<String>,
    #[serde(rename = "senha")]
    password: Option<String>,
}

impl std::fmt::Debug for UserLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserLogin")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[utoipa::path(
    post,
    path= "/user/login",
    request_body = UserLogin,
    responses (
        (status = 200, description = "Login successful"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Email not confirmed"),
    ),
    tag= "login"
)]
// axum handler for login
#[instrument(skip(store))]
pub async fn login(
    store: Extension<Arc<dyn Store>>,
    payload: Option<Json<UserLogin>>,
) -> impl IntoResponse {
    let user: UserLogin = match payload {
        Some(Json(payload)) => payload,
        None => return error_response(StatusCode::BAD_REQUEST, "Missing payload"),
    };

    debug!("user: {:?}", user);

    let (Some(email), Some(password)) = (
        non_blank(user.email.as_deref()),
        // passwords are compared as sent, only blank ones are rejected
        user.password.as_deref().filter(|p| !p.trim().is_empty()),
    ) else {
        return error_response(StatusCode::BAD_REQUEST, MSG_MISSING_FIELDS);
    };

    let record = match store.find_by_email(&normalize_email(email)).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            debug!("User not found");

            return error_response(StatusCode::UNAUTHORIZED, MSG_UNAUTHORIZED);
        }
        Err(e) => {
            error!("Error getting user from store: {:?}", e);

            return error_response(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL);
        }
    };

    if !password::verify(password, &record.password_hash) {
        debug!("Unauthorized");

        return error_response(StatusCode::UNAUTHORIZED, MSG_UNAUTHORIZED);
    }

    if !record.email_confirmed {
        debug!("Email not confirmed");

        return error_response(StatusCode::FORBIDDEN, MSG_UNCONFIRMED);
    }

    debug!("Login successful");

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": MSG_SUCCESS,
            "user_id": record.id,
        })),
    )
        .into_response()
}
