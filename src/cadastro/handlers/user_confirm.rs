use crate::{
    cadastro::handlers::{hash_confirmation_token, non_blank, AuthConfig},
    store::{ConfirmOutcome, Store},
};
use axum::{
    extract::{Extension, Query},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::IntoParams;

#[derive(IntoParams, Deserialize)]
#[into_params(parameter_in = Query)]
pub struct ConfirmQuery {
    /// Token from the confirmation email
    token: Option<String>,
}

impl std::fmt::Debug for ConfirmQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmQuery")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

#[utoipa::path(
    get,
    path= "/user/confirm",
    params(ConfirmQuery),
    responses (
        (status = 303, description = "Redirect to the login page with the confirmation status"),
    ),
    tag= "confirm"
)]
// axum handler for the link sent by email
#[instrument(skip(store, config))]
pub async fn confirm(
    store: Extension<Arc<dyn Store>>,
    config: Extension<Arc<AuthConfig>>,
    Query(query): Query<ConfirmQuery>,
) -> impl IntoResponse {
    let Some(token) = non_blank(query.token.as_deref()) else {
        debug!("Missing token");

        return Redirect::to(&config.login_redirect("error", "Token_ausente"));
    };

    // only the hash is stored, raw tokens never reach the store
    match store.confirm_email(&hash_confirmation_token(token)).await {
        Ok(ConfirmOutcome::Confirmed) => {
            debug!("Email confirmed");

            Redirect::to(&config.login_redirect("sucesso", "Email_confirmado"))
        }
        Ok(ConfirmOutcome::NotFound) => {
            debug!("Invalid token");

            Redirect::to(&config.login_redirect("error", "Token_invalido"))
        }
        Err(e) => {
            error!("Error confirming email: {:?}", e);

            Redirect::to(&config.login_redirect("error", "Erro_na_confirmacao"))
        }
    }
}
