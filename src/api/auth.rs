use crate::api::session;
use crate::domain::auth::driving_ports::{OAuthSignInError, SignInError};
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{
    BasicErrorResponse, ExtraInfo, GenericErrorResponse, Json, ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{ErrorResponse, Redirect};
use axum::routing::{get, post};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, OpenApi};
use validator::Validate;

const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

/// OAuth app settings for GitHub sign-in
#[derive(Clone)]
pub struct GithubConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// Builds a router for all the authentication routes
pub fn auth_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/sign-in",
            post(
                |State(app_data): AppState,
                 Json(sign_in_data): Json<dto::auth::SignInRequest>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let auth_service = domain::auth::AuthService {};

                    sign_in(sign_in_data, &app_data.auth.keys, &mut ext_cxn, &auth_service).await
                },
            ),
        )
        .route(
            "/github",
            get(|State(app_data): AppState| async move {
                github_redirect(app_data.auth.github.as_ref())
            }),
        )
        .route(
            "/github/callback",
            get(
                |State(app_data): AppState,
                 Query(callback): Query<GithubCallbackQuery>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let auth_service = domain::auth::AuthService {};

                    github_callback(
                        callback,
                        app_data.auth.github.as_ref(),
                        &app_data.auth.keys,
                        &mut ext_cxn,
                        &auth_service,
                    )
                    .await
                },
            ),
        )
}

#[derive(OpenApi)]
#[openapi(paths(sign_in, github_redirect, github_callback))]
pub struct AuthApi;

fn oauth_unconfigured_response() -> ErrorResponse {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(BasicErrorResponse::new(
            "oauth_unconfigured",
            "GitHub sign-in is not configured on this server.",
        )),
    )
        .into()
}

/// Verifies an email/password pair and hands out a session token
#[utoipa::path(
    post,
    path = "/auth/sign-in",
    tag = "auth",
    request_body = inline(dto::auth::SignInRequest),
    responses(
        (status = 200, description = "Signed in successfully", body = dto::auth::SessionResponse),
        (status = 400, response = dto::err_resps::BasicError400),
        (
            status = 401,
            description = "The email or password was incorrect",
            body = BasicErrorResponse,
            example = json!({
                "error_code": "bad_credentials",
                "error_description": "The provided email or password was incorrect.",
                "extra_info": null
            })
        ),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn sign_in(
    sign_in_data: dto::auth::SignInRequest,
    token_keys: &session::TokenKeys,
    ext_cxn: &mut impl ExternalConnectivity,
    auth_service: &impl domain::auth::driving_ports::AuthPort,
) -> Result<Json<dto::auth::SessionResponse>, ErrorResponse> {
    sign_in_data
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let cred_reader = persistence::db_auth_driven_ports::DbCredentialReader {};
    let credentials = domain::auth::Credentials {
        email: sign_in_data.email.to_lowercase(),
        password: sign_in_data.password,
    };

    let sign_in_result = auth_service
        .sign_in(&credentials, &mut *ext_cxn, &cred_reader)
        .await;
    let user_id = match sign_in_result {
        Ok(id) => id,
        Err(SignInError::BadCredentials) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(BasicErrorResponse::new(
                    "bad_credentials",
                    "The provided email or password was incorrect.",
                )),
            )
                .into());
        }
        Err(SignInError::PortError(port_err)) => {
            error!("Sign-in failure: {port_err}");
            return Err(GenericErrorResponse(port_err).into());
        }
    };

    let token = session::mint_token(token_keys, user_id).map_err(GenericErrorResponse)?;
    info!("User {user_id} signed in");

    Ok(Json(dto::auth::SessionResponse { token, user_id }))
}

/// Sends the caller to GitHub's authorization page to start an OAuth sign-in
#[utoipa::path(
    get,
    path = "/auth/github",
    tag = "auth",
    responses(
        (status = 307, description = "Redirect to GitHub's authorization page"),
        (
            status = 503,
            description = "GitHub sign-in is not configured",
            body = BasicErrorResponse,
        ),
    ),
)]
fn github_redirect(github: Option<&GithubConfig>) -> Result<Redirect, ErrorResponse> {
    let Some(github) = github else {
        return Err(oauth_unconfigured_response());
    };

    let authorize_url = reqwest::Url::parse_with_params(
        GITHUB_AUTHORIZE_URL,
        &[
            ("client_id", github.client_id.as_str()),
            ("redirect_uri", github.redirect_url.as_str()),
            ("scope", "read:user user:email"),
        ],
    )
    .map_err(|url_err| GenericErrorResponse(url_err.into()))?;

    Ok(Redirect::temporary(authorize_url.as_str()))
}

#[derive(Deserialize, IntoParams)]
pub struct GithubCallbackQuery {
    /// Authorization code produced by GitHub's authorize page
    pub code: String,
}

/// Completes a GitHub OAuth sign-in, handing out a session token for the linked
/// or newly registered user
#[utoipa::path(
    get,
    path = "/auth/github/callback",
    tag = "auth",
    params(GithubCallbackQuery),
    responses(
        (status = 200, description = "Signed in successfully", body = dto::auth::SessionResponse),
        (
            status = 400,
            description = "GitHub did not supply an email address for the account",
            body = BasicErrorResponse,
        ),
        (
            status = 409,
            description = "An account with this email exists but is not linked to GitHub",
            body = BasicErrorResponse,
        ),
        (status = 502, description = "The code exchange with GitHub failed", body = BasicErrorResponse),
        (status = 503, description = "GitHub sign-in is not configured", body = BasicErrorResponse),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
async fn github_callback(
    callback: GithubCallbackQuery,
    github: Option<&GithubConfig>,
    token_keys: &session::TokenKeys,
    ext_cxn: &mut impl ExternalConnectivity,
    auth_service: &impl domain::auth::driving_ports::AuthPort,
) -> Result<Json<dto::auth::SessionResponse>, ErrorResponse> {
    let Some(github) = github else {
        return Err(oauth_unconfigured_response());
    };

    let code_exchange = persistence::db_auth_driven_ports::HttpGithubExchange::new(
        github.client_id.clone(),
        github.client_secret.clone(),
        github.redirect_url.clone(),
    );
    let account_store = persistence::db_auth_driven_ports::DbOAuthAccountStore {};
    let user_detect = persistence::db_user_driven_ports::DbDetectUser {};
    let user_write = persistence::db_user_driven_ports::DbWriteUsers {};

    let oauth_result = auth_service
        .oauth_sign_in(
            &callback.code,
            &mut *ext_cxn,
            &code_exchange,
            &account_store,
            &user_detect,
            &user_write,
        )
        .await;
    let user_id = match oauth_result {
        Ok(id) => id,
        Err(OAuthSignInError::ExchangeFailed(reason)) => {
            error!("GitHub code exchange failed: {reason}");
            return Err((
                StatusCode::BAD_GATEWAY,
                Json(BasicErrorResponse {
                    error_code: "oauth_exchange_failed".to_owned(),
                    error_description: "The sign-in attempt could not be confirmed with GitHub."
                        .to_owned(),
                    extra_info: Some(ExtraInfo::Message(reason)),
                }),
            )
                .into());
        }
        Err(OAuthSignInError::EmailUnavailable) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(BasicErrorResponse::new(
                    "oauth_email_unavailable",
                    "GitHub did not supply an email address for this account.",
                )),
            )
                .into());
        }
        Err(OAuthSignInError::AccountNotLinked) => {
            return Err((
                StatusCode::CONFLICT,
                Json(BasicErrorResponse::new(
                    "oauth_account_not_linked",
                    "An account with this email already exists and is not linked to GitHub.",
                )),
            )
                .into());
        }
        Err(OAuthSignInError::PortError(port_err)) => {
            error!("OAuth sign-in failure: {port_err}");
            return Err(GenericErrorResponse(port_err).into());
        }
    };

    let token = session::mint_token(token_keys, user_id).map_err(GenericErrorResponse)?;
    info!("User {user_id} signed in via GitHub");

    Ok(Json(dto::auth::SessionResponse { token, user_id }))
}
