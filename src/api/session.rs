use crate::SharedData;
use crate::routing_utils::{BasicErrorResponse, Json};
use anyhow::Context;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// How long a minted session token stays valid
const SESSION_LIFETIME_DAYS: i64 = 30;

/// Key pair used to sign and verify session tokens
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn from_secret(secret: &[u8]) -> TokenKeys {
        TokenKeys {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

/// Issues a signed session token for the given user
pub fn mint_token(keys: &TokenKeys, user_id: i32) -> Result<String, anyhow::Error> {
    let expires_at = Utc::now() + Duration::days(SESSION_LIFETIME_DAYS);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expires_at.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &keys.encoding).context("minting a session token")
}

/// Verifies a session token's signature and expiry, resolving the user it was minted for
pub fn verify_token(keys: &TokenKeys, token: &str) -> Result<i32, anyhow::Error> {
    let token_data = decode::<Claims>(token, &keys.decoding, &Validation::default())
        .context("verifying a session token")?;
    let user_id = token_data
        .claims
        .sub
        .parse::<i32>()
        .context("reading the user id from a session token")?;

    Ok(user_id)
}

/// The authenticated user attached to a request. Extracting a [Session] rejects
/// requests without a valid bearer token.
pub struct Session {
    pub user_id: i32,
}

fn unauthenticated_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(BasicErrorResponse::new(
            "unauthenticated",
            "A valid bearer token is required to access this resource.",
        )),
    )
        .into_response()
}

#[async_trait]
impl FromRequestParts<Arc<SharedData>> for Session {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<SharedData>,
    ) -> Result<Self, Self::Rejection> {
        let bearer_token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(|header_value| header_value.strip_prefix("Bearer "));
        let Some(bearer_token) = bearer_token else {
            return Err(unauthenticated_response());
        };

        match verify_token(&state.auth.keys, bearer_token) {
            Ok(user_id) => Ok(Session { user_id }),
            Err(token_err) => {
                debug!("Rejected session token: {token_err}");
                Err(unauthenticated_response())
            }
        }
    }
}
