use crate::domain;
use crate::domain::auth::{ExchangeError, GithubIdentity, UserCredentials};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use sqlx::{query_as, query_scalar};

pub struct DbCredentialReader;

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: i32,
    password_hash: Option<String>,
}

impl domain::auth::driven_ports::CredentialReader for DbCredentialReader {
    async fn credentials_by_email(
        &self,
        email: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<UserCredentials>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let credentials = query_as::<_, CredentialRow>(
            "SELECT tu.id, tu.password_hash FROM todo_user tu WHERE tu.email = $1",
        )
        .bind(email)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching credentials by email")?;

        Ok(credentials.map(|row| UserCredentials {
            user_id: row.id,
            password_hash: row.password_hash,
        }))
    }
}

pub struct DbOAuthAccountStore;

impl domain::auth::driven_ports::OAuthAccountStore for DbOAuthAccountStore {
    async fn user_id_by_github_id(
        &self,
        github_id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<i32>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let user_id: Option<i32> =
            query_scalar("SELECT tu.id FROM todo_user tu WHERE tu.github_id = $1")
                .bind(github_id)
                .fetch_optional(cxn_handle.borrow_connection())
                .await
                .context("Looking up a user by GitHub ID")?;

        Ok(user_id)
    }
}

const ACCESS_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_URL: &str = "https://api.github.com/user";

/// Driven adapter which performs the GitHub authorization code exchange over HTTP
pub struct HttpGithubExchange {
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl HttpGithubExchange {
    pub fn new(client_id: String, client_secret: String, redirect_url: String) -> Self {
        HttpGithubExchange {
            client_id,
            client_secret,
            redirect_url,
        }
    }
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct GithubUserResponse {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
}

impl domain::auth::driven_ports::ExchangeOAuthCode for HttpGithubExchange {
    async fn fetch_identity(
        &self,
        code: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<GithubIdentity, ExchangeError> {
        let http_client = ext_cxn.http_client();

        // GitHub responds 200 with an error payload for bad codes, so the
        // body decides whether the exchange succeeded
        let token_response: AccessTokenResponse = http_client
            .post(ACCESS_TOKEN_URL)
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .context("Requesting a GitHub access token")?
            .json()
            .await
            .context("Decoding the GitHub access token response")?;

        let Some(access_token) = token_response.access_token else {
            let reason = token_response
                .error_description
                .or(token_response.error)
                .unwrap_or_else(|| "GitHub returned no access token".to_owned());
            return Err(ExchangeError::Rejected(reason));
        };

        let identity_response = http_client
            .get(GITHUB_USER_URL)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, "todo-rest")
            .send()
            .await
            .context("Requesting the GitHub user identity")?;
        if !identity_response.status().is_success() {
            return Err(ExchangeError::Rejected(format!(
                "GitHub identity lookup failed with status {}",
                identity_response.status()
            )));
        }

        let github_user: GithubUserResponse = identity_response
            .json()
            .await
            .context("Decoding the GitHub user identity")?;

        Ok(GithubIdentity {
            github_id: github_user.id,
            login: github_user.login,
            name: github_user.name,
            email: github_user.email.map(|email| email.to_lowercase()),
        })
    }
}
