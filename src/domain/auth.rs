use crate::domain::password;
use crate::domain::user;
use crate::domain::user::UserRecord;
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use thiserror::Error;

/// Email/password pair submitted at sign-in
#[cfg_attr(test, derive(Clone))]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Stored sign-in material for a credential lookup. OAuth-only users have no
/// password hash and cannot sign in with a password.
pub struct UserCredentials {
    pub user_id: i32,
    pub password_hash: Option<String>,
}

/// The identity GitHub reports after a successful authorization code exchange
#[derive(Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct GithubIdentity {
    pub github_id: i64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Failure modes of the authorization code exchange itself
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("GitHub rejected the authorization code: {0}")]
    Rejected(String),
    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}


pub mod driven_ports {
    use super::*;

    pub trait CredentialReader {
        async fn credentials_by_email(
            &self,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<UserCredentials>, anyhow::Error>;
    }

    /// Trades a GitHub authorization code for the identity behind it
    pub trait ExchangeOAuthCode {
        async fn fetch_identity(
            &self,
            code: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<GithubIdentity, ExchangeError>;
    }

    pub trait OAuthAccountStore {
        async fn user_id_by_github_id(
            &self,
            github_id: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<i32>, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    #[derive(Debug, Error)]
    pub enum SignInError {
        #[error("The provided email or password was incorrect.")]
        BadCredentials,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    #[derive(Debug, Error)]
    pub enum OAuthSignInError {
        #[error("The authorization code exchange failed: {0}")]
        ExchangeFailed(String),
        #[error("GitHub did not supply an email address for this account.")]
        EmailUnavailable,
        #[error("An account with this email already exists and is not linked to GitHub.")]
        AccountNotLinked,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait AuthPort {
        /// Verifies an email/password pair, resolving the owning user's ID on success
        async fn sign_in(
            &self,
            credentials: &Credentials,
            ext_cxn: &mut impl ExternalConnectivity,
            cred_read: &impl driven_ports::CredentialReader,
        ) -> Result<i32, SignInError>;

        /// Completes a GitHub OAuth callback, signing in the linked user or
        /// registering a new one
        async fn oauth_sign_in(
            &self,
            authorization_code: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            code_exchange: &impl driven_ports::ExchangeOAuthCode,
            account_store: &impl driven_ports::OAuthAccountStore,
            u_detect: &impl user::driven_ports::DetectUser,
            u_writer: &impl user::driven_ports::UserWriter,
        ) -> Result<i32, OAuthSignInError>;
    }
}

pub struct AuthService {}

impl driving_ports::AuthPort for AuthService {
    async fn sign_in(
        &self,
        credentials: &Credentials,
        ext_cxn: &mut impl ExternalConnectivity,
        cred_read: &impl driven_ports::CredentialReader,
    ) -> Result<i32, driving_ports::SignInError> {
        let stored_credentials = cred_read
            .credentials_by_email(&credentials.email, &mut *ext_cxn)
            .await
            .context("Looking up credentials at sign-in")?;

        let Some(stored_credentials) = stored_credentials else {
            return Err(driving_ports::SignInError::BadCredentials);
        };
        // Accounts registered through OAuth carry no password hash
        let Some(ref hash) = stored_credentials.password_hash else {
            return Err(driving_ports::SignInError::BadCredentials);
        };

        if !password::verify_password(&credentials.password, hash) {
            return Err(driving_ports::SignInError::BadCredentials);
        }

        Ok(stored_credentials.user_id)
    }

    async fn oauth_sign_in(
        &self,
        authorization_code: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        code_exchange: &impl driven_ports::ExchangeOAuthCode,
        account_store: &impl driven_ports::OAuthAccountStore,
        u_detect: &impl user::driven_ports::DetectUser,
        u_writer: &impl user::driven_ports::UserWriter,
    ) -> Result<i32, driving_ports::OAuthSignInError> {
        let identity = code_exchange
            .fetch_identity(authorization_code, &mut *ext_cxn)
            .await
            .map_err(|exchange_err| match exchange_err {
                ExchangeError::Rejected(reason) => {
                    driving_ports::OAuthSignInError::ExchangeFailed(reason)
                }
                ExchangeError::PortError(err) => driving_ports::OAuthSignInError::PortError(
                    err.context("Exchanging OAuth authorization code"),
                ),
            })?;

        let linked_user = account_store
            .user_id_by_github_id(identity.github_id, &mut *ext_cxn)
            .await
            .context("Looking up linked GitHub account")?;
        if let Some(user_id) = linked_user {
            return Ok(user_id);
        }

        let Some(ref email) = identity.email else {
            return Err(driving_ports::OAuthSignInError::EmailUnavailable);
        };

        // An existing account under the same email requires an explicit link,
        // which this service does not perform on the user's behalf
        let email_taken = u_detect
            .user_with_email_exists(email, &mut *ext_cxn)
            .await
            .context("Checking for an existing account during OAuth sign-in")?;
        if email_taken {
            return Err(driving_ports::OAuthSignInError::AccountNotLinked);
        }

        let record = UserRecord {
            display_name: identity.name.clone().unwrap_or_else(|| identity.login.clone()),
            email: email.clone(),
            password_hash: None,
            github_id: Some(identity.github_id),
        };
        let new_user_id = u_writer
            .create_user(&record, &mut *ext_cxn)
            .await
            .context("Registering a new user from a GitHub identity")?;
        tracing::info!("Registered user {new_user_id} via GitHub sign-in");

        Ok(new_user_id)
    }
}
