use crate::domain::password;
use crate::external_connections::{
    ExternalConnectivity, TransactableExternalConnectivity, TransactionHandle,
};
use anyhow::Context;

/// A registered user of the todo service
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TodoUser {
    pub id: i32,
    pub email: String,
    pub display_name: String,
}

/// Sign-up data for a new credential-based user. The password is still plaintext here;
/// it is hashed before it ever reaches a driven port.
#[cfg_attr(test, derive(Clone))]
pub struct CreateUser {
    pub display_name: String,
    pub email: String,
    pub password: String,
}

/// The persisted shape of a new user, with the password already hashed
pub struct UserRecord {
    pub display_name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub github_id: Option<i64>,
}

pub mod driven_ports {
    use super::*;

    pub trait UserReader {
        async fn get_by_id(
            &self,
            id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<TodoUser>, anyhow::Error>;
    }

    pub trait UserWriter {
        async fn create_user(
            &self,
            user: &UserRecord,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;
    }

    pub trait DetectUser {
        async fn user_with_email_exists(
            &self,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum CreateUserError {
        #[error("A user with the provided email address already exists.")]
        EmailInUse,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait UserPort {
        async fn create_user(
            &self,
            new_user: &CreateUser,
            ext_cxn: &mut impl TransactableExternalConnectivity,
            u_writer: &impl driven_ports::UserWriter,
            u_detect: &impl driven_ports::DetectUser,
        ) -> Result<i32, CreateUserError>;

        async fn user_by_id(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<Option<TodoUser>, anyhow::Error>;
    }
}

pub struct UserService {}

impl driving_ports::UserPort for UserService {
    async fn create_user(
        &self,
        new_user: &CreateUser,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        u_writer: &impl driven_ports::UserWriter,
        u_detect: &impl driven_ports::DetectUser,
    ) -> Result<i32, driving_ports::CreateUserError> {
        // The duplicate-email check and the insert must observe the same database
        // state, so both run inside one transaction
        let mut txn = ext_cxn
            .start_transaction()
            .await
            .context("Starting user creation transaction")?;

        let email_taken = u_detect
            .user_with_email_exists(&new_user.email, &mut txn)
            .await
            .context("Looking up user during creation")?;
        if email_taken {
            return Err(driving_ports::CreateUserError::EmailInUse);
        }

        let record = UserRecord {
            display_name: new_user.display_name.clone(),
            email: new_user.email.clone(),
            password_hash: Some(password::hash_password(&new_user.password)?),
            github_id: None,
        };

        let created_id = u_writer
            .create_user(&record, &mut txn)
            .await
            .context("Trying to create user at service level")?;
        txn.commit().await.context("Committing user creation")?;

        Ok(created_id)
    }

    async fn user_by_id(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<Option<TodoUser>, anyhow::Error> {
        let user_result = u_reader.get_by_id(user_id, &mut *ext_cxn).await;
        if let Err(ref port_err) = user_result {
            tracing::error!("User fetch failure: {port_err}");
        }

        user_result.context("Failed fetching user")
    }
}
