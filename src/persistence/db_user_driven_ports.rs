use crate::domain;
use crate::domain::user::{TodoUser, UserRecord};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::{query_as, query_scalar};

pub struct DbDetectUser;

impl domain::user::driven_ports::DetectUser for DbDetectUser {
    async fn user_with_email_exists(
        &self,
        email: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut connection = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let matching_users: i64 =
            query_scalar("SELECT count(*) FROM todo_user tu WHERE tu.email = $1")
                .bind(email)
                .fetch_one(connection.borrow_connection())
                .await
                .context("Detecting user via email")?;

        Ok(matching_users > 0)
    }
}

pub struct DbReadUsers;

#[derive(sqlx::FromRow)]
struct TodoUserRow {
    id: i32,
    email: String,
    display_name: String,
}

impl From<TodoUserRow> for TodoUser {
    fn from(value: TodoUserRow) -> Self {
        TodoUser {
            id: value.id,
            email: value.email,
            display_name: value.display_name,
        }
    }
}

impl domain::user::driven_ports::UserReader for DbReadUsers {
    async fn get_by_id(
        &self,
        id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<TodoUser>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let user = query_as::<_, TodoUserRow>(
            "SELECT tu.id, tu.email, tu.display_name FROM todo_user tu WHERE tu.id = $1",
        )
        .bind(id)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching a user by id")?;

        Ok(user.map(TodoUser::from))
    }
}

pub struct DbWriteUsers;

impl domain::user::driven_ports::UserWriter for DbWriteUsers {
    async fn create_user(
        &self,
        user: &UserRecord,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let new_user_id: i32 = query_scalar(
            "INSERT INTO todo_user(email, display_name, password_hash, github_id) \
             VALUES ($1, $2, $3, $4) RETURNING todo_user.id",
        )
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.github_id)
        .fetch_one(cxn_handle.borrow_connection())
        .await
        .context("Inserting new user")?;

        Ok(new_user_id)
    }
}
