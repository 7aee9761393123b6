use crate::domain;
use crate::domain::todo::{NewTask, Priority, TodoTask, UpdateTask};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{query, query_as, query_scalar};

pub struct DbTaskReader;

#[derive(sqlx::FromRow)]
struct TodoItemRow {
    id: i32,
    user_id: i32,
    parent_id: Option<i32>,
    title: String,
    item_desc: Option<String>,
    is_complete: bool,
    due_date: Option<NaiveDate>,
    priority: Option<i16>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TodoItemRow> for domain::todo::TodoTask {
    fn from(value: TodoItemRow) -> Self {
        TodoTask {
            id: value.id,
            owner_user_id: value.user_id,
            parent_id: value.parent_id,
            title: value.title,
            item_desc: value.item_desc,
            is_complete: value.is_complete,
            due_date: value.due_date,
            priority: value.priority.and_then(Priority::from_level),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl domain::todo::driven_ports::TaskReader for DbTaskReader {
    async fn tasks_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TodoTask>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let todo_items: Vec<TodoTask> =
            query_as::<_, TodoItemRow>("SELECT ti.* FROM todo_item ti WHERE ti.user_id = $1")
                .bind(user_id)
                .fetch_all(cxn.borrow_connection())
                .await
                .context("trying to fetch todo items for a user")?
                .into_iter()
                .map(domain::todo::TodoTask::from)
                .collect();

        Ok(todo_items)
    }

    async fn user_task_by_id(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<TodoTask>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let todo_item: Option<TodoTask> = query_as::<_, TodoItemRow>(
            "SELECT ti.* FROM todo_item ti WHERE ti.user_id = $1 AND ti.id = $2",
        )
        .bind(user_id)
        .bind(task_id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to fetch a todo item by ID")?
        .map(domain::todo::TodoTask::from);

        Ok(todo_item)
    }
}

pub struct DbTaskWriter;

impl domain::todo::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task_for_user(
        &self,
        user_id: i32,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let new_id: i32 = query_scalar(
            "INSERT INTO todo_item(user_id, parent_id, title, item_desc, due_date, priority) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING todo_item.id",
        )
        .bind(user_id)
        .bind(new_task.parent_id)
        .bind(&new_task.title)
        .bind(&new_task.description)
        .bind(new_task.due_date)
        .bind(new_task.priority.map(Priority::level))
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to insert a new task into the database")?;

        Ok(new_id)
    }

    async fn update_task(
        &self,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query(
            "UPDATE todo_item SET title = $1, item_desc = $2, is_complete = $3, due_date = $4, \
             priority = $5, parent_id = $6, updated_at = now() WHERE id = $7",
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.is_complete)
        .bind(update.due_date)
        .bind(update.priority.map(Priority::level))
        .bind(update.parent_id)
        .bind(task_id)
        .execute(cxn.borrow_connection())
        .await
        .context("trying to update a task in the database")?;

        Ok(())
    }

    async fn set_task_completion(
        &self,
        task_id: i32,
        is_complete: bool,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("UPDATE todo_item SET is_complete = $1, updated_at = now() WHERE id = $2")
            .bind(is_complete)
            .bind(task_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to toggle a task's completion in the database")?;

        Ok(())
    }

    async fn delete_task(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        // Descendants go with it via the parent_id cascade
        query("DELETE FROM todo_item WHERE id = $1")
            .bind(task_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task from the database")?;

        Ok(())
    }
}
