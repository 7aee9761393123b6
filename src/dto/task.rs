use crate::domain;
use crate::domain::todo::Priority;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for creating a new task via the API
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize, Clone))]
pub struct NewTask {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Water the plants")]
    pub title: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    /// Priority level from 1 (low) to 3 (high)
    #[validate(range(min = 1, max = 3))]
    #[schema(example = 2)]
    pub priority: Option<i16>,
    /// Optional parent task to nest this task under
    pub parent_id: Option<i32>,
}

impl From<NewTask> for domain::todo::NewTask {
    fn from(value: NewTask) -> Self {
        domain::todo::NewTask {
            title: value.title,
            description: value.description,
            due_date: value.due_date,
            priority: value.priority.and_then(Priority::from_level),
            parent_id: value.parent_id,
        }
    }
}

/// DTO for replacing a task's content via the API
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize, Clone))]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub is_complete: bool,
    pub due_date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 3))]
    pub priority: Option<i16>,
    pub parent_id: Option<i32>,
}

impl From<UpdateTask> for domain::todo::UpdateTask {
    fn from(value: UpdateTask) -> Self {
        domain::todo::UpdateTask {
            title: value.title,
            description: value.description,
            is_complete: value.is_complete,
            due_date: value.due_date,
            priority: value.priority.and_then(Priority::from_level),
            parent_id: value.parent_id,
        }
    }
}

/// DTO for toggling a task's completion via the API
#[derive(Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize, Clone))]
pub struct SetTaskCompletion {
    pub is_complete: bool,
}

/// DTO for a returned task on the API. Children are nested up to two levels
/// below the task that was asked for.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct TodoTask {
    #[schema(example = 10)]
    pub id: i32,
    #[schema(example = "Water the plants")]
    pub title: String,
    pub description: Option<String>,
    pub is_complete: bool,
    pub due_date: Option<NaiveDate>,
    /// Priority level from 1 (low) to 3 (high)
    pub priority: Option<i16>,
    pub parent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub children: Vec<TodoTask>,
}

impl From<domain::todo::TaskTree> for TodoTask {
    fn from(value: domain::todo::TaskTree) -> Self {
        let task = value.task;
        TodoTask {
            id: task.id,
            title: task.title,
            description: task.item_desc,
            is_complete: task.is_complete,
            due_date: task.due_date,
            priority: task.priority.map(Priority::level),
            parent_id: task.parent_id,
            created_at: task.created_at,
            updated_at: task.updated_at,
            children: value.children.into_iter().map(TodoTask::from).collect(),
        }
    }
}

/// DTO for a newly created task
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct InsertedTask {
    #[schema(example = 5)]
    pub id: i32,
}

/// Status slice of the task list requested via the `filter` query parameter
#[derive(Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatusFilter {
    Upcoming,
    Overdue,
    Completed,
}

impl From<TaskStatusFilter> for domain::todo::TaskFilter {
    fn from(value: TaskStatusFilter) -> Self {
        match value {
            TaskStatusFilter::Upcoming => domain::todo::TaskFilter::Upcoming,
            TaskStatusFilter::Overdue => domain::todo::TaskFilter::Overdue,
            TaskStatusFilter::Completed => domain::todo::TaskFilter::Completed,
        }
    }
}
