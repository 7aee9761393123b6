use crate::domain::todo::driven_ports::{TaskReader, TaskWriter};
use crate::domain::todo::driving_ports::TaskError;
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;

/// How urgent a task is. Stored as a numeric level so tasks can be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn level(self) -> i16 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    pub fn from_level(level: i16) -> Option<Priority> {
        match level {
            1 => Some(Priority::Low),
            2 => Some(Priority::Medium),
            3 => Some(Priority::High),
            _ => None,
        }
    }
}

#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TodoTask {
    pub id: i32,
    pub owner_user_id: i32,
    pub parent_id: Option<i32>,
    pub title: String,
    pub item_desc: Option<String>,
    pub is_complete: bool,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task with its descendants attached. List and detail reads surface two levels
/// below the requested task, so grandchildren always have empty child lists.
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TaskTree {
    pub task: TodoTask,
    pub children: Vec<TaskTree>,
}

/// Status slices of a user's top-level task list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    Upcoming,
    Overdue,
    Completed,
}

#[cfg_attr(test, derive(Clone))]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub parent_id: Option<i32>,
}

#[cfg_attr(test, derive(Clone))]
pub struct UpdateTask {
    pub title: String,
    pub description: Option<String>,
    pub is_complete: bool,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub parent_id: Option<i32>,
}

/// True if a task should appear under the given status filter. `today` is the
/// start of the caller's current day; a task due today is still upcoming.
pub fn matches_filter(task: &TodoTask, filter: TaskFilter, today: NaiveDate) -> bool {
    match filter {
        TaskFilter::Upcoming => {
            !task.is_complete && task.due_date.map(|due| due >= today).unwrap_or(true)
        }
        TaskFilter::Overdue => {
            !task.is_complete && task.due_date.map(|due| due < today).unwrap_or(false)
        }
        TaskFilter::Completed => task.is_complete,
    }
}

/// List ordering: incomplete tasks first, then soonest due date (tasks without
/// one sort last), newest created first as the tiebreaker.
pub fn task_display_order(first: &TodoTask, second: &TodoTask) -> Ordering {
    first
        .is_complete
        .cmp(&second.is_complete)
        .then_with(|| match (first.due_date, second.due_date) {
            (Some(first_due), Some(second_due)) => first_due.cmp(&second_due),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| second.created_at.cmp(&first.created_at))
}

const READ_NESTING_DEPTH: u32 = 2;

fn attach_descendants(
    task: TodoTask,
    children_of: &mut HashMap<i32, Vec<TodoTask>>,
    remaining_depth: u32,
) -> TaskTree {
    let children = if remaining_depth == 0 {
        Vec::new()
    } else {
        children_of
            .remove(&task.id)
            .unwrap_or_default()
            .into_iter()
            .map(|child| attach_descendants(child, children_of, remaining_depth - 1))
            .collect()
    };

    TaskTree { task, children }
}

/// Builds the top-level task list from a user's flat task set, nesting children
/// and grandchildren under their roots
pub fn assemble_forest(tasks: Vec<TodoTask>) -> Vec<TaskTree> {
    let mut roots: Vec<TodoTask> = Vec::new();
    let mut children_of: HashMap<i32, Vec<TodoTask>> = HashMap::new();
    for task in tasks {
        match task.parent_id {
            None => roots.push(task),
            Some(parent_id) => children_of.entry(parent_id).or_default().push(task),
        }
    }

    roots
        .into_iter()
        .map(|root| attach_descendants(root, &mut children_of, READ_NESTING_DEPTH))
        .collect()
}

/// Extracts one task's subtree from a user's flat task set. The requested task
/// does not have to be top-level.
pub fn assemble_subtree(task_id: i32, tasks: Vec<TodoTask>) -> Option<TaskTree> {
    let mut target: Option<TodoTask> = None;
    let mut children_of: HashMap<i32, Vec<TodoTask>> = HashMap::new();
    for task in tasks {
        if task.id == task_id {
            target = Some(task);
            continue;
        }
        if let Some(parent_id) = task.parent_id {
            children_of.entry(parent_id).or_default().push(task);
        }
    }

    target.map(|task| attach_descendants(task, &mut children_of, READ_NESTING_DEPTH))
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait TaskReader {
        /// Every task the user owns, flat and unordered
        async fn tasks_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TodoTask>, anyhow::Error>;

        async fn user_task_by_id(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<TodoTask>, anyhow::Error>;
    }

    pub trait TaskWriter {
        async fn create_task_for_user(
            &self,
            user_id: i32,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;

        async fn update_task(
            &self,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        async fn set_task_completion(
            &self,
            task_id: i32,
            is_complete: bool,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        /// Deletes a task along with its descendants
        async fn delete_task(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("The requested task could not be found.")]
        TaskNotFound,
        #[error("The specified parent task does not exist or cannot be used as a parent.")]
        InvalidParent,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait TaskPort {
        async fn tasks_for_user(
            &self,
            user_id: i32,
            filter: Option<TaskFilter>,
            today: NaiveDate,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<TaskTree>, anyhow::Error>;

        async fn user_task_by_id(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<TaskTree, TaskError>;

        async fn create_task_for_user(
            &self,
            user_id: i32,
            task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<i32, TaskError>;

        async fn update_task(
            &self,
            user_id: i32,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;

        async fn set_task_completion(
            &self,
            user_id: i32,
            task_id: i32,
            is_complete: bool,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;

        async fn delete_task(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
    }
}

pub struct TaskService {}

impl TaskService {
    /// A task's parent must exist, belong to the same user, and not be the task
    /// itself or one of its descendants. Nesting a task under its own descendant
    /// would cut the whole subtree loose from the list view.
    async fn verify_usable_parent(
        &self,
        user_id: i32,
        task_id: Option<i32>,
        parent_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<(), TaskError> {
        if task_id == Some(parent_id) {
            return Err(TaskError::InvalidParent);
        }

        let parent = task_read
            .user_task_by_id(user_id, parent_id, &mut *ext_cxn)
            .await
            .context("Looking up a task's parent")?;
        if parent.is_none() {
            return Err(TaskError::InvalidParent);
        }

        // On reparent, walk the new parent's ancestry. Finding the task being
        // updated there means the move would create a cycle.
        if let Some(task_id) = task_id {
            let flat_tasks = task_read
                .tasks_for_user(user_id, &mut *ext_cxn)
                .await
                .context("Checking a task's ancestry for a reparent")?;
            let mut parent_of: HashMap<i32, Option<i32>> = flat_tasks
                .into_iter()
                .map(|task| (task.id, task.parent_id))
                .collect();

            let mut ancestor = Some(parent_id);
            while let Some(ancestor_id) = ancestor {
                if ancestor_id == task_id {
                    return Err(TaskError::InvalidParent);
                }
                // remove() terminates the walk even if stored data already has a cycle
                ancestor = parent_of.remove(&ancestor_id).flatten();
            }
        }

        Ok(())
    }

    /// Resolves a task while verifying it belongs to the given user. Tasks owned by
    /// someone else surface as [TaskError::TaskNotFound] so their existence doesn't leak.
    async fn verify_task_ownership(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<TodoTask, TaskError> {
        let task = task_read
            .user_task_by_id(user_id, task_id, &mut *ext_cxn)
            .await
            .context("Verifying task ownership")?;

        task.ok_or(TaskError::TaskNotFound)
    }
}

impl driving_ports::TaskPort for TaskService {
    async fn tasks_for_user(
        &self,
        user_id: i32,
        filter: Option<TaskFilter>,
        today: NaiveDate,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Vec<TaskTree>, anyhow::Error> {
        let flat_tasks = task_read
            .tasks_for_user(user_id, &mut *ext_cxn)
            .await
            .context("Fetching a user's task list")?;

        let mut task_trees = assemble_forest(flat_tasks);
        if let Some(filter) = filter {
            task_trees.retain(|tree| matches_filter(&tree.task, filter, today));
        }
        task_trees.sort_by(|first, second| task_display_order(&first.task, &second.task));

        Ok(task_trees)
    }

    async fn user_task_by_id(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<TaskTree, TaskError> {
        let flat_tasks = task_read
            .tasks_for_user(user_id, &mut *ext_cxn)
            .await
            .context("Fetching tasks for a task detail read")?;

        assemble_subtree(task_id, flat_tasks).ok_or(TaskError::TaskNotFound)
    }

    async fn create_task_for_user(
        &self,
        user_id: i32,
        task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        task_write: &impl TaskWriter,
    ) -> Result<i32, TaskError> {
        if let Some(parent_id) = task.parent_id {
            self.verify_usable_parent(user_id, None, parent_id, &mut *ext_cxn, task_read)
                .await?;
        }

        let created_task_id = task_write
            .create_task_for_user(user_id, task, &mut *ext_cxn)
            .await
            .context("Creating a task")?;

        Ok(created_task_id)
    }

    async fn update_task(
        &self,
        user_id: i32,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        self.verify_task_ownership(user_id, task_id, &mut *ext_cxn, task_read)
            .await?;
        if let Some(parent_id) = update.parent_id {
            self.verify_usable_parent(user_id, Some(task_id), parent_id, &mut *ext_cxn, task_read)
                .await?;
        }

        task_write
            .update_task(task_id, update, &mut *ext_cxn)
            .await
            .context("Updating a task")?;

        Ok(())
    }

    async fn set_task_completion(
        &self,
        user_id: i32,
        task_id: i32,
        is_complete: bool,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        self.verify_task_ownership(user_id, task_id, &mut *ext_cxn, task_read)
            .await?;

        task_write
            .set_task_completion(task_id, is_complete, &mut *ext_cxn)
            .await
            .context("Toggling task completion")?;

        Ok(())
    }

    async fn delete_task(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        self.verify_task_ownership(user_id, task_id, &mut *ext_cxn, task_read)
            .await?;

        task_write
            .delete_task(task_id, &mut *ext_cxn)
            .await
            .context("Deleting a task")?;

        Ok(())
    }
}
