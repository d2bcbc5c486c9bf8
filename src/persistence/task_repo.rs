//! Task collection repository.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::info;

use crate::models::task::{Priority, Task, TaskStatus};
use crate::{AppError, Result};

use super::collection::Collection;
use super::kv_store::KeyValueStore;

/// Store key for the task list.
pub const TASKS_KEY: &str = "tasks";

/// Editable task fields; replaces the current values wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEdit {
    /// New content.
    pub content: String,
    /// New urgency.
    #[serde(default)]
    pub priority: Priority,
    /// New due date.
    #[serde(default, with = "crate::models::opt_date")]
    pub due_date: Option<NaiveDate>,
    /// New due time.
    #[serde(default, with = "crate::models::hhmm::option")]
    pub due_time: Option<NaiveTime>,
}

/// Result of a status change.
#[derive(Debug, Clone)]
pub struct StatusChange {
    /// The task after the change.
    pub task: Task,
    /// The task moved into `completed` with this change.
    pub just_completed: bool,
}

/// Repository over the persisted task list. Newest tasks come first.
#[derive(Clone)]
pub struct TaskRepo {
    tasks: Collection<Task>,
}

impl TaskRepo {
    /// Create a new repository over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            tasks: Collection::new(store, TASKS_KEY),
        }
    }

    /// All tasks in store order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store cannot be read.
    pub async fn list(&self) -> Result<Vec<Task>> {
        self.tasks.load().await
    }

    /// Look up one task.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no task has this id.
    pub async fn get(&self, id: &str) -> Result<Task> {
        self.list()
            .await?
            .into_iter()
            .find(|task| task.id == id)
            .ok_or_else(|| AppError::NotFound(format!("task {id}")))
    }

    /// Insert a task at the front of the list.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` for blank content, or `AppError::Db`
    /// if the write fails.
    pub async fn create(&self, task: Task) -> Result<Task> {
        if task.content.trim().is_empty() {
            return Err(AppError::InvalidInput("task content is empty".into()));
        }
        let created = task.clone();
        self.tasks
            .mutate(move |items| {
                items.insert(0, task);
                Ok(())
            })
            .await?;
        info!(task_id = %created.id, "task created");
        Ok(created)
    }

    /// Insert several tasks at the front, keeping their relative order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    pub async fn prepend_many(&self, new_tasks: Vec<Task>) -> Result<Vec<Task>> {
        let created = new_tasks.clone();
        self.tasks
            .mutate(move |items| {
                items.splice(0..0, new_tasks);
                Ok(())
            })
            .await?;
        info!(count = created.len(), "tasks created");
        Ok(created)
    }

    /// Replace the editable fields of a task.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id or
    /// `AppError::InvalidInput` for blank content.
    pub async fn update(&self, id: &str, edit: TaskEdit) -> Result<Task> {
        if edit.content.trim().is_empty() {
            return Err(AppError::InvalidInput("task content is empty".into()));
        }
        self.tasks
            .mutate(|items| {
                let task = find_mut(items, id)?;
                task.content = edit.content;
                task.priority = edit.priority;
                task.due_date = edit.due_date;
                task.due_time = edit.due_time;
                Ok(task.clone())
            })
            .await
    }

    /// Move a task to `status`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id.
    pub async fn set_status(&self, id: &str, status: TaskStatus) -> Result<StatusChange> {
        self.tasks
            .mutate(|items| {
                let task = find_mut(items, id)?;
                let just_completed =
                    status == TaskStatus::Completed && task.status != TaskStatus::Completed;
                task.status = status;
                Ok(StatusChange {
                    task: task.clone(),
                    just_completed,
                })
            })
            .await
    }

    /// Remove a task.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.tasks
            .mutate(|items| {
                let before = items.len();
                items.retain(|task| task.id != id);
                if items.len() == before {
                    return Err(AppError::NotFound(format!("task {id}")));
                }
                Ok(())
            })
            .await?;
        info!(task_id = id, "task deleted");
        Ok(())
    }

    /// Tasks whose content contains `term`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store cannot be read.
    pub async fn search(&self, term: &str) -> Result<Vec<Task>> {
        let term = term.to_lowercase();
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|task| task.content.to_lowercase().contains(&term))
            .collect())
    }

    /// Tasks that are not completed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store cannot be read.
    pub async fn open_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.list().await?.into_iter().filter(Task::is_open).collect())
    }
}

fn find_mut<'a>(items: &'a mut [Task], id: &str) -> Result<&'a mut Task> {
    items
        .iter_mut()
        .find(|task| task.id == id)
        .ok_or_else(|| AppError::NotFound(format!("task {id}")))
}
