use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// How often a recurring task repeats.
/// Corresponds to the `task_recurrence` SQL enum.
///
/// A recurring task with `recurrence_type = NULL` is legal and simply never
/// produces a successor when completed.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_recurrence", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    /// Repeats every calendar day.
    Daily,
    /// Repeats every 7 days.
    Weekly,
    /// Repeats on the same day-of-month, clamped to the target month's length.
    Monthly,
}

/// Input structure for creating a task.
/// Contains validation rules for its fields.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task.
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// An optional description for the task.
    /// Maximum length of 1000 characters if provided.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Optional due date for the task.
    pub due_date: Option<DateTime<Utc>>,

    /// Whether the task starts out completed. Defaults to false.
    #[serde(default)]
    pub completed: bool,

    /// Whether completing this task should spawn a successor.
    #[serde(default)]
    pub is_recurring: bool,

    /// How often the task repeats, if recurring.
    pub recurrence_type: Option<Recurrence>,
}

/// Partial-update payload for an existing task.
///
/// Absent fields leave the stored value untouched, mirroring the create
/// endpoint's field-by-field semantics. `recurrence_type` is the one field
/// that distinguishes absent from `null`: an explicit `null` clears the
/// stored kind, turning the task into one that no longer spawns successors.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    pub completed: Option<bool>,

    pub is_recurring: Option<bool>,

    /// `None` = leave unchanged, `Some(None)` = clear, `Some(Some(kind))` =
    /// set.
    #[serde(default, deserialize_with = "double_option")]
    pub recurrence_type: Option<Option<Recurrence>>,
}

/// Keeps JSON `null` distinct from an absent field: missing deserializes to
/// `None` via `#[serde(default)]`, a present value (including `null`) lands
/// here and becomes `Some(..)`.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// The title of the task.
    pub title: String,
    /// An optional description for the task.
    pub description: Option<String>,
    /// Optional due date for the task.
    pub due_date: Option<DateTime<Utc>>,
    /// Whether the task has been completed.
    pub completed: bool,
    /// Timestamp of when the task was created.
    pub created_at: DateTime<Utc>,
    /// Identifier of the user who owns the task. Not part of the wire format.
    #[serde(skip_serializing, default)]
    pub user_id: i32,
    /// Whether completing this task spawns a successor.
    pub is_recurring: bool,
    /// How often the task repeats, if recurring.
    pub recurrence_type: Option<Recurrence>,
    /// Id of the task this one was generated from, linking recurring
    /// instances into a flat lineage chain.
    pub parent_task_id: Option<Uuid>,
}

/// Represents query parameters for filtering tasks when listing them.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Filter tasks by completion state.
    pub completed: Option<bool>,
    /// Search term to filter tasks by title or description (case-insensitive).
    pub search: Option<String>,
}

impl Task {
    /// Creates a new `Task` instance from `TaskInput` and the owner's `user_id`.
    /// Sets `created_at` to the current time and `id` to a new UUID.
    pub fn new(input: TaskInput, user_id: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            due_date: input.due_date,
            completed: input.completed,
            created_at: Utc::now(),
            user_id,
            is_recurring: input.is_recurring,
            recurrence_type: input.recurrence_type,
            parent_task_id: None,
        }
    }
}
