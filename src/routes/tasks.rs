use crate::{
    auth::AuthenticatedUser,
    config::Config,
    error::AppError,
    models::{Task, TaskInput, TaskQuery, TaskUpdate},
    recurrence,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const TASK_COLUMNS: &str = "id, title, description, due_date, completed, created_at, user_id, \
                            is_recurring, recurrence_type, parent_task_id";

async fn insert_task<'c, E>(executor: E, task: &Task) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'c>,
{
    sqlx::query(
        "INSERT INTO tasks (id, title, description, due_date, completed, created_at, user_id, \
         is_recurring, recurrence_type, parent_task_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.due_date)
    .bind(task.completed)
    .bind(task.created_at)
    .bind(task.user_id)
    .bind(task.is_recurring)
    .bind(task.recurrence_type)
    .bind(task.parent_task_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Retrieves a list of tasks for the authenticated user.
///
/// Only tasks owned by the authenticated user are ever returned. Supports
/// filtering by completion state and a `search` term matched against title
/// and description. Tasks are ordered by creation date, newest first.
///
/// ## Query Parameters:
/// - `completed` (optional): Filter by completion state.
/// - `search` (optional): Case-insensitive substring match on title/description.
///
/// ## Responses:
/// - `200 OK`: Returns a JSON array of `Task` objects.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `500 Internal Server Error`: For database errors or other unexpected issues.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let mut sql = format!("SELECT {} FROM tasks WHERE user_id = $1", TASK_COLUMNS);
    let mut param_count = 2;

    if query_params.completed.is_some() {
        sql.push_str(&format!(" AND completed = ${}", param_count));
        param_count += 1;
    }
    if query_params.search.is_some() {
        sql.push_str(&format!(
            " AND (title ILIKE ${} OR description ILIKE ${})",
            param_count,
            param_count + 1
        ));
    }

    sql.push_str(" ORDER BY created_at DESC");

    let mut query_builder = sqlx::query_as::<_, Task>(&sql).bind(auth.id);

    if let Some(completed) = query_params.completed {
        query_builder = query_builder.bind(completed);
    }
    if let Some(search) = &query_params.search {
        let search_pattern = format!("%{}%", search);
        query_builder = query_builder.bind(search_pattern.clone());
        query_builder = query_builder.bind(search_pattern);
    }

    let tasks = query_builder.fetch_all(&**pool).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task for the authenticated user.
///
/// The owner is always the authenticated user; there is no way to create a
/// task on someone else's behalf.
///
/// ## Request Body:
/// A JSON object matching `TaskInput`:
/// - `title`: The title of the task (required, 1-200 chars).
/// - `description` (optional): Up to 1000 chars.
/// - `due_date` (optional): ISO-8601 timestamp.
/// - `completed` (optional): Defaults to false.
/// - `is_recurring` (optional): Defaults to false.
/// - `recurrence_type` (optional): "daily", "weekly" or "monthly".
///
/// ## Responses:
/// - `201 Created`: Returns the newly created `Task` object as JSON.
/// - `400 Bad Request`: If input validation fails.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `500 Internal Server Error`: For database errors or other unexpected issues.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), auth.id);
    insert_task(&**pool, &task).await?;

    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a specific task by its ID.
///
/// A task that exists but belongs to another user yields the same 404 as a
/// nonexistent id, so ids cannot be probed for existence.
///
/// ## Responses:
/// - `200 OK`: Returns the `Task` object as JSON.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: If the task does not exist or is not owned by the caller.
/// - `500 Internal Server Error`: For database errors or other unexpected issues.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task: Option<Task> = sqlx::query_as(&format!(
        "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
        TASK_COLUMNS
    ))
    .bind(task_id.into_inner())
    .bind(auth.id)
    .fetch_optional(&**pool)
    .await?;

    match task {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Updates an existing task.
///
/// Accepts a partial payload: absent fields keep their stored value, and an
/// explicit `"recurrence_type": null` clears the stored kind. When the
/// update flips a recurring task from incomplete to complete (and only on that
/// edge), the successor occurrence is synthesized and persisted in the same
/// transaction, with its due date computed from the recurrence kind.
///
/// ## Responses:
/// - `200 OK`: Returns the updated `Task` (not the successor).
/// - `400 Bad Request`: If input validation fails.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: If the task does not exist or is not owned by the caller.
/// - `500 Internal Server Error`: For database errors or other unexpected issues.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task_uuid = task_id.into_inner();

    let mut tx = pool.begin().await?;

    // Lock the row for the edge detection; a concurrent completion of the
    // same task must not spawn two successors.
    let current: Option<Task> = sqlx::query_as(&format!(
        "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2 FOR UPDATE",
        TASK_COLUMNS
    ))
    .bind(task_uuid)
    .bind(auth.id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(mut task) = current else {
        return Err(AppError::NotFound("Task not found".into()));
    };

    let previously_completed = task.completed;
    let update = task_data.into_inner();

    if let Some(title) = update.title {
        task.title = title;
    }
    if let Some(description) = update.description {
        task.description = Some(description);
    }
    if let Some(due_date) = update.due_date {
        task.due_date = Some(due_date);
    }
    if let Some(completed) = update.completed {
        task.completed = completed;
    }
    if let Some(is_recurring) = update.is_recurring {
        task.is_recurring = is_recurring;
    }
    if let Some(recurrence_type) = update.recurrence_type {
        task.recurrence_type = recurrence_type;
    }

    sqlx::query(
        "UPDATE tasks
         SET title = $1, description = $2, due_date = $3, completed = $4,
             is_recurring = $5, recurrence_type = $6
         WHERE id = $7 AND user_id = $8",
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.due_date)
    .bind(task.completed)
    .bind(task.is_recurring)
    .bind(task.recurrence_type)
    .bind(task.id)
    .bind(auth.id)
    .execute(&mut *tx)
    .await?;

    if let Some(next) = recurrence::successor(&task, previously_completed, config.local_offset()) {
        insert_task(&mut *tx, &next).await?;
        log::info!(
            "Recurring task {} completed; successor {} due {:?}",
            task.id,
            next.id,
            next.due_date
        );
    }

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task by its ID.
///
/// ## Responses:
/// - `204 No Content`: On successful deletion.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: If the task does not exist or is not owned by the caller.
/// - `500 Internal Server Error`: For database errors or other unexpected issues.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
        .bind(task_id.into_inner())
        .bind(auth.id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Deletes all of the caller's completed tasks.
///
/// A single statement, so the bulk delete is all-or-nothing.
///
/// ## Responses:
/// - `200 OK`: `{"deleted_count": n}`.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `500 Internal Server Error`: For database errors or other unexpected issues.
#[delete("/completed")]
pub async fn delete_completed_tasks(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE user_id = $1 AND completed = true")
        .bind(auth.id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "deleted_count": result.rows_affected()
    })))
}

#[cfg(test)]
mod tests {
    use crate::models::{Recurrence, TaskInput, TaskUpdate};
    use validator::Validate;

    #[test]
    fn test_task_input_validation() {
        // Empty title
        let invalid_input_empty_title = TaskInput {
            title: "".to_string(),
            description: Some("Test Description".to_string()),
            due_date: None,
            completed: false,
            is_recurring: false,
            recurrence_type: None,
        };
        assert!(
            invalid_input_empty_title.validate().is_err(),
            "Validation should fail for empty title."
        );

        // Title too long (max 200)
        let long_title = "a".repeat(201);
        let invalid_input_long_title = TaskInput {
            title: long_title,
            description: Some("Test Description".to_string()),
            due_date: None,
            completed: false,
            is_recurring: false,
            recurrence_type: None,
        };
        assert!(
            invalid_input_long_title.validate().is_err(),
            "Validation should fail for overly long title."
        );

        // Valid input
        let valid_input = TaskInput {
            title: "Valid Title".to_string(),
            description: Some("Test Description".to_string()),
            due_date: None,
            completed: false,
            is_recurring: true,
            recurrence_type: Some(Recurrence::Daily),
        };
        assert!(
            valid_input.validate().is_ok(),
            "Validation should pass for valid input."
        );

        // Description too long (max 1000)
        let long_description = "b".repeat(1001);
        let invalid_input_long_desc = TaskInput {
            title: "Valid title for desc test".to_string(),
            description: Some(long_description),
            due_date: None,
            completed: false,
            is_recurring: false,
            recurrence_type: None,
        };
        assert!(
            invalid_input_long_desc.validate().is_err(),
            "Validation should fail for overly long description."
        );
    }

    #[test]
    fn test_task_update_partial_payload() {
        // Only the completion flag: everything else stays untouched.
        let update: TaskUpdate = serde_json::from_value(serde_json::json!({
            "completed": true
        }))
        .unwrap();
        assert_eq!(update.completed, Some(true));
        assert!(update.title.is_none());
        assert!(update.recurrence_type.is_none());
        assert!(update.validate().is_ok());

        let bad_update: TaskUpdate = serde_json::from_value(serde_json::json!({
            "title": ""
        }))
        .unwrap();
        assert!(bad_update.validate().is_err());
    }
}
