use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{
    Course, NewCourseRequest, NewTaskRequest, Task, UpdateCourseRequest, UpdateTaskRequest,
    DEFAULT_COURSE_COLOR,
};

const COURSE_COLUMNS: &str = "id, user_id, title, description, color, created_at, updated_at";
const TASK_COLUMNS: &str = "id, user_id, course_id, title, description, deadline, completed, priority, created_at, updated_at";

pub async fn fetch_courses(db: &SqlitePool, user_id: &str) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {} FROM courses WHERE user_id = ?1 ORDER BY created_at DESC",
        COURSE_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn find_course(
    db: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {} FROM courses WHERE id = ?1 AND user_id = ?2",
        COURSE_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn insert_course(
    db: &SqlitePool,
    user_id: &str,
    req: NewCourseRequest,
) -> Result<Course, sqlx::Error> {
    let now = Utc::now();
    let course = Course {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        title: req.title,
        description: req.description,
        color: req.color.unwrap_or_else(|| DEFAULT_COURSE_COLOR.to_string()),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO courses
            (id, user_id, title, description, color, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&course.id)
    .bind(&course.user_id)
    .bind(&course.title)
    .bind(&course.description)
    .bind(&course.color)
    .bind(course.created_at)
    .bind(course.updated_at)
    .execute(db)
    .await?;

    Ok(course)
}

pub async fn update_course(
    db: &SqlitePool,
    user_id: &str,
    id: &str,
    req: UpdateCourseRequest,
) -> Result<Option<Course>, sqlx::Error> {
    let mut current = match find_course(db, user_id, id).await? {
        Some(c) => c,
        None => return Ok(None),
    };

    if let Some(title) = req.title {
        current.title = title;
    }
    if let Some(description) = req.description {
        current.description = Some(description);
    }
    if let Some(color) = req.color {
        current.color = color;
    }
    current.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE courses
        SET title = ?1,
            description = ?2,
            color = ?3,
            updated_at = ?4
        WHERE id = ?5 AND user_id = ?6
        "#,
    )
    .bind(&current.title)
    .bind(&current.description)
    .bind(&current.color)
    .bind(current.updated_at)
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;

    Ok(Some(current))
}

/// Removes a course together with its tasks and exams.
pub async fn delete_course(db: &SqlitePool, user_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE id = ?1 AND user_id = ?2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn fetch_tasks(db: &SqlitePool, user_id: &str) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE user_id = ?1 ORDER BY deadline ASC",
        TASK_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn find_task(
    db: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE id = ?1 AND user_id = ?2",
        TASK_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Incomplete tasks due in `[from, to]`, earliest first.
pub async fn fetch_upcoming_tasks(
    db: &SqlitePool,
    user_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        r#"
        SELECT {} FROM tasks
        WHERE user_id = ?1
          AND completed = 0
          AND deadline >= ?2
          AND deadline <= ?3
        ORDER BY deadline ASC
        LIMIT ?4
        "#,
        TASK_COLUMNS
    ))
    .bind(user_id)
    .bind(from)
    .bind(to)
    .bind(limit)
    .fetch_all(db)
    .await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: i64,
    pub completed: i64,
    pub overdue: i64,
}

pub async fn count_tasks(
    db: &SqlitePool,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<TaskCounts, sqlx::Error> {
    let (total, completed, overdue) = sqlx::query_as::<_, (i64, i64, i64)>(
        r#"
        SELECT
            COUNT(*),
            COALESCE(SUM(CASE WHEN completed = 1 THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN completed = 0 AND deadline < ?2 THEN 1 ELSE 0 END), 0)
        FROM tasks
        WHERE user_id = ?1
        "#,
    )
    .bind(user_id)
    .bind(now)
    .fetch_one(db)
    .await?;

    Ok(TaskCounts {
        total,
        completed,
        overdue,
    })
}

pub async fn insert_task(
    db: &SqlitePool,
    user_id: &str,
    req: NewTaskRequest,
) -> Result<Task, sqlx::Error> {
    let now = Utc::now();
    let task = Task {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        course_id: req.course_id,
        title: req.title,
        description: req.description,
        deadline: req.deadline,
        completed: req.completed,
        priority: req.priority,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO tasks
            (id, user_id, course_id, title, description, deadline,
            completed, priority, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&task.id)
    .bind(&task.user_id)
    .bind(&task.course_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.deadline)
    .bind(task.completed)
    .bind(task.priority)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(db)
    .await?;

    Ok(task)
}

pub async fn update_task(
    db: &SqlitePool,
    user_id: &str,
    id: &str,
    req: UpdateTaskRequest,
) -> Result<Option<Task>, sqlx::Error> {
    let mut current = match find_task(db, user_id, id).await? {
        Some(t) => t,
        None => return Ok(None),
    };

    if let Some(course_id) = req.course_id {
        current.course_id = course_id;
    }
    if let Some(title) = req.title {
        current.title = title;
    }
    if let Some(description) = req.description {
        current.description = Some(description);
    }
    if let Some(deadline) = req.deadline {
        current.deadline = deadline;
    }
    if let Some(completed) = req.completed {
        current.completed = completed;
    }
    if let Some(priority) = req.priority {
        current.priority = priority;
    }
    current.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE tasks
        SET course_id = ?1,
            title = ?2,
            description = ?3,
            deadline = ?4,
            completed = ?5,
            priority = ?6,
            updated_at = ?7
        WHERE id = ?8 AND user_id = ?9
        "#,
    )
    .bind(&current.course_id)
    .bind(&current.title)
    .bind(&current.description)
    .bind(current.deadline)
    .bind(current.completed)
    .bind(current.priority)
    .bind(current.updated_at)
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;

    Ok(Some(current))
}

pub async fn delete_task(db: &SqlitePool, user_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?1 AND user_id = ?2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
