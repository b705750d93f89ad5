use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};

use crate::models::{Exam, ExamRow, RevisionSession};

const EXAM_COLUMNS: &str = "id, user_id, course_id, title, exam_date, created_at, updated_at";

#[derive(Debug, FromRow)]
struct SessionRow {
    idx: u32,
    date: DateTime<Utc>,
    topics: Json<Vec<String>>,
    completed: bool,
}

impl From<SessionRow> for RevisionSession {
    fn from(row: SessionRow) -> Self {
        RevisionSession {
            index: row.idx,
            date: row.date,
            topics: row.topics.0,
            completed: row.completed,
        }
    }
}

async fn load_plan(db: &SqlitePool, exam_id: &str) -> Result<Vec<RevisionSession>, sqlx::Error> {
    let rows = sqlx::query_as::<_, SessionRow>(
        "SELECT idx, date, topics, completed FROM revision_sessions WHERE exam_id = ?1 ORDER BY idx ASC",
    )
    .bind(exam_id)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(RevisionSession::from).collect())
}

async fn attach_plans(db: &SqlitePool, rows: Vec<ExamRow>) -> Result<Vec<Exam>, sqlx::Error> {
    let mut exams = Vec::with_capacity(rows.len());
    for row in rows {
        let plan = load_plan(db, &row.id).await?;
        exams.push(row.with_plan(plan));
    }
    Ok(exams)
}

/// Stores the exam and its whole plan atomically.
pub async fn insert_exam(db: &SqlitePool, exam: &Exam) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO exams
            (id, user_id, course_id, title, exam_date, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&exam.id)
    .bind(&exam.user_id)
    .bind(&exam.course_id)
    .bind(&exam.title)
    .bind(exam.exam_date)
    .bind(exam.created_at)
    .bind(exam.updated_at)
    .execute(&mut *tx)
    .await?;

    for session in &exam.revision_plan {
        sqlx::query(
            r#"
            INSERT INTO revision_sessions (exam_id, idx, date, topics, completed)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&exam.id)
        .bind(session.index)
        .bind(session.date)
        .bind(Json(&session.topics))
        .bind(session.completed)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

pub async fn fetch_exams(db: &SqlitePool, user_id: &str) -> Result<Vec<Exam>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ExamRow>(&format!(
        "SELECT {} FROM exams WHERE user_id = ?1 ORDER BY exam_date ASC",
        EXAM_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;

    attach_plans(db, rows).await
}

/// Exams dated in `[from, to]`, soonest first.
pub async fn fetch_upcoming_exams(
    db: &SqlitePool,
    user_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Exam>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ExamRow>(&format!(
        r#"
        SELECT {} FROM exams
        WHERE user_id = ?1
          AND exam_date >= ?2
          AND exam_date <= ?3
        ORDER BY exam_date ASC
        LIMIT ?4
        "#,
        EXAM_COLUMNS
    ))
    .bind(user_id)
    .bind(from)
    .bind(to)
    .bind(limit)
    .fetch_all(db)
    .await?;

    attach_plans(db, rows).await
}

pub async fn find_exam(
    db: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    let row = sqlx::query_as::<_, ExamRow>(&format!(
        "SELECT {} FROM exams WHERE id = ?1 AND user_id = ?2",
        EXAM_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    match row {
        Some(row) => {
            let plan = load_plan(db, &row.id).await?;
            Ok(Some(row.with_plan(plan)))
        }
        None => Ok(None),
    }
}

/// Sets `completed` on one session. Returns false when the session does not exist.
pub async fn set_session_completed(
    db: &SqlitePool,
    exam_id: &str,
    index: u32,
    completed: bool,
) -> Result<bool, sqlx::Error> {
    let mut tx = db.begin().await?;

    let affected = sqlx::query(
        "UPDATE revision_sessions SET completed = ?1 WHERE exam_id = ?2 AND idx = ?3",
    )
    .bind(completed)
    .bind(exam_id)
    .bind(index)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if affected > 0 {
        sqlx::query("UPDATE exams SET updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(exam_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(affected > 0)
}

/// Deletes the exam; its sessions go with it.
pub async fn delete_exam(db: &SqlitePool, user_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exams WHERE id = ?1 AND user_id = ?2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    use crate::db::{connect_in_memory, repository, users};
    use crate::models::{NewCourseRequest, NewUserRequest, Role};
    use crate::planner::plan_revision;

    async fn setup() -> (SqlitePool, String, String) {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let user = users::insert_user(
            &pool,
            NewUserRequest {
                name: "Test Student".to_string(),
                email: "student@example.test".to_string(),
                role: Role::User,
                streak: 0,
            },
        )
        .await
        .unwrap();
        let course = repository::insert_course(
            &pool,
            &user.id,
            NewCourseRequest {
                title: "Mathematics".to_string(),
                description: None,
                color: None,
            },
        )
        .await
        .unwrap();
        (pool, user.id, course.id)
    }

    fn exam(user_id: &str, course_id: &str, title: &str, exam_date: DateTime<Utc>) -> Exam {
        let topics: Vec<String> = ["Limits", "Derivatives", "Integrals", "Series"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let now = Utc::now();
        Exam {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            title: title.to_string(),
            exam_date,
            revision_plan: plan_revision(&topics, exam_date),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_exam_with_plan() {
        let (pool, user_id, course_id) = setup().await;
        let date = Utc.with_ymd_and_hms(2026, 6, 15, 9, 0, 0).unwrap();
        let stored = exam(&user_id, &course_id, "Final", date);

        insert_exam(&pool, &stored).await.expect("Failed to insert exam");

        let found = find_exam(&pool, &user_id, &stored.id)
            .await
            .unwrap()
            .expect("Exam not found");
        assert_eq!(found.revision_plan, stored.revision_plan);
        assert_eq!(found.exam_date, date);

        assert!(find_exam(&pool, "someone-else", &stored.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_session_completed_touches_one_session() {
        let (pool, user_id, course_id) = setup().await;
        let stored = exam(&user_id, &course_id, "Midterm", Utc::now());
        insert_exam(&pool, &stored).await.unwrap();

        assert!(set_session_completed(&pool, &stored.id, 2, true).await.unwrap());
        assert!(!set_session_completed(&pool, &stored.id, 7, true).await.unwrap());

        let found = find_exam(&pool, &user_id, &stored.id).await.unwrap().unwrap();
        let flags: Vec<bool> = found.revision_plan.iter().map(|s| s.completed).collect();
        assert_eq!(flags, vec![false, false, true, false, false, false, false]);
        assert_eq!(found.revision_plan[2].topics, stored.revision_plan[2].topics);
    }

    #[tokio::test]
    async fn test_fetch_exams_sorted_and_upcoming_window() {
        let (pool, user_id, course_id) = setup().await;
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();

        for (title, days) in [("far", 45), ("soon", 3), ("past", -2), ("later", 20)] {
            let e = exam(&user_id, &course_id, title, now + chrono::Duration::days(days));
            insert_exam(&pool, &e).await.unwrap();
        }

        let all: Vec<String> = fetch_exams(&pool, &user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(all, vec!["past", "soon", "later", "far"]);

        let upcoming = fetch_upcoming_exams(&pool, &user_id, now, now + chrono::Duration::days(30), 5)
            .await
            .unwrap();
        let titles: Vec<&str> = upcoming.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["soon", "later"]);
        assert!(upcoming.iter().all(|e| e.revision_plan.len() == 7));
    }

    #[tokio::test]
    async fn test_delete_exam_removes_plan() {
        let (pool, user_id, course_id) = setup().await;
        let stored = exam(&user_id, &course_id, "Quiz", Utc::now());
        insert_exam(&pool, &stored).await.unwrap();

        assert!(!delete_exam(&pool, "someone-else", &stored.id).await.unwrap());
        assert!(delete_exam(&pool, &user_id, &stored.id).await.unwrap());

        let (left,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM revision_sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(left, 0);
    }
}
