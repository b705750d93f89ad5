use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::{exams, repository};
use crate::error::AppError;
use crate::models::{Exam, TaskView, User};

const TASK_HORIZON_DAYS: i64 = 7;
const EXAM_HORIZON_DAYS: i64 = 30;
const UPCOMING_LIMIT: i64 = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub overdue_tasks: i64,
    /// Whole percent of tasks completed.
    pub progress: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub streak: i64,
    pub upcoming_tasks: Vec<TaskView>,
    pub upcoming_exams: Vec<Exam>,
    pub stats: DashboardStats,
}

pub struct DashboardService {
    db: SqlitePool,
}

impl DashboardService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn build(&self, user: &User, now: DateTime<Utc>) -> Result<Dashboard, AppError> {
        let upcoming_tasks = repository::fetch_upcoming_tasks(
            &self.db,
            &user.id,
            now,
            now + Duration::days(TASK_HORIZON_DAYS),
            UPCOMING_LIMIT,
        )
        .await?
        .into_iter()
        .map(|t| TaskView::at(t, now))
        .collect();

        let upcoming_exams = exams::fetch_upcoming_exams(
            &self.db,
            &user.id,
            now,
            now + Duration::days(EXAM_HORIZON_DAYS),
            UPCOMING_LIMIT,
        )
        .await?;

        let counts = repository::count_tasks(&self.db, &user.id, now).await?;

        Ok(Dashboard {
            streak: user.streak,
            upcoming_tasks,
            upcoming_exams,
            stats: DashboardStats {
                total_tasks: counts.total,
                completed_tasks: counts.completed,
                overdue_tasks: counts.overdue,
                progress: progress_percent(counts.completed, counts.total),
            },
        })
    }
}

fn progress_percent(completed: i64, total: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as i64
}
