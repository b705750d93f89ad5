use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::dates;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub completed: bool,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.deadline < now
    }

    /// Incomplete and due within the next day.
    pub fn is_due_soon(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.deadline >= now && self.deadline <= now + Duration::days(1)
    }
}

/// A task as served over the API, with its deadline flags resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub is_overdue: bool,
    pub is_due_soon: bool,
}

impl TaskView {
    pub fn at(task: Task, now: DateTime<Utc>) -> Self {
        Self {
            is_overdue: task.is_overdue(now),
            is_due_soon: task.is_due_soon(now),
            task,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskRequest {
    pub course_id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "dates::flexible")]
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub course_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "dates::flexible_option")]
    pub deadline: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task(deadline: DateTime<Utc>, completed: bool) -> Task {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        Task {
            id: "t1".to_string(),
            user_id: "u1".to_string(),
            course_id: "c1".to_string(),
            title: "Problem set".to_string(),
            description: None,
            deadline,
            completed,
            priority: Priority::Medium,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn overdue_only_when_incomplete_and_past() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let past = now - Duration::hours(1);

        assert!(task(past, false).is_overdue(now));
        assert!(!task(past, true).is_overdue(now));
        assert!(!task(now + Duration::hours(1), false).is_overdue(now));
    }

    #[test]
    fn due_soon_within_one_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();

        assert!(task(now + Duration::hours(23), false).is_due_soon(now));
        assert!(task(now + Duration::days(1), false).is_due_soon(now));
        assert!(!task(now + Duration::hours(25), false).is_due_soon(now));
        assert!(!task(now - Duration::minutes(1), false).is_due_soon(now));
        assert!(!task(now + Duration::hours(2), true).is_due_soon(now));
    }

    #[test]
    fn view_flattens_task_fields() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let view = TaskView::at(task(now - Duration::days(2), false), now);
        let value = serde_json::to_value(&view).unwrap();

        assert_eq!(value["title"], "Problem set");
        assert_eq!(value["courseId"], "c1");
        assert_eq!(value["priority"], "medium");
        assert_eq!(value["isOverdue"], true);
        assert_eq!(value["isDueSoon"], false);
    }
}
