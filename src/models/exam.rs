use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::dates;

pub use crate::planner::RevisionSession;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub title: String,
    pub exam_date: DateTime<Utc>,
    pub revision_plan: Vec<RevisionSession>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The `exams` row without its plan.
#[derive(Debug, Clone, FromRow)]
pub struct ExamRow {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub title: String,
    pub exam_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExamRow {
    pub fn with_plan(self, revision_plan: Vec<RevisionSession>) -> Exam {
        Exam {
            id: self.id,
            user_id: self.user_id,
            course_id: self.course_id,
            title: self.title,
            exam_date: self.exam_date,
            revision_plan,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExamRequest {
    pub title: String,
    pub course_id: String,
    #[serde(deserialize_with = "dates::flexible")]
    pub exam_date: DateTime<Utc>,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCompletionRequest {
    pub completed: bool,
}
