use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{exams, repository};
use crate::error::AppError;
use crate::models::{Exam, NewExamRequest, User};
use crate::planner;
use crate::validation;

pub struct ExamService {
    db: SqlitePool,
}

impl ExamService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list(&self, user: &User) -> Result<Vec<Exam>, AppError> {
        Ok(exams::fetch_exams(&self.db, &user.id).await?)
    }

    pub async fn get(&self, user: &User, id: &str) -> Result<Exam, AppError> {
        exams::find_exam(&self.db, &user.id, id)
            .await?
            .ok_or(AppError::NotFound("Exam"))
    }

    /// Validates the request, generates the revision plan and stores both.
    pub async fn create(
        &self,
        user: &User,
        req: NewExamRequest,
        now: DateTime<Utc>,
    ) -> Result<Exam, AppError> {
        let title = validation::required("title", &req.title)?;
        let topics = validation::topics(&req.topics)?;
        if !planner::window_fits(req.exam_date) {
            return Err(AppError::BadRequest("examDate is out of range".to_string()));
        }

        repository::find_course(&self.db, &user.id, &req.course_id)
            .await?
            .ok_or(AppError::NotFound("Course"))?;

        let revision_plan = planner::plan_revision(&topics, req.exam_date);
        debug!(
            "planned {} topics over {} sessions for exam on {}",
            topics.len(),
            revision_plan.len(),
            req.exam_date
        );

        let exam = Exam {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            course_id: req.course_id,
            title,
            exam_date: req.exam_date,
            revision_plan,
            created_at: now,
            updated_at: now,
        };
        exams::insert_exam(&self.db, &exam).await?;

        info!("created exam {} for user {}", exam.id, user.id);
        Ok(exam)
    }

    /// Marks one revision session done or not done.
    ///
    /// An index outside the plan leaves the exam untouched and returns it as is.
    pub async fn set_session_completed(
        &self,
        user: &User,
        exam_id: &str,
        index: u32,
        completed: bool,
    ) -> Result<Exam, AppError> {
        let exam = self.get(user, exam_id).await?;

        if !exams::set_session_completed(&self.db, &exam.id, index, completed).await? {
            debug!("exam {} has no revision session {}", exam.id, index);
            return Ok(exam);
        }

        self.get(user, exam_id).await
    }

    pub async fn delete(&self, user: &User, id: &str) -> Result<(), AppError> {
        if exams::delete_exam(&self.db, &user.id, id).await? {
            info!("deleted exam {} for user {}", id, user.id);
            Ok(())
        } else {
            Err(AppError::NotFound("Exam"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::db::{connect_in_memory, users};
    use crate::models::{NewCourseRequest, NewUserRequest, Role};

    async fn setup() -> (ExamService, User, String) {
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
                title: "Physics".to_string(),
                description: None,
                color: None,
            },
        )
        .await
        .unwrap();
        (ExamService::new(pool), user, course.id)
    }

    fn request(course_id: &str, topics: &[&str]) -> NewExamRequest {
        NewExamRequest {
            title: " Physics Final ".to_string(),
            course_id: course_id.to_string(),
            exam_date: Utc.with_ymd_and_hms(2026, 6, 20, 10, 0, 0).unwrap(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_generates_and_stores_plan() {
        let (service, user, course_id) = setup().await;
        let topics = ["Kinematics", "Dynamics", "Energy", "Momentum", "Rotation", "Gravity",
            "Oscillations", "Waves", "Fluids", "Thermodynamics"];

        let exam = service
            .create(&user, request(&course_id, &topics), Utc::now())
            .await
            .expect("Failed to create exam");

        assert_eq!(exam.title, "Physics Final");
        assert_eq!(exam.revision_plan.len(), 7);
        assert_eq!(
            exam.revision_plan[0].date,
            Utc.with_ymd_and_hms(2026, 6, 6, 10, 0, 0).unwrap()
        );
        let sizes: Vec<usize> = exam.revision_plan.iter().map(|s| s.topics.len()).collect();
        assert_eq!(sizes, vec![2, 2, 2, 2, 2, 0, 0]);

        let stored = service.get(&user, &exam.id).await.unwrap();
        assert_eq!(stored.revision_plan, exam.revision_plan);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_topic_and_foreign_course() {
        let (service, user, course_id) = setup().await;

        let err = service
            .create(&user, request(&course_id, &["Waves", "  "]), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = service
            .create(&user, request("not-a-course", &["Waves"]), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("Course")));
    }

    #[tokio::test]
    async fn test_set_session_completed() {
        let (service, user, course_id) = setup().await;
        let exam = service
            .create(&user, request(&course_id, &["Energy"]), Utc::now())
            .await
            .unwrap();

        let updated = service
            .set_session_completed(&user, &exam.id, 0, true)
            .await
            .unwrap();
        assert!(updated.revision_plan[0].completed);
        assert!(updated.revision_plan[1..].iter().all(|s| !s.completed));
        assert!(updated.updated_at >= exam.updated_at);

        // unknown session index is a no-op
        let same = service
            .set_session_completed(&user, &exam.id, 9, true)
            .await
            .unwrap();
        assert_eq!(same.revision_plan, updated.revision_plan);

        let undone = service
            .set_session_completed(&user, &exam.id, 0, false)
            .await
            .unwrap();
        assert!(!undone.revision_plan[0].completed);
    }

    #[tokio::test]
    async fn test_delete_and_missing_exam() {
        let (service, user, course_id) = setup().await;
        let exam = service
            .create(&user, request(&course_id, &[]), Utc::now() + Duration::days(1))
            .await
            .unwrap();
        assert!(exam.revision_plan.iter().all(|s| s.topics.is_empty()));

        service.delete(&user, &exam.id).await.unwrap();
        assert!(matches!(
            service.get(&user, &exam.id).await,
            Err(AppError::NotFound("Exam"))
        ));
        assert!(matches!(
            service.delete(&user, &exam.id).await,
            Err(AppError::NotFound("Exam"))
        ));
    }
}
