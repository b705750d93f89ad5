pub mod extract;

use axum::Json;
use axum::http::HeaderMap;
use axum::routing::{get, put};
use axum::{Router, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::db::{repository, users};
use crate::error::{AppError, conflict_on_unique};
use crate::models::*;
use crate::services::{Dashboard, DashboardService, ExamService};
use crate::state::AppState;
use crate::validation;

pub use extract::{AdminUser, AppJson, AppPath, CurrentUser, USER_ID_HEADER, caller};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn reply(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", get(list_users).post(create_user))
        .route("/users/me", get(current_user))
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/{id}", put(update_course).delete(delete_course))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", put(update_task).delete(delete_task))
        .route("/exams", get(list_exams).post(create_exam))
        .route("/exams/{id}", get(get_exam).delete(delete_exam))
        .route("/exams/{id}/revision/{index}", put(update_revision_session))
        .route("/dashboard", get(dashboard))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

// users

/// Open registration creates plain users; only an admin caller may create
/// another admin.
async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(mut req): AppJson<NewUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    if req.role != Role::User {
        match caller(&headers, &state).await? {
            Some(admin) if admin.is_admin() => {}
            _ => return Err(AppError::Forbidden),
        }
    }
    req.name = validation::required("name", &req.name)?;
    req.email = validation::required("email", &req.email)?.to_lowercase();
    if !req.email.contains('@') {
        return Err(AppError::BadRequest("email is invalid".to_string()));
    }
    if req.streak < 0 {
        return Err(AppError::BadRequest("streak must not be negative".to_string()));
    }

    let user = users::insert_user(&state.db, req)
        .await
        .map_err(|e| conflict_on_unique(e, "User already exists"))?;
    info!("created user {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

async fn current_user(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

async fn list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<User>>, AppError> {
    let users = users::fetch_users(&state.db).await?;
    Ok(Json(users))
}

// courses

async fn list_courses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = repository::fetch_courses(&state.db, &user.id).await?;
    Ok(Json(courses))
}

async fn create_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(req): AppJson<NewCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let req = NewCourseRequest {
        title: validation::required("title", &req.title)?,
        description: validation::optional(req.description),
        color: req.color.as_deref().map(validation::color).transpose()?,
    };
    let course = repository::insert_course(&state.db, &user.id, req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn update_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<String>,
    AppJson(req): AppJson<UpdateCourseRequest>,
) -> Result<Json<Course>, AppError> {
    let req = UpdateCourseRequest {
        title: req.title.as_deref().map(|t| validation::required("title", t)).transpose()?,
        description: req.description.map(|d| d.trim().to_string()),
        color: req.color.as_deref().map(validation::color).transpose()?,
    };
    let course = repository::update_course(&state.db, &user.id, &id, req)
        .await?
        .ok_or(AppError::NotFound("Course"))?;
    Ok(Json(course))
}

async fn delete_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !repository::delete_course(&state.db, &user.id, &id).await? {
        return Err(AppError::NotFound("Course"));
    }
    Ok(MessageResponse::reply("Course deleted"))
}

// tasks

async fn ensure_course(state: &AppState, user: &User, course_id: &str) -> Result<(), AppError> {
    repository::find_course(&state.db, &user.id, course_id)
        .await?
        .map(|_| ())
        .ok_or(AppError::NotFound("Course"))
}

async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<TaskView>>, AppError> {
    let now = Utc::now();
    let tasks = repository::fetch_tasks(&state.db, &user.id)
        .await?
        .into_iter()
        .map(|t| TaskView::at(t, now))
        .collect();
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(mut req): AppJson<NewTaskRequest>,
) -> Result<(StatusCode, Json<TaskView>), AppError> {
    req.title = validation::required("title", &req.title)?;
    req.description = validation::optional(req.description);
    ensure_course(&state, &user, &req.course_id).await?;

    let task = repository::insert_task(&state.db, &user.id, req).await?;
    Ok((StatusCode::CREATED, Json(TaskView::at(task, Utc::now()))))
}

async fn update_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<String>,
    AppJson(mut req): AppJson<UpdateTaskRequest>,
) -> Result<Json<TaskView>, AppError> {
    req.title = req
        .title
        .as_deref()
        .map(|t| validation::required("title", t))
        .transpose()?;
    if let Some(course_id) = req.course_id.as_deref() {
        ensure_course(&state, &user, course_id).await?;
    }

    let task = repository::update_task(&state.db, &user.id, &id, req)
        .await?
        .ok_or(AppError::NotFound("Task"))?;
    Ok(Json(TaskView::at(task, Utc::now())))
}

async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !repository::delete_task(&state.db, &user.id, &id).await? {
        return Err(AppError::NotFound("Task"));
    }
    Ok(MessageResponse::reply("Task deleted"))
}

// exams

async fn list_exams(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Exam>>, AppError> {
    let exams = ExamService::new(state.db.clone()).list(&user).await?;
    Ok(Json(exams))
}

async fn create_exam(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(req): AppJson<NewExamRequest>,
) -> Result<(StatusCode, Json<Exam>), AppError> {
    let exam = ExamService::new(state.db.clone())
        .create(&user, req, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

async fn get_exam(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<String>,
) -> Result<Json<Exam>, AppError> {
    let exam = ExamService::new(state.db.clone()).get(&user, &id).await?;
    Ok(Json(exam))
}

async fn delete_exam(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    ExamService::new(state.db.clone()).delete(&user, &id).await?;
    Ok(MessageResponse::reply("Exam deleted"))
}

async fn update_revision_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath((id, index)): AppPath<(String, String)>,
    AppJson(req): AppJson<SessionCompletionRequest>,
) -> Result<Json<Exam>, AppError> {
    let service = ExamService::new(state.db.clone());

    // an index that cannot name a session leaves the plan as it is
    let exam = match index.parse::<u32>() {
        Ok(index) => service.set_session_completed(&user, &id, index, req.completed).await?,
        Err(_) => {
            debug!("ignoring revision session {:?} on exam {}", index, id);
            service.get(&user, &id).await?
        }
    };
    Ok(Json(exam))
}

async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Dashboard>, AppError> {
    let dashboard = DashboardService::new(state.db.clone())
        .build(&user, Utc::now())
        .await?;
    Ok(Json(dashboard))
}
