use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{NewUserRequest, Role, User};

pub async fn insert_user(db: &SqlitePool, req: NewUserRequest) -> Result<User, sqlx::Error> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        email: req.email,
        role: req.role,
        streak: req.streak,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, role, streak, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.role)
    .bind(user.streak)
    .bind(user.created_at)
    .execute(db)
    .await?;

    Ok(user)
}

pub async fn find_user_by_id(db: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, role, streak, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_user_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, role, streak, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

/// Creates the admin account unless a user with that email already exists.
pub async fn ensure_admin(db: &SqlitePool, name: &str, email: &str) -> Result<User, sqlx::Error> {
    if let Some(existing) = find_user_by_email(db, email).await? {
        return Ok(existing);
    }

    insert_user(
        db,
        NewUserRequest {
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Admin,
            streak: 0,
        },
    )
    .await
}

pub async fn fetch_users(db: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, role, streak, created_at FROM users ORDER BY created_at ASC",
    )
    .fetch_all(db)
    .await
}
