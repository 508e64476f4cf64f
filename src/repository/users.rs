//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::User,
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Insert a user with an already hashed password
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        is_staff: bool,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, first_name, last_name, is_staff)
            VALUES (LOWER($1), $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_constraint(e, "A user with this email already exists"))
    }

    /// Grant or revoke staff rights
    pub async fn set_staff(&self, id: i32, is_staff: bool) -> AppResult<User> {
        sqlx::query_as::<_, User>("UPDATE users SET is_staff = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(is_staff)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }
}
