//! Accounts and authentication

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a reader account
    pub async fn register(&self, user: CreateUser) -> AppResult<User> {
        user.validate()?;
        let hash = hash_password(&user.password)?;
        let created = self
            .repository
            .users
            .create(
                &user.email,
                &hash,
                user.first_name.as_deref(),
                user.last_name.as_deref(),
                false,
            )
            .await?;
        tracing::info!(user_id = created.id, "User registered");
        Ok(created)
    }

    /// Check credentials and issue a bearer token
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let invalid = || AppError::Authentication("Invalid email or password".to_string());

        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&user.password, password)? {
            return Err(invalid());
        }

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            is_staff: user.is_staff,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn set_staff(&self, id: i32, is_staff: bool) -> AppResult<User> {
        let user = self.repository.users.set_staff(id, is_staff).await?;
        tracing::info!(user_id = id, is_staff, "Staff rights changed");
        Ok(user)
    }

    /// Create the configured staff account unless it already exists
    pub async fn ensure_bootstrap_admin(&self) -> AppResult<()> {
        let (Some(email), Some(password)) = (
            self.config.bootstrap_admin_email.as_deref(),
            self.config.bootstrap_admin_password.as_deref(),
        ) else {
            return Ok(());
        };

        if self.repository.users.get_by_email(email).await?.is_some() {
            return Ok(());
        }

        let hash = hash_password(password)?;
        let user = self
            .repository
            .users
            .create(email, &hash, None, None, true)
            .await?;
        tracing::info!(user_id = user.id, "Bootstrap staff account created: {}", user.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_only_the_same_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse").unwrap());
        assert!(!verify_password(&hash, "battery staple").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_internal_error() {
        assert!(matches!(
            verify_password("plaintext", "plaintext"),
            Err(AppError::Internal(_))
        ));
    }
}
