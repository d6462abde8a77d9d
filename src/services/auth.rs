//! Operator authentication

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{User, UserClaims},
    repository::Repository,
};

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Check credentials and issue a bearer token
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .user_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&user, password)? {
            tracing::warn!(username = %user.username, "Rejected login");
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let token = UserClaims::new(&user, self.config.jwt_expiration_hours, Utc::now())
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!(user_id = %user.id, "Operator logged in");
        Ok((token, user))
    }

    /// The account behind a token. A deleted account no longer authenticates.
    pub async fn me(&self, user_id: Uuid) -> AppResult<User> {
        self.repository
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("Account no longer exists".to_string()))
    }

    pub async fn change_password(&self, user_id: Uuid, current_password: &str, new_password: &str) -> AppResult<()> {
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "New password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let user = self.me(user_id).await?;
        if !verify_password(&user, current_password)? {
            return Err(AppError::Authentication("Current password is incorrect".to_string()));
        }

        let hash = hash_password(new_password)?;
        self.repository.update_user_password(user_id, &hash).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Create the configured bootstrap account unless it already exists
    pub async fn ensure_bootstrap_admin(&self) -> AppResult<()> {
        let (Some(username), Some(password)) = (
            self.config.bootstrap_username.as_deref(),
            self.config.bootstrap_password.as_deref(),
        ) else {
            return Ok(());
        };

        if self.repository.user_by_username(username).await?.is_some() {
            return Ok(());
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password: hash_password(password)?,
            created_at: Utc::now(),
        };
        match self.repository.insert_user(&user).await {
            // Another instance got there first
            Err(AppError::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
            Ok(()) => {
                tracing::info!(username = %username, "Created bootstrap account");
                Ok(())
            }
        }
    }
}

fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use std::sync::Arc;

    async fn service() -> AuthService {
        let config = AuthConfig {
            bootstrap_username: Some("admin".to_string()),
            bootstrap_password: Some("admin123".to_string()),
            ..AuthConfig::default()
        };
        let service = AuthService::new(Arc::new(MemoryStore::new()), config);
        service.ensure_bootstrap_admin().await.unwrap();
        service
    }

    #[tokio::test]
    async fn bootstrap_account_can_log_in_and_is_created_once() {
        let service = service().await;
        service.ensure_bootstrap_admin().await.unwrap();

        let (token, user) = service.login("admin", "admin123").await.unwrap();
        let claims = UserClaims::from_token(&token, &service.config.jwt_secret).unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.sub, "admin");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let service = service().await;
        let wrong = service.login("admin", "nope").await.unwrap_err();
        let unknown = service.login("ghost", "admin123").await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn change_password_checks_length_then_current_password() {
        let service = service().await;
        let (_, user) = service.login("admin", "admin123").await.unwrap();

        assert!(matches!(
            service.change_password(user.id, "admin123", "abc").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.change_password(user.id, "wrong", "longenough").await,
            Err(AppError::Authentication(_))
        ));

        service.change_password(user.id, "admin123", "longenough").await.unwrap();
        assert!(service.login("admin", "admin123").await.is_err());
        assert!(service.login("admin", "longenough").await.is_ok());
    }

    #[tokio::test]
    async fn no_account_is_created_without_bootstrap_credentials() {
        let service = AuthService::new(Arc::new(MemoryStore::new()), AuthConfig::default());
        service.ensure_bootstrap_admin().await.unwrap();
        assert!(matches!(
            service.login("admin", "admin123").await,
            Err(AppError::Authentication(_))
        ));
    }
}
