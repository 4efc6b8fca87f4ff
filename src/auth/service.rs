//! Auth service: registration, login validation, session and password-reset
//! lifecycles. Orchestrates hash-and-store and lookup-and-compare sequences
//! against the credential store.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::debug;
use uuid::Uuid;

use crate::db::{User, UserFilter, UserPatch, UserStore};
use crate::error::{AppError, AppResult};

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("hash: {}", e)))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(anyhow::anyhow!("parse hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Fresh opaque token for session ids and reset tokens (OS-seeded UUIDv4).
fn generate_token() -> String {
    Uuid::new_v4().to_string()
}

/// Authentication service over an explicitly constructed store.
#[derive(Clone)]
pub struct Auth {
    store: UserStore,
}

impl Auth {
    pub fn new(store: UserStore) -> Self {
        Self { store }
    }

    /// Register a new user. Fails `DuplicateEmail` if the email is taken.
    pub async fn register_user(&self, email: &str, password: &str) -> AppResult<User> {
        match self.store.find_user_by(UserFilter::Email(email)).await {
            Ok(_) => return Err(AppError::DuplicateEmail(email.to_string())),
            Err(AppError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let hashed_password = hash_password(password)?;
        let user = self.store.add_user(email, &hashed_password).await?;
        debug!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// True iff the email exists and the password matches its stored hash.
    /// An unknown email is `Ok(false)`, never an error.
    pub async fn valid_login(&self, email: &str, password: &str) -> AppResult<bool> {
        match self.store.find_user_by(UserFilter::Email(email)).await {
            Ok(user) => verify_password(password, &user.hashed_password),
            Err(AppError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Issue a fresh session id, replacing any previous one for the user.
    /// Returns `None` for an unknown email.
    pub async fn create_session(&self, email: &str) -> AppResult<Option<String>> {
        let user = match self.store.find_user_by(UserFilter::Email(email)).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let session_id = generate_token();
        self.store
            .update_user(
                user.id,
                UserPatch {
                    session_id: Some(Some(session_id.clone())),
                    ..Default::default()
                },
            )
            .await?;
        debug!(user_id = user.id, "session created");
        Ok(Some(session_id))
    }

    /// Resolve a session id to its user. `None` in, or a lookup miss, yields
    /// `Ok(None)`.
    pub async fn get_user_from_session_id(
        &self,
        session_id: Option<&str>,
    ) -> AppResult<Option<User>> {
        let Some(session_id) = session_id else {
            return Ok(None);
        };
        match self
            .store
            .find_user_by(UserFilter::SessionId(session_id))
            .await
        {
            Ok(user) => Ok(Some(user)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Clear the user's session id. Already-clear sessions and unknown ids
    /// are both no-ops.
    pub async fn destroy_session(&self, user_id: i64) -> AppResult<()> {
        match self
            .store
            .update_user(
                user_id,
                UserPatch {
                    session_id: Some(None),
                    ..Default::default()
                },
            )
            .await
        {
            Ok(()) => {
                debug!(user_id, "session destroyed");
                Ok(())
            }
            Err(AppError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Issue a password-reset token. Fails `NotFound` for an unknown email.
    pub async fn get_reset_password_token(&self, email: &str) -> AppResult<String> {
        let user = self.store.find_user_by(UserFilter::Email(email)).await?;

        let reset_token = generate_token();
        self.store
            .update_user(
                user.id,
                UserPatch {
                    reset_token: Some(Some(reset_token.clone())),
                    ..Default::default()
                },
            )
            .await?;
        debug!(user_id = user.id, "reset token issued");
        Ok(reset_token)
    }

    /// Consume a reset token: store a new hash and clear the token in the
    /// same update, so tokens are single-use. Fails `NotFound` for an
    /// unknown (or already-consumed) token.
    pub async fn update_password(&self, reset_token: &str, new_password: &str) -> AppResult<()> {
        let user = self
            .store
            .find_user_by(UserFilter::ResetToken(reset_token))
            .await?;

        let hashed_password = hash_password(new_password)?;
        self.store
            .update_user(
                user.id,
                UserPatch {
                    hashed_password: Some(hashed_password),
                    reset_token: Some(None),
                    ..Default::default()
                },
            )
            .await?;
        debug!(user_id = user.id, "password updated");
        Ok(())
    }
}
