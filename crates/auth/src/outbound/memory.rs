use std::collections::HashMap;
use std::sync::RwLock;

use app_core::error::AppError;
use app_core::oauth::ProviderProfile;
use async_trait::async_trait;
use chrono::Utc;

use super::repository::UserRepository;
use crate::domain::entity::user::{NewLocalUser, User, UserStatus};
use crate::domain::entity::verification::VerificationToken;

const USERNAME_TAKEN_MSG: &str = "A user with this username already exists";
const EMAIL_TAKEN_MSG: &str = "A user with this email already exists";
const LIVE_TOKEN_MSG: &str = "A verification is already pending for this user";

#[derive(Default)]
struct State {
    next_id: i64,
    users: HashMap<i64, User>,
    verifications: HashMap<i64, VerificationToken>,
}

/// An in-memory [`UserRepository`] adapter. Uniqueness checks and writes
/// happen under one lock, so conflict detection is atomic.
#[derive(Default)]
pub struct InMemoryUserRepository {
    state: RwLock<State>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

// Lock poisoning means another request panicked mid-write; surface it as an
// internal error instead of propagating the panic.
fn poisoned<T>(_: T) -> AppError {
    tracing::error!("user repository lock poisoned");
    AppError::Internal
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let state = self.state.read().map_err(poisoned)?;

        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().map_err(poisoned)?;

        Ok(state.users.values().find(|u| u.email.as_deref() == Some(email)).cloned())
    }

    async fn create_local_user(&self, new_user: &NewLocalUser) -> Result<User, AppError> {
        let mut state = self.state.write().map_err(poisoned)?;

        if state.users.values().any(|u| u.username == new_user.username) {
            return Err(AppError::Conflict(USERNAME_TAKEN_MSG.to_string()));
        }
        if state.users.values().any(|u| u.email.as_deref() == Some(new_user.email.as_str())) {
            return Err(AppError::Conflict(EMAIL_TAKEN_MSG.to_string()));
        }

        state.next_id += 1;
        let user = User {
            id: state.next_id,
            username: new_user.username.clone(),
            email: Some(new_user.email.clone()),
            password_hash: Some(new_user.password_hash.clone()),
            avatar_url: None,
            provider: None,
            external_id: None,
            status: UserStatus::PendingVerification,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn upsert_provider_user(&self, provider: &str, profile: &ProviderProfile) -> Result<User, AppError> {
        let mut state = self.state.write().map_err(poisoned)?;

        let existing_id = state
            .users
            .values()
            .find(|u| {
                u.provider.as_deref() == Some(provider) && u.external_id.as_deref() == Some(profile.external_id.as_str())
            })
            .map(|u| u.id);

        if let Some(id) = existing_id {
            let user = state.users.get_mut(&id).ok_or(AppError::Internal)?;
            user.username = profile.display_name.clone();
            user.avatar_url = profile.avatar_url.clone();
            return Ok(user.clone());
        }

        state.next_id += 1;
        let user = User {
            id: state.next_id,
            username: profile.display_name.clone(),
            email: None,
            password_hash: None,
            avatar_url: profile.avatar_url.clone(),
            provider: Some(provider.to_string()),
            external_id: Some(profile.external_id.clone()),
            status: UserStatus::Verified,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_verification_by_user_id(&self, user_id: i64) -> Result<Option<VerificationToken>, AppError> {
        let state = self.state.read().map_err(poisoned)?;

        Ok(state.verifications.get(&user_id).cloned())
    }

    async fn insert_verification(&self, verification: &VerificationToken) -> Result<(), AppError> {
        let mut state = self.state.write().map_err(poisoned)?;

        if let Some(existing) = state.verifications.get(&verification.user_id) {
            if !existing.consumed {
                return Err(AppError::Conflict(LIVE_TOKEN_MSG.to_string()));
            }
        }

        state.verifications.insert(verification.user_id, verification.clone());

        Ok(())
    }

    async fn consume_verification(&self, user_id: i64) -> Result<(), AppError> {
        let mut state = self.state.write().map_err(poisoned)?;

        let verification = state
            .verifications
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("Verification not found".to_string()))?;
        verification.consumed = true;

        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.status = UserStatus::Verified;

        Ok(())
    }
}
