use app_core::error::AppError;
use app_core::oauth::ProviderProfile;
use async_trait::async_trait;

use crate::domain::entity::user::{NewLocalUser, User};
use crate::domain::entity::verification::VerificationToken;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a single user by their unique ID.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` if a matching user is found.
    /// * `Ok(None)` if no user matches the given ID.
    /// * `Err(AppError)` if a storage error occurs.
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Finds a single user by their unique email.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` if a matching user is found.
    /// * `Ok(None)` if no user matches the given email.
    /// * `Err(AppError)` if a storage error occurs.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Creates a new local (credential-based) user in the pending
    /// verification state.
    ///
    /// Uniqueness of username and email is enforced atomically by the
    /// adapter.
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - The stored user with its assigned ID.
    /// * `Err(AppError::Conflict)` - If the username or email is taken.
    /// * `Err(AppError)` - If a storage error occurs.
    async fn create_local_user(&self, new_user: &NewLocalUser) -> Result<User, AppError>;

    /// Finds the user linked to the given provider identity, or creates one
    /// if none exists. Provider users are verified implicitly; on repeat
    /// signins the stored display name and avatar are refreshed from the
    /// profile.
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - The user associated with the identity, found or newly
    ///   created.
    /// * `Err(AppError)` - If a storage error occurs.
    async fn upsert_provider_user(&self, provider: &str, profile: &ProviderProfile) -> Result<User, AppError>;

    /// Finds the verification token recorded for a user, consumed or not.
    async fn find_verification_by_user_id(&self, user_id: i64) -> Result<Option<VerificationToken>, AppError>;

    /// Records a fresh verification token for a user.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the token was stored.
    /// * `Err(AppError::Conflict)` - If a live token already exists for the
    ///   user.
    /// * `Err(AppError)` - If a storage error occurs.
    async fn insert_verification(&self, verification: &VerificationToken) -> Result<(), AppError>;

    /// Marks the user's verification token consumed and moves the user to
    /// the verified state, as one operation.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the token was consumed.
    /// * `Err(AppError)` - If the user or token is missing, or a storage
    ///   error occurs.
    async fn consume_verification(&self, user_id: i64) -> Result<(), AppError>;
}
