use std::sync::Arc;

use app_core::error::AppError;
use uuid::Uuid;

use crate::domain::entity::verification::VerificationToken;
use crate::outbound::repository::UserRepository;

const INVALID_TOKEN_MSG: &str = "Verification token is invalid or already used";

/// Issues and consumes signup verification tokens.
///
/// A token is a UUIDv4 (128 bits of entropy), stored unconsumed, and
/// verifies at most once; re-presenting a consumed or mismatched token
/// fails without touching stored state.
#[derive(Clone)]
pub struct VerificationLedger {
    repo: Arc<dyn UserRepository>,
}

impl VerificationLedger {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Issues a fresh token for the user. Fails with a conflict if a live
    /// token already exists.
    pub async fn issue(&self, user_id: i64) -> Result<VerificationToken, AppError> {
        let verification = VerificationToken { user_id, token: Uuid::new_v4().to_string(), consumed: false };

        self.repo.insert_verification(&verification).await?;

        Ok(verification)
    }

    /// Consumes the user's token. The presented value must match the stored
    /// unconsumed token exactly.
    pub async fn consume(&self, user_id: i64, token: &str) -> Result<(), AppError> {
        let stored = self
            .repo
            .find_verification_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::InvalidToken(INVALID_TOKEN_MSG.to_string()))?;

        if stored.consumed || stored.token != token {
            return Err(AppError::InvalidToken(INVALID_TOKEN_MSG.to_string()));
        }

        self.repo.consume_verification(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::outbound::repository::MockUserRepository;

    #[tokio::test]
    async fn test_issue_stores_unconsumed_uuid_token() {
        let mut repo = MockUserRepository::new();
        repo.expect_insert_verification()
            .withf(|v| v.user_id == 7 && !v.consumed && Uuid::parse_str(&v.token).is_ok())
            .returning(|_| Ok(()));

        let ledger = VerificationLedger::new(Arc::new(repo));

        let verification = ledger.issue(7).await.unwrap();

        assert_eq!(verification.user_id, 7);
        assert!(!verification.consumed);
    }

    #[tokio::test]
    async fn test_issue_propagates_live_token_conflict() {
        let mut repo = MockUserRepository::new();
        repo.expect_insert_verification()
            .returning(|_| Err(AppError::Conflict("A verification is already pending for this user".to_string())));

        let ledger = VerificationLedger::new(Arc::new(repo));

        assert!(matches!(ledger.issue(7).await.unwrap_err(), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_consume_matching_token() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_verification_by_user_id()
            .with(eq(7))
            .returning(|_| Ok(Some(VerificationToken { user_id: 7, token: "tok".to_string(), consumed: false })));
        repo.expect_consume_verification().with(eq(7)).returning(|_| Ok(()));

        let ledger = VerificationLedger::new(Arc::new(repo));

        assert!(ledger.consume(7, "tok").await.is_ok());
    }

    #[tokio::test]
    async fn test_consume_rejects_mismatched_token() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_verification_by_user_id()
            .returning(|_| Ok(Some(VerificationToken { user_id: 7, token: "tok".to_string(), consumed: false })));
        repo.expect_consume_verification().never();

        let ledger = VerificationLedger::new(Arc::new(repo));

        let result = ledger.consume(7, "wrong").await;

        assert!(matches!(result.unwrap_err(), AppError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_consume_rejects_already_consumed_token() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_verification_by_user_id()
            .returning(|_| Ok(Some(VerificationToken { user_id: 7, token: "tok".to_string(), consumed: true })));
        repo.expect_consume_verification().never();

        let ledger = VerificationLedger::new(Arc::new(repo));

        let result = ledger.consume(7, "tok").await;

        assert!(matches!(result.unwrap_err(), AppError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_consume_without_stored_verification() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_verification_by_user_id().returning(|_| Ok(None));

        let ledger = VerificationLedger::new(Arc::new(repo));

        let result = ledger.consume(7, "tok").await;

        assert!(matches!(result.unwrap_err(), AppError::InvalidToken(_)));
    }
}
