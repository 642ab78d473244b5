use std::sync::Arc;

use app_core::config::Config;
use app_core::error::AppError;
use app_core::jwt::{SessionProfile, SessionSigner};
use app_core::mail::{Email, Mailer};
use app_core::oauth::ProviderRegistry;
use app_core::password::Hasher;
use app_core::url_builder;
use async_trait::async_trait;
use validator::Validate;

use crate::domain::entity::user::{NewLocalUser, User, UserStatus};
use crate::domain::inout::prelude::*;
use crate::outbound::repository::UserRepository;
use crate::usecase::verification::VerificationLedger;

// Constants for better maintainability
const INVALID_CREDENTIALS_MSG: &str = "Invalid email or password";
const USER_NOT_FOUND_MSG: &str = "User not found";
const MISSING_USER_ID_MSG: &str = "Missing user id";
const MISSING_TOKEN_MSG: &str = "Missing verification token";
const VERIFICATION_MSG: &str = "Please verify your email to activate your account.";
const VERIFIED_MSG: &str = "Your account is verified. You can now sign in.";

/// Emails are stored and looked up in one canonical form so a signup and a
/// later signin with different casing resolve to the same account.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthnUseCase: Send + Sync {
    async fn signup(&self, input: SignupInput) -> Result<SignupOutput, AppError>;
    async fn verify(&self, input: VerifyInput) -> Result<VerifyOutput, AppError>;
    async fn signin(&self, input: SigninInput) -> Result<SigninOutput, AppError>;
    async fn authorize_provider(&self, input: ProviderAuthorizeInput) -> Result<ProviderAuthorizeOutput, AppError>;
    async fn signin_via_provider(&self, input: ProviderSigninInput) -> Result<ProviderSigninOutput, AppError>;
}

#[derive(Clone)]
pub struct AuthnService {
    config: Arc<Config>,
    hasher: Arc<dyn Hasher>,
    signer: Arc<dyn SessionSigner>,
    mail: Arc<dyn Mailer>,
    providers: ProviderRegistry,
    ledger: VerificationLedger,
    repo: Arc<dyn UserRepository>,
}

impl AuthnService {
    pub fn new(
        config: Arc<Config>,
        hasher: Arc<dyn Hasher>,
        signer: Arc<dyn SessionSigner>,
        mail: Arc<dyn Mailer>,
        providers: ProviderRegistry,
        ledger: VerificationLedger,
        repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self { config, hasher, signer, mail, providers, ledger, repo }
    }

    /// Validates local credentials and returns the verified user.
    ///
    /// Unknown email, unverified account, and wrong password all produce the
    /// same error so the responses are indistinguishable.
    async fn authenticate_local(&self, email: &str, password: &str) -> Result<User, AppError> {
        let invalid = || AppError::InvalidCredentials(INVALID_CREDENTIALS_MSG.to_string());

        let email = normalize_email(email);
        let user = self.repo.find_user_by_email(&email).await?.ok_or_else(invalid)?;

        if user.status != UserStatus::Verified {
            return Err(invalid());
        }

        let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
        if !self.hasher.verify(password, hash)? {
            return Err(invalid());
        }

        Ok(user)
    }

    /// Signs a session token from the user's public profile.
    fn sign_session(&self, user: &User) -> Result<String, AppError> {
        let token = self.signer.sign(SessionProfile {
            user_id: user.id,
            username: user.username.clone(),
            avatar_url: user.avatar_url.clone(),
        })?;

        Ok(token)
    }

    /// Builds the verification link sent in the signup email.
    fn verification_link(&self, user_id: i64, token: &str) -> Result<String, AppError> {
        let public_url: String = self.config.get("server.public_url")?;
        let base = format!("{}/auth/signup/verify", public_url.trim_end_matches('/'));
        let user_id = user_id.to_string();

        let link = url_builder::build(&base, &[("user_id", Some(user_id.as_str())), ("token", Some(token))])?;

        Ok(link)
    }
}

#[async_trait]
impl AuthnUseCase for AuthnService {
    async fn signup(&self, input: SignupInput) -> Result<SignupOutput, AppError> {
        input.validate()?;

        let new_user = NewLocalUser {
            username: input.username,
            email: normalize_email(&input.email),
            password_hash: self.hasher.hash(&input.password)?,
        };

        // The repository enforces username/email uniqueness atomically
        let user = self.repo.create_local_user(&new_user).await?;

        let verification = self.ledger.issue(user.id).await?;
        let link = self.verification_link(user.id, &verification.token)?;

        let email = Email::build_signup_verification(new_user.email.as_str(), user.username.as_str(), &link);
        self.mail.send(email).await?;

        tracing::info!(user_id = user.id, "local signup created, verification mail sent");

        Ok(SignupOutput { success: true, message: VERIFICATION_MSG.to_string() })
    }

    async fn verify(&self, input: VerifyInput) -> Result<VerifyOutput, AppError> {
        let user_id = input.user_id.ok_or_else(|| AppError::ValidationStr(MISSING_USER_ID_MSG.to_string()))?;
        let token = input.token.ok_or_else(|| AppError::ValidationStr(MISSING_TOKEN_MSG.to_string()))?;

        self.repo
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND_MSG.to_string()))?;

        self.ledger.consume(user_id, &token).await?;

        tracing::info!(user_id, "signup verified");

        Ok(VerifyOutput { success: true, message: VERIFIED_MSG.to_string() })
    }

    async fn signin(&self, input: SigninInput) -> Result<SigninOutput, AppError> {
        input.validate()?;

        let user = self.authenticate_local(&input.email, &input.password).await?;
        let token = self.sign_session(&user)?;

        Ok(SigninOutput { token })
    }

    async fn authorize_provider(&self, input: ProviderAuthorizeInput) -> Result<ProviderAuthorizeOutput, AppError> {
        input.validate()?;

        let provider = self.providers.get(&input.provider)?;
        let request = provider.authorize()?;

        Ok(ProviderAuthorizeOutput { url: request.url, state: request.state })
    }

    async fn signin_via_provider(&self, input: ProviderSigninInput) -> Result<ProviderSigninOutput, AppError> {
        input.validate()?;

        let provider = self.providers.get(&input.provider)?;

        // Exchange and profile fetch both fail without touching stored state
        let tokens = provider.exchange_code(&input.code).await?;
        let profile = provider.fetch_profile(&tokens.access_token).await?;

        let user = self.repo.upsert_provider_user(&input.provider, &profile).await?;
        let token = self.sign_session(&user)?;

        tracing::info!(user_id = user.id, provider = %input.provider, "provider signin");

        Ok(ProviderSigninOutput { token })
    }
}

#[cfg(test)]
mod tests {
    use app_core::jwt::{JwtConfig, JwtService, MockSessionSigner};
    use app_core::mail::MockMailer;
    use app_core::oauth::{MockOAuthProvider, OAuthError, OAuthTokenSet, ProviderProfile};
    use app_core::password::{Argon2Hasher, MockHasher};
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::outbound::memory::InMemoryUserRepository;
    use crate::outbound::repository::MockUserRepository;

    fn test_config() -> Arc<Config> {
        Arc::new(
            Config::builder_test()
                .with("server.public_url", "http://localhost:8080")
                .build(),
        )
    }

    fn verified_user(id: i64, email: &str) -> User {
        User {
            id,
            username: "alice".to_string(),
            email: Some(email.to_string()),
            password_hash: Some("$argon2id$stored".to_string()),
            avatar_url: None,
            provider: None,
            external_id: None,
            status: UserStatus::Verified,
            created_at: Utc::now(),
        }
    }

    struct Fixture {
        repo: MockUserRepository,
        hasher: MockHasher,
        signer: MockSessionSigner,
        mail: MockMailer,
        providers: ProviderRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                repo: MockUserRepository::new(),
                hasher: MockHasher::new(),
                signer: MockSessionSigner::new(),
                mail: MockMailer::new(),
                providers: ProviderRegistry::new(),
            }
        }

        fn into_service(self) -> AuthnService {
            let repo: Arc<dyn UserRepository> = Arc::new(self.repo);

            AuthnService::new(
                test_config(),
                Arc::new(self.hasher),
                Arc::new(self.signer),
                Arc::new(self.mail),
                self.providers,
                VerificationLedger::new(repo.clone()),
                repo,
            )
        }
    }

    fn signup_input() -> SignupInput {
        SignupInput {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_user_and_sends_verification_mail() {
        let mut f = Fixture::new();
        f.hasher.expect_hash().returning(|_| Ok("$argon2id$hashed".to_string()));
        f.repo.expect_create_local_user().returning(|new_user| {
            Ok(User {
                id: 1,
                username: new_user.username.clone(),
                email: Some(new_user.email.clone()),
                password_hash: Some(new_user.password_hash.clone()),
                avatar_url: None,
                provider: None,
                external_id: None,
                status: UserStatus::PendingVerification,
                created_at: Utc::now(),
            })
        });
        f.repo
            .expect_insert_verification()
            .withf(|v| v.user_id == 1 && !v.consumed)
            .returning(|_| Ok(()));
        f.mail.expect_send().times(1).returning(|_| Ok(()));

        let output = f.into_service().signup(signup_input()).await.unwrap();

        assert!(output.success);
        assert_eq!(output.message, VERIFICATION_MSG);
    }

    #[tokio::test]
    async fn test_signup_rejects_invalid_fields() {
        let service = Fixture::new().into_service();

        let bad_username = SignupInput { username: "".to_string(), ..signup_input() };
        assert!(matches!(service.signup(bad_username).await.unwrap_err(), AppError::Validation(_)));

        let bad_email = SignupInput { email: "not-an-email".to_string(), ..signup_input() };
        assert!(matches!(service.signup(bad_email).await.unwrap_err(), AppError::Validation(_)));

        let bad_password = SignupInput { password: "short".to_string(), ..signup_input() };
        assert!(matches!(service.signup(bad_password).await.unwrap_err(), AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_signup_propagates_duplicate_conflict() {
        let mut f = Fixture::new();
        f.hasher.expect_hash().returning(|_| Ok("$argon2id$hashed".to_string()));
        f.repo
            .expect_create_local_user()
            .returning(|_| Err(AppError::Conflict("A user with this email already exists".to_string())));
        f.mail.expect_send().never();

        let result = f.into_service().signup(signup_input()).await;

        assert!(matches!(result.unwrap_err(), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_verify_requires_both_parameters() {
        let service = Fixture::new().into_service();

        let missing_id = service
            .verify(VerifyInput { user_id: None, token: Some("tok".to_string()) })
            .await;
        assert!(matches!(missing_id.unwrap_err(), AppError::ValidationStr(_)));

        let missing_token = service.verify(VerifyInput { user_id: Some(1), token: None }).await;
        assert!(matches!(missing_token.unwrap_err(), AppError::ValidationStr(_)));
    }

    #[tokio::test]
    async fn test_verify_unknown_user_is_not_found() {
        let mut f = Fixture::new();
        f.repo.expect_find_user_by_id().returning(|_| Ok(None));

        let result = f
            .into_service()
            .verify(VerifyInput { user_id: Some(404), token: Some("tok".to_string()) })
            .await;

        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_signin_failures_are_indistinguishable() {
        // Unknown email
        let mut f = Fixture::new();
        f.repo.expect_find_user_by_email().returning(|_| Ok(None));
        let unknown = f
            .into_service()
            .signin(SigninInput { email: "no@example.com".to_string(), password: "pw".to_string() })
            .await
            .unwrap_err();

        // Account still pending verification
        let mut f = Fixture::new();
        f.repo.expect_find_user_by_email().returning(|_| {
            let mut user = verified_user(1, "alice@example.com");
            user.status = UserStatus::PendingVerification;
            Ok(Some(user))
        });
        let pending = f
            .into_service()
            .signin(SigninInput { email: "alice@example.com".to_string(), password: "pw".to_string() })
            .await
            .unwrap_err();

        // Wrong password
        let mut f = Fixture::new();
        f.repo
            .expect_find_user_by_email()
            .returning(|_| Ok(Some(verified_user(1, "alice@example.com"))));
        f.hasher.expect_verify().returning(|_, _| Ok(false));
        let wrong_password = f
            .into_service()
            .signin(SigninInput { email: "alice@example.com".to_string(), password: "pw".to_string() })
            .await
            .unwrap_err();

        for err in [unknown, pending, wrong_password] {
            match err {
                AppError::InvalidCredentials(msg) => assert_eq!(msg, INVALID_CREDENTIALS_MSG),
                other => panic!("Expected InvalidCredentials, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_signin_normalizes_email_like_signup() {
        let mut f = Fixture::new();
        f.repo
            .expect_find_user_by_email()
            .with(eq("alice@example.com"))
            .returning(|_| Ok(Some(verified_user(1, "alice@example.com"))));
        f.hasher.expect_verify().returning(|_, _| Ok(true));
        f.signer.expect_sign().returning(|_| Ok("tok".to_string()));

        let output = f
            .into_service()
            .signin(SigninInput { email: "Alice@Example.com".to_string(), password: "password123".to_string() })
            .await
            .unwrap();

        assert_eq!(output.token, "tok");
    }

    #[tokio::test]
    async fn test_signin_success_signs_public_profile() {
        let mut f = Fixture::new();
        f.repo
            .expect_find_user_by_email()
            .returning(|_| Ok(Some(verified_user(42, "alice@example.com"))));
        f.hasher.expect_verify().returning(|_, _| Ok(true));
        f.signer
            .expect_sign()
            .withf(|profile| profile.user_id == 42 && profile.username == "alice")
            .returning(|_| Ok("signed.session.token".to_string()));

        let output = f
            .into_service()
            .signin(SigninInput { email: "alice@example.com".to_string(), password: "password123".to_string() })
            .await
            .unwrap();

        assert_eq!(output.token, "signed.session.token");
    }

    #[tokio::test]
    async fn test_authorize_provider_unknown_name() {
        let service = Fixture::new().into_service();

        let result = service
            .authorize_provider(ProviderAuthorizeInput { provider: "github".to_string() })
            .await;

        assert!(matches!(result.unwrap_err(), AppError::OAuth(OAuthError::ProviderNotFound(_))));
    }

    #[tokio::test]
    async fn test_signin_via_provider_success() {
        let mut f = Fixture::new();

        let mut provider = MockOAuthProvider::new();
        provider.expect_exchange_code().returning(|_| {
            Ok(OAuthTokenSet { access_token: "at".to_string(), refresh_token: None, expires_in_secs: None })
        });
        provider.expect_fetch_profile().returning(|_| {
            Ok(ProviderProfile {
                external_id: "123".to_string(),
                display_name: "Alice".to_string(),
                avatar_url: None,
            })
        });
        f.providers.register("google", Arc::new(provider));

        f.repo
            .expect_upsert_provider_user()
            .withf(|provider, profile| provider == "google" && profile.external_id == "123")
            .returning(|_, profile| {
                Ok(User {
                    id: 9,
                    username: profile.display_name.clone(),
                    email: None,
                    password_hash: None,
                    avatar_url: profile.avatar_url.clone(),
                    provider: Some("google".to_string()),
                    external_id: Some(profile.external_id.clone()),
                    status: UserStatus::Verified,
                    created_at: Utc::now(),
                })
            });
        f.signer.expect_sign().returning(|_| Ok("provider.session.token".to_string()));

        let output = f
            .into_service()
            .signin_via_provider(ProviderSigninInput { provider: "google".to_string(), code: "c0de".to_string() })
            .await
            .unwrap();

        assert_eq!(output.token, "provider.session.token");
    }

    #[tokio::test]
    async fn test_signin_via_provider_exchange_failure_mutates_nothing() {
        let mut f = Fixture::new();

        let mut provider = MockOAuthProvider::new();
        provider
            .expect_exchange_code()
            .returning(|_| Err(OAuthError::TokenExchange(502)));
        f.providers.register("google", Arc::new(provider));

        f.repo.expect_upsert_provider_user().never();

        let result = f
            .into_service()
            .signin_via_provider(ProviderSigninInput { provider: "google".to_string(), code: "c0de".to_string() })
            .await;

        assert!(matches!(result.unwrap_err(), AppError::OAuth(OAuthError::TokenExchange(_))));
    }

    /// Full local flow against the in-memory adapter with real hashing and
    /// signing: signup, verify with the issued token, then sign in.
    #[tokio::test]
    async fn test_local_flow_end_to_end() {
        let repo: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());

        let signer = Arc::new(JwtService::new(JwtConfig {
            secret: "end_to_end_secret".to_string(),
            expiry_secs: 3600,
            issuer: "authgate-test".to_string(),
        }));
        let mut mail = MockMailer::new();
        mail.expect_send().returning(|_| Ok(()));

        let service = AuthnService::new(
            test_config(),
            Arc::new(Argon2Hasher::default()),
            signer.clone(),
            Arc::new(mail),
            ProviderRegistry::new(),
            VerificationLedger::new(repo.clone()),
            repo.clone(),
        );

        service.signup(signup_input()).await.unwrap();

        let user = repo.find_user_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(user.status, UserStatus::PendingVerification);

        // Signin before verification fails like bad credentials
        let early = service
            .signin(SigninInput { email: "alice@example.com".to_string(), password: "password123".to_string() })
            .await;
        assert!(matches!(early.unwrap_err(), AppError::InvalidCredentials(_)));

        let issued = repo.find_verification_by_user_id(user.id).await.unwrap().unwrap();
        service
            .verify(VerifyInput { user_id: Some(user.id), token: Some(issued.token.clone()) })
            .await
            .unwrap();

        // The token is single use
        let replay = service
            .verify(VerifyInput { user_id: Some(user.id), token: Some(issued.token) })
            .await;
        assert!(matches!(replay.unwrap_err(), AppError::InvalidToken(_)));

        // Casing differences resolve to the same account
        let output = service
            .signin(SigninInput { email: "Alice@Example.com".to_string(), password: "password123".to_string() })
            .await
            .unwrap();

        let claims = signer.verify(&output.token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "alice");
    }
}
