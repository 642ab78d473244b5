mod domain;
mod inbound;
mod outbound;
mod usecase;

use std::sync::Arc;

use app_core::config::Config;
use app_core::jwt::SessionSigner;
use app_core::mail::Mailer;
use app_core::oauth::ProviderRegistry;
use app_core::password::Hasher;
pub use inbound::router::create_router;
pub use outbound::memory::InMemoryUserRepository;
pub use outbound::repository::UserRepository;

use crate::inbound::state::AuthState;
use crate::usecase::authn::AuthnService;
use crate::usecase::verification::VerificationLedger;

pub struct Dependency {
    pub config: Arc<Config>,
    pub hasher: Arc<dyn Hasher>,
    pub signer: Arc<dyn SessionSigner>,
    pub mail: Arc<dyn Mailer>,
    pub providers: ProviderRegistry,
    pub repo: Arc<dyn UserRepository>,
}

pub fn new(dep: Dependency) -> AuthState {
    let ledger = VerificationLedger::new(dep.repo.clone());

    let authn_svc = Arc::new(AuthnService::new(
        dep.config.clone(),
        dep.hasher,
        dep.signer,
        dep.mail,
        dep.providers,
        ledger,
        dep.repo,
    ));

    AuthState::new(dep.config, authn_svc)
}
