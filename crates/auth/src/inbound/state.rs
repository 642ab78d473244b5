use std::sync::Arc;

use app_core::config::Config;

use crate::usecase::authn::AuthnUseCase;

#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<Config>,
    pub authn: Arc<dyn AuthnUseCase>,
}

impl AuthState {
    pub fn new(config: Arc<Config>, authn: Arc<dyn AuthnUseCase>) -> Self {
        Self { config, authn }
    }
}

#[cfg(test)]
mod tests {
    use app_core::config::test_utils::TestConfigBuilder;

    use super::*;
    use crate::usecase::authn::MockAuthnUseCase;

    #[test]
    fn test_auth_state_new() {
        let authn: Arc<dyn AuthnUseCase> = Arc::new(MockAuthnUseCase::new());
        let config = Arc::new(TestConfigBuilder::new().build());

        let state = AuthState::new(config.clone(), authn.clone());

        assert!(Arc::ptr_eq(&state.authn, &authn));
        assert!(Arc::ptr_eq(&state.config, &config));
    }
}
