use axum::Router;
use axum::routing::get;

use crate::inbound::http::authn::*;
use crate::inbound::state::AuthState;

pub fn create_router(state: AuthState) -> Router {
    Router::new()
        .route("/auth/signup", get(signup_page).post(signup))
        .route("/auth/signup/verify", get(verify_email))
        .route("/auth/signin", get(signin_page).post(signin))
        .route("/auth/signin/{provider}", get(oauth_authorize))
        .route("/auth/signin/{provider}/callback", get(oauth_callback))
        .with_state(state)
}
