use serde::{Deserialize, Serialize};

// ╔════════════════════════════╗
// ║          Signup            ║
// ╚════════════════════════════╝

#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
}

// ╔════════════════════════════╗
// ║       Verify Signup        ║
// ╚════════════════════════════╝

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub user_id: Option<i64>,
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyEmailResponse {
    pub success: bool,
    pub message: String,
}

// ╔════════════════════════════╗
// ║          Signin            ║
// ╚════════════════════════════╝

#[derive(Deserialize)]
pub struct SigninPageQuery {
    pub redirect_uri: Option<String>,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

// ╔════════════════════════════╗
// ║     Provider Callback      ║
// ╚════════════════════════════╝

#[derive(Deserialize)]
pub struct CallbackRequest {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}
