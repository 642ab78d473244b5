use validator::Validate;

// ╔════════════════════════════╗
// ║          Signup            ║
// ╚════════════════════════════╝

#[derive(Debug, Validate)]
pub struct SignupInput {
    #[validate(length(min = 1, message = "username cannot be empty"))]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters long"))]
    pub password: String,
}

#[derive(Debug)]
pub struct SignupOutput {
    pub success: bool,
    pub message: String,
}

// ╔════════════════════════════╗
// ║       Verify Signup        ║
// ╚════════════════════════════╝

/// Both fields arrive as optional query parameters; presence is checked in
/// the use case so each missing parameter reports its own message.
#[derive(Debug)]
pub struct VerifyInput {
    pub user_id: Option<i64>,
    pub token: Option<String>,
}

#[derive(Debug)]
pub struct VerifyOutput {
    pub success: bool,
    pub message: String,
}

// ╔════════════════════════════╗
// ║          Signin            ║
// ╚════════════════════════════╝

#[derive(Debug, Validate)]
pub struct SigninInput {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password cannot be empty"))]
    pub password: String,
}

#[derive(Debug)]
pub struct SigninOutput {
    pub token: String,
}

// ╔════════════════════════════╗
// ║     Provider Authorize     ║
// ╚════════════════════════════╝

#[derive(Debug, Validate)]
pub struct ProviderAuthorizeInput {
    #[validate(length(min = 1, message = "provider cannot be empty"))]
    pub provider: String,
}

#[derive(Debug)]
pub struct ProviderAuthorizeOutput {
    pub url: String,
    pub state: String,
}

// ╔════════════════════════════╗
// ║      Provider Signin       ║
// ╚════════════════════════════╝

#[derive(Debug, Validate)]
pub struct ProviderSigninInput {
    #[validate(length(min = 1, message = "provider cannot be empty"))]
    pub provider: String,

    #[validate(length(min = 1, message = "code cannot be empty"))]
    pub code: String,
}

#[derive(Debug)]
pub struct ProviderSigninOutput {
    pub token: String,
}
