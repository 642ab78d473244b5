use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStatus {
    PendingVerification,
    Verified,
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserStatus::PendingVerification => "PendingVerification",
            UserStatus::Verified => "Verified",
        };
        write!(f, "{name}")
    }
}

/// A user account. Local accounts carry an email and password hash;
/// provider accounts carry the provider name and the provider's opaque id
/// instead.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub avatar_url: Option<String>,
    pub provider: Option<String>,
    pub external_id: Option<String>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewLocalUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_status_display() {
        assert_eq!(format!("{}", UserStatus::PendingVerification), "PendingVerification");
        assert_eq!(format!("{}", UserStatus::Verified), "Verified");
    }
}
