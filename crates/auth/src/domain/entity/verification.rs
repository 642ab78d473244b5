/// A signup verification token. At most one live (unconsumed) token exists
/// per user; a consumed token never verifies again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken {
    pub user_id: i64,
    pub token: String,
    pub consumed: bool,
}
