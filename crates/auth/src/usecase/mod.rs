pub mod authn;
pub mod verification;
