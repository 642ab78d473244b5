pub mod config;
pub mod error;
pub mod extractors;
pub mod jwt;
pub mod mail;
pub mod middleware;
pub mod oauth;
pub mod password;
pub mod redirect;
pub mod rejection;
pub mod session;
pub mod url_builder;
