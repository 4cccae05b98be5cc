pub mod session;
pub mod token_grant;
pub mod user;
pub mod verification_key;
