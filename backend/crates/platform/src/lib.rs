//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no business meaning:
//! - Cryptographic helpers (HMAC-SHA256 signing, secure random bytes)
//! - Cookie parsing and `Set-Cookie` construction, including signed values

pub mod cookie;
pub mod crypto;
