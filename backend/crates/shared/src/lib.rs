//! Shared Kernel
//!
//! Vocabulary shared by every crate in the workspace:
//! - Unified error type (`AppError`) and its HTTP classification (`ErrorKind`)
//! - sqlx error classification and RFC 7807 rendering (feature-gated)
//! - Typed identifiers
//!
//! Only things with the same meaning in every crate belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
