//! Application Layer
//!
//! Token validation, session lifecycle and the flows composed from them.

pub mod config;
pub mod orchestrator;
pub mod session_lifecycle;
pub mod token_validator;

// Re-exports
pub use config::{GatePolicy, SessionConfig, SsoConfig};
pub use orchestrator::{AuthOrchestrator, CallbackInput};
pub use session_lifecycle::{AttachedSession, SessionManager};
pub use token_validator::{TokenValidator, VerifiedClaims};
