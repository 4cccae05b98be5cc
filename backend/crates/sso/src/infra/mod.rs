//! Infrastructure Layer
//!
//! Backend and session-store implementations of the domain traits.

pub mod failover;
pub mod memory;
pub mod postgres;
pub mod redis;

pub use failover::FailoverRepository;
pub use memory::MemorySessionStore;
pub use postgres::PgSsoRepository;
pub use self::redis::RedisSessionStore;
