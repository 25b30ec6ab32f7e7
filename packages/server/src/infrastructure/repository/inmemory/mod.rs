//! インメモリ Repository 実装

pub mod name;
pub mod session;

pub use name::{InMemoryNameRepository, NameEntry};
pub use session::InMemorySessionRepository;
