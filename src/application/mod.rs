//! Application layer - Use cases
//!
//! This layer contains:
//! - Services: command registry and the launcher reply
//! - Errors: Domain-specific errors
//! - Messaging: Message parsing and dispatching

pub mod errors;
pub mod services;
pub mod messaging;
