//! Domain layer - Core types with no external dependencies
//!
//! This layer contains:
//! - Entities: inbound messages, outgoing replies, commands
//! - Traits: the messaging platform abstraction (Bot)

pub mod entities;
pub mod traits;
