//! Application services

pub mod command_service;
pub mod launcher;

pub use command_service::CommandService;
