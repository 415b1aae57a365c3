//! Companion Core Library
//!
//! This crate provides the domain models, error types, configuration, session context
//! and input validation shared by every Companion component.

pub mod config;
pub mod constants;
pub mod database_backend;
pub mod error;
pub mod models;
pub mod session;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use database_backend::DatabaseBackend;
pub use error::{AppError, AppResult, ErrorMetadata, LogLevel};
pub use session::SessionContext;
