//! # Axum Helpers
//!
//! Utilities and helpers shared by the HTTP services in this workspace.
//!
//! ## Modules
//!
//! - **[`errors`]**: Structured error responses (`AppError`, `ErrorResponse`)
//! - **[`extractors`]**: Custom extractors (UUID path, validated JSON)
//! - **[`server`]**: Router assembly, health endpoint, graceful shutdown

pub mod errors;
pub mod extractors;
pub mod server;

// Re-export error types
pub use errors::{AppError, ErrorResponse};

// Re-export extractors
pub use extractors::{UuidPath, ValidatedJson};

// Re-export server helpers
pub use server::{create_app, create_router, health_router, shutdown_signal, HealthResponse};
