//! Syncfix Core - Registry primitives for join-driven resynchronization
//!
//! This crate provides the foundational layer shared by the scheduler and
//! session crates:
//! - Monotonic action handles
//! - The `Action` trait for fix-up operations
//! - The action registry with batch snapshots
//! - Configuration and error types

pub mod action;
pub mod attach;
pub mod config;
pub mod error;
pub mod handle;
pub mod registry;

// Re-export main types for convenience
pub use action::Action;
pub use attach::AttachPoint;
pub use config::SyncConfig;
pub use error::SyncError;
pub use handle::Handle;
pub use registry::ActionRegistry;

/// Common result type used throughout sync-core
pub type Result<T> = std::result::Result<T, SyncError>;
