//! Join-driven resynchronization for Syncfix
//!
//! This crate provides:
//! - A timer abstraction with tokio and virtual-clock implementations
//! - The join-debounced batch scheduler (fixed delay from the first join)
//! - The attachment auto-sync toggle built on top of it

pub mod autosync;
pub mod debounce;
pub mod timer;

pub use autosync::{Attachment, AttachmentHost, AttachmentResync, AutoSync};
pub use debounce::{BatchReport, JoinScheduler, SchedulerStats};
pub use timer::{Callback, ManualTimer, Timer, TokioTimer};
