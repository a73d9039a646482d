//! Session state for the hat try-on and scoreboard apps
//!
//! This crate provides:
//! - Hat catalogs (JSON, ordered) and menu layout
//! - Per-session hat state with move/size commands
//! - A single-scorekeeper basketball scoreboard
//! - The `Stage` engine trait and an in-memory implementation

pub mod catalog;
pub mod command;
pub mod error;
pub mod hats;
pub mod scoreboard;
pub mod stage;

// Re-exports
pub use catalog::{Controls, HatCatalog, HatDescriptor, MenuEntry};
pub use command::HatCommand;
pub use error::{Result, SessionError};
pub use hats::{HatSession, Selection, WornHat};
pub use scoreboard::{ScoreBoard, Team};
pub use stage::{ActorId, MemoryStage, Placement, Stage, UserId, Vec3};
