//! External tool layer
//!
//! - `runner`: the `CommandRunner` seam and the real process runner
//! - `borg`: list/create/delete/mount against a borg repository
//! - `fuse`: overlay composition, mount-point queries and unmounting

pub mod borg;
pub mod fuse;
pub mod runner;

pub use borg::Borg;
pub use fuse::{MountTable, Overlay};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
