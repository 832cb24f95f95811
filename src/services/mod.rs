//! Business logic layer
//!
//! Services combine the models with the external tools:
//!
//! - `archives`: list, create and delete archives
//! - `grouping`: naming-scheme groups for listings
//! - `mount`: stacked overlay mounts and the unmount sweep

pub mod archives;
pub mod grouping;
pub mod mount;

pub use archives::{ArchiveService, CreateRequest};
pub use grouping::{ArchiveGroups, NamingScheme, OTHERS_GROUP};
pub use mount::{MountService, MountState, UnmountReport};
