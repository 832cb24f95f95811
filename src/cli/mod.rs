//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod archive;
pub mod mount;

pub use archive::{
    handle_create_command, handle_delete_command, handle_list_command, CreateArgs, DeleteArgs,
    ListArgs,
};
pub use mount::{handle_mount_command, handle_umount_command, MountArgs, UmountArgs};
