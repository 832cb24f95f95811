//! Display formatting for terminal output
//!
//! Provides utilities for formatting archives, mount plans and unmount
//! results for terminal display.

pub mod archive;

pub use archive::{
    format_archive_groups, format_archive_list, format_mount_plan, format_unmount_report,
};
