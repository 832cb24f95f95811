//! Archive display formatting
//!
//! Formats archive listings, mount plans and unmount results for the
//! terminal.

use crate::models::{Archive, MountPlan};
use crate::services::{ArchiveGroups, UnmountReport};

/// Format archives as a tree grouped by naming scheme
pub fn format_archive_groups(groups: &ArchiveGroups) -> String {
    if groups.is_empty() {
        return "No archives found.\n".to_string();
    }

    let name_width = groups
        .iter()
        .flat_map(|(_, archives)| archives.iter())
        .map(|a| a.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();

    for (i, (key, archives)) in groups.iter().enumerate() {
        // Group header
        let noun = if archives.len() == 1 { "archive" } else { "archives" };
        output.push_str(&format!("{} ({} {})\n", key, archives.len(), noun));

        for (j, archive) in archives.iter().enumerate() {
            let is_last = j == archives.len() - 1;
            let prefix = if is_last { "└── " } else { "├── " };

            output.push_str(&format!(
                "  {}{:<name_width$}  {}  {}\n",
                prefix,
                archive.name,
                archive.start,
                archive.short_id(),
                name_width = name_width,
            ));
        }

        // Blank line between groups
        if i < groups.len() - 1 {
            output.push('\n');
        }
    }

    output
}

/// Format archives as a plain table, one per line
pub fn format_archive_list(archives: &[Archive]) -> String {
    if archives.is_empty() {
        return "No archives found.\n".to_string();
    }

    let name_width = archives
        .iter()
        .map(|a| a.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<26}  {}\n",
        "Name",
        "Start",
        "ID",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<26}  {:-<12}\n",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for archive in archives {
        output.push_str(&format!(
            "{:<name_width$}  {:<26}  {}\n",
            archive.name,
            archive.start,
            archive.short_id(),
            name_width = name_width,
        ));
    }

    output
}

/// Describe a mount plan, topmost layer first
pub fn format_mount_plan(plan: &MountPlan) -> String {
    if plan.is_empty() {
        return "No archives match; nothing was mounted.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!("Merged view: {}\n", plan.merged_dir.display()));
    output.push_str(&format!("Layers ({}, newest on top):\n", plan.layers.len()));

    for (i, layer) in plan.layers.iter().rev().enumerate() {
        output.push_str(&format!(
            "  {:>2}. {}  ->  {}\n",
            i + 1,
            layer.name,
            layer.mount_point.display()
        ));
    }

    output
}

/// Summarize an unmount pass
pub fn format_unmount_report(report: &UnmountReport) -> String {
    let mut output = String::new();

    for path in &report.unmounted {
        output.push_str(&format!("Unmounted {}\n", path.display()));
    }
    for path in &report.failed {
        output.push_str(&format!("Failed to unmount {}\n", path.display()));
    }

    output.push_str(&format!(
        "{} unmounted, {} failed, {} checked\n",
        report.unmounted.len(),
        report.failed.len(),
        report.checked
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::NamingScheme;
    use std::path::{Path, PathBuf};

    fn archives() -> Vec<Archive> {
        vec![
            Archive::new("home20240101000000", "aaaaaaaaaaaaaaaa", "2024-01-01T00:00:00"),
            Archive::new("manual", "bbbb", "2024-01-05T00:00:00"),
            Archive::new("home20240201000000", "cccc", "2024-02-01T00:00:00"),
        ]
    }

    #[test]
    fn test_format_groups() {
        let groups = NamingScheme::default_scheme().group(&archives());
        let out = format_archive_groups(&groups);

        assert!(out.starts_with("home* (2 archives)\n"));
        assert!(out.contains("├── home20240101000000"));
        assert!(out.contains("└── home20240201000000"));
        assert!(out.contains("others (1 archive)\n"));
        assert!(out.contains("aaaaaaaaaaaa\n"));
        assert!(!out.contains("aaaaaaaaaaaaa"));
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(
            format_archive_groups(&ArchiveGroups::default()),
            "No archives found.\n"
        );
        assert_eq!(format_archive_list(&[]), "No archives found.\n");
    }

    #[test]
    fn test_format_list() {
        let out = format_archive_list(&archives());
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Name"));
        assert!(lines[2].starts_with("home20240101000000"));
    }

    #[test]
    fn test_format_plan_newest_first() {
        let plan = MountPlan::new(Path::new("/mnt"), "/data/repo", None, &archives()).unwrap();
        let out = format_mount_plan(&plan);
        let first = out.find("home20240201000000").unwrap();
        let last = out.find("home20240101000000").unwrap();
        assert!(first < last);
        assert!(out.contains("Merged view: /mnt/merged-repo-"));
    }

    #[test]
    fn test_format_unmount_report() {
        let report = UnmountReport {
            checked: 3,
            unmounted: vec![PathBuf::from("/mnt/merged-repo-home")],
            failed: Vec::new(),
        };
        let out = format_unmount_report(&report);
        assert!(out.contains("Unmounted /mnt/merged-repo-home\n"));
        assert!(out.ends_with("1 unmounted, 0 failed, 3 checked\n"));
    }
}
