//! Naming-scheme grouping
//!
//! Archive names built from a creation pattern end in a timestamp. The
//! recognizer accepts any name whose tail is N repetitions of "word
//! characters then one digit", N being the width of the timestamp format,
//! and groups archives by the literal prefix in front of that tail.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::settings::timestamp_width;
use crate::error::{OverlayError, OverlayResult};
use crate::models::pattern::WILDCARD;
use crate::models::Archive;

/// Group holding names that follow no timestamp scheme
pub const OTHERS_GROUP: &str = "others";

/// Width of the default `%Y%m%d%H%M%S` timestamp
pub const DEFAULT_TIMESTAMP_WIDTH: usize = 14;

static DEFAULT_SCHEME: Lazy<NamingScheme> = Lazy::new(|| {
    NamingScheme::new(DEFAULT_TIMESTAMP_WIDTH).expect("default naming scheme regex is valid")
});

/// Recognizer for `<prefix><timestamp>` archive names
#[derive(Debug, Clone)]
pub struct NamingScheme {
    width: usize,
    regex: Regex,
}

impl NamingScheme {
    /// Build a recognizer for timestamps `width` characters long
    pub fn new(width: usize) -> OverlayResult<Self> {
        if width == 0 {
            return Err(OverlayError::Config(
                "Timestamp width must be at least one character".into(),
            ));
        }

        let regex = Regex::new(&format!(r"^(.*)(?:\w*\d){{{}}}$", width))
            .map_err(|e| OverlayError::Config(format!("Invalid naming scheme: {}", e)))?;

        Ok(Self { width, regex })
    }

    /// Build a recognizer sized by a strftime timestamp format
    pub fn for_format(format: &str) -> OverlayResult<Self> {
        let width = timestamp_width(format)?;
        if width == DEFAULT_TIMESTAMP_WIDTH {
            return Ok(Self::default_scheme().clone());
        }
        Self::new(width)
    }

    /// The shared recognizer for 14-digit timestamps
    pub fn default_scheme() -> &'static NamingScheme {
        &DEFAULT_SCHEME
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Group key for a name: its prefix plus `*`, or `None` if off-scheme
    pub fn group_key(&self, name: &str) -> Option<String> {
        self.regex
            .captures(name)
            .and_then(|caps| caps.get(1))
            .map(|prefix| format!("{}{}", prefix.as_str(), WILDCARD))
    }

    /// Partition archives by naming scheme
    ///
    /// Groups appear in the order their first archive appears, and each
    /// group keeps the input order of its archives.
    pub fn group(&self, archives: &[Archive]) -> ArchiveGroups {
        let mut groups = ArchiveGroups::default();
        for archive in archives {
            let key = self
                .group_key(&archive.name)
                .unwrap_or_else(|| OTHERS_GROUP.to_string());
            groups.push(key, archive.clone());
        }
        groups
    }
}

/// Archives grouped by naming scheme, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct ArchiveGroups {
    groups: Vec<(String, Vec<Archive>)>,
    index: HashMap<String, usize>,
}

impl ArchiveGroups {
    fn push(&mut self, key: String, archive: Archive) {
        match self.index.get(&key) {
            Some(&i) => self.groups[i].1.push(archive),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push((key, vec![archive]));
            }
        }
    }

    /// Archives in one group
    pub fn get(&self, key: &str) -> Option<&[Archive]> {
        self.index.get(key).map(|&i| self.groups[i].1.as_slice())
    }

    /// Group keys in first-seen order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Archive])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of archives across all groups
    pub fn archive_count(&self) -> usize {
        self.groups.iter().map(|(_, v)| v.len()).sum()
    }
}

impl Serialize for ArchiveGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (key, archives) in &self.groups {
            map.serialize_entry(key, archives)?;
        }
        map.end()
    }
}
