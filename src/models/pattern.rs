//! Archive patterns and `REPO::PATTERN` arguments
//!
//! Patterns are shell globs matched against whole archive names. The `:`
//! character is reserved: it separates repository from archive and it is
//! the layer separator of the overlay tool's lowerdir option.

use std::fmt::{self, Write};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use glob::{MatchOptions, Pattern};

use crate::error::{OverlayError, OverlayResult};

/// Separator between repository path and archive name
pub const SEPARATOR: &str = "::";

/// Character that may never appear in an archive pattern
pub const RESERVED_CHAR: char = ':';

/// Wildcard expanded to a timestamp when creating archives
pub const WILDCARD: char = '*';

const GLOB_META: [char; 4] = ['*', '?', '[', ']'];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A validated archive name pattern
#[derive(Debug, Clone)]
pub struct ArchivePattern {
    raw: String,
    glob: Pattern,
}

impl ArchivePattern {
    /// Parse a pattern, rejecting the reserved separator and malformed globs
    pub fn parse(raw: &str) -> OverlayResult<Self> {
        if raw.contains(RESERVED_CHAR) {
            return Err(OverlayError::invalid_pattern(
                raw,
                format!("must not contain '{}'", RESERVED_CHAR),
            ));
        }

        let glob = Pattern::new(&collapse_wildcards(raw))
            .map_err(|e| OverlayError::invalid_pattern(raw, e.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            glob,
        })
    }

    /// The pattern as typed
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whole-name, case-sensitive glob match
    pub fn matches(&self, name: &str) -> bool {
        self.glob.matches_with(name, MATCH_OPTIONS)
    }

    /// The pattern with the separator and wildcard markers removed
    pub fn sanitized(&self) -> String {
        sanitize(&self.raw)
    }

    /// Check that the pattern can name a new archive
    ///
    /// A creation pattern holds exactly one `*`, as its final character, and
    /// no other glob metacharacter.
    pub fn validate_for_create(&self) -> OverlayResult<()> {
        let wildcards = self.raw.matches(WILDCARD).count();
        if wildcards == 0 {
            return Err(OverlayError::invalid_pattern(
                &self.raw,
                "a creation pattern must end with '*'",
            ));
        }
        if wildcards > 1 || !self.raw.ends_with(WILDCARD) {
            return Err(OverlayError::invalid_pattern(
                &self.raw,
                "a creation pattern must contain a single '*' as its last character",
            ));
        }

        let prefix = self.creation_prefix();
        if let Some(c) = prefix.chars().find(|c| GLOB_META.contains(c)) {
            return Err(OverlayError::invalid_pattern(
                &self.raw,
                format!("'{}' is not allowed in a creation pattern", c),
            ));
        }
        if prefix.contains('/') {
            return Err(OverlayError::invalid_pattern(
                &self.raw,
                "archive names cannot contain '/'",
            ));
        }

        Ok(())
    }

    /// Expand the wildcard to `now` rendered with `timestamp_format`
    ///
    /// # Errors
    ///
    /// Returns a config error if `timestamp_format` holds an unknown
    /// specifier.
    pub fn expand(&self, now: DateTime<Utc>, timestamp_format: &str) -> OverlayResult<String> {
        self.validate_for_create()?;

        let mut name = self.creation_prefix().to_string();
        write!(name, "{}", now.format(timestamp_format)).map_err(|_| {
            OverlayError::Config(format!("Invalid timestamp format '{}'", timestamp_format))
        })?;
        Ok(name)
    }

    fn creation_prefix(&self) -> &str {
        self.raw.strip_suffix(WILDCARD).unwrap_or(&self.raw)
    }
}

impl fmt::Display for ArchivePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Fold runs of `*` into one
///
/// In a shell glob `**` means the same as `*`, but the glob crate reads it
/// as a recursive path wildcard and rejects it inside a name.
fn collapse_wildcards(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == WILDCARD && out.ends_with(WILDCARD) {
            continue;
        }
        out.push(c);
    }
    out
}

/// Decide whether `name` belongs to the selection described by `pattern`
///
/// Without a pattern only the empty name would match, so callers always
/// pass one in normal flow.
pub fn matches(name: &str, pattern: Option<&ArchivePattern>) -> bool {
    match pattern {
        Some(pattern) => pattern.matches(name),
        None => name.is_empty(),
    }
}

/// Strip the separator character and wildcard markers from a pattern
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != RESERVED_CHAR && *c != '*' && *c != '?')
        .collect()
}

/// A `REPO::PATTERN` command-line argument
#[derive(Debug, Clone)]
pub struct RepoPattern {
    /// Repository path or URL
    pub repository: String,
    /// Archive pattern, absent when the argument had no `::` part
    pub pattern: Option<ArchivePattern>,
}

impl RepoPattern {
    /// Split on the first `::`; an empty pattern counts as absent
    pub fn parse(arg: &str) -> OverlayResult<Self> {
        let (repository, pattern) = match arg.split_once(SEPARATOR) {
            Some((repo, pattern)) => (repo, Some(pattern)),
            None => (arg, None),
        };

        if repository.is_empty() {
            return Err(OverlayError::Validation(format!(
                "Missing repository path in '{}'",
                arg
            )));
        }

        let pattern = match pattern {
            Some(p) if !p.is_empty() => Some(ArchivePattern::parse(p)?),
            _ => None,
        };

        Ok(Self {
            repository: repository.to_string(),
            pattern,
        })
    }

    /// The pattern as typed, or "" when absent
    pub fn pattern_str(&self) -> &str {
        self.pattern.as_ref().map_or("", |p| p.as_str())
    }

    /// `REPO::NAME` for one archive in this repository
    pub fn spec_for(&self, name: &str) -> String {
        archive_spec(&self.repository, name)
    }
}

impl FromStr for RepoPattern {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Fully-qualified archive specifier
pub fn archive_spec(repository: &str, name: &str) -> String {
    format!("{}{}{}", repository, SEPARATOR, name)
}
