//! Mapping normalization.
//!
//! Turns a raw `pattern -> [target]` mapping into absolute entries ordered by
//! specificity: longest literal prefix first, match-all last. Ties keep their
//! declaration order.

use crate::config::PathMapping;
use crate::error::Error;
use serde::Serialize;
use std::cmp::Reverse;
use std::path::{Path, PathBuf};
use tspaths_util::path::{is_rooted, join_normalized, normalize as normalize_path};

/// The universal pattern.
pub const MATCH_ALL: &str = "*";

/// A pattern and its absolute target templates, tried in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingEntry {
    pattern: String,
    paths: Vec<PathBuf>,
}

impl MappingEntry {
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Literal text before the wildcard, or the whole pattern without one.
    #[must_use]
    pub fn prefix(&self) -> &str {
        pattern_prefix(&self.pattern)
    }

    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.pattern == MATCH_ALL
    }

    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.pattern.contains('*')
    }
}

/// Entries in matching priority order. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NormalizedMapping {
    entries: Vec<MappingEntry>,
}

impl NormalizedMapping {
    #[must_use]
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MappingEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Back to the raw form, keeping priority order.
    #[must_use]
    pub fn to_path_mapping(&self) -> PathMapping {
        self.entries
            .iter()
            .map(|entry| {
                let paths = entry
                    .paths
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect();
                (entry.pattern.clone(), paths)
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a NormalizedMapping {
    type Item = &'a MappingEntry;
    type IntoIter = std::slice::Iter<'a, MappingEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn pattern_prefix(pattern: &str) -> &str {
    pattern.find('*').map_or(pattern, |star| &pattern[..star])
}

/// Normalize a raw mapping against `base_url`.
///
/// Relative targets are joined onto `base_url`; rooted targets are kept.
/// When `add_match_all` is set and no `"*"` pattern was declared, a
/// `"*" -> [base_url/*]` entry is appended last.
///
/// # Errors
/// Returns [`Error::InvalidPattern`] for an empty pattern or one with more
/// than one `*`, and [`Error::InvalidTarget`] for an empty target list or a
/// target with more than one `*`.
pub fn normalize(
    base_url: &Path,
    raw: &PathMapping,
    add_match_all: bool,
) -> Result<NormalizedMapping, Error> {
    let mut entries = Vec::with_capacity(raw.len() + 1);

    for (pattern, targets) in raw {
        validate_pattern(pattern)?;
        if targets.is_empty() {
            return Err(Error::InvalidTarget {
                pattern: pattern.clone(),
                reason: "no target paths".to_string(),
            });
        }

        let mut paths = Vec::with_capacity(targets.len());
        for target in targets {
            if target.matches('*').count() > 1 {
                return Err(Error::InvalidTarget {
                    pattern: pattern.clone(),
                    reason: format!("{target:?} has more than one '*'"),
                });
            }
            paths.push(absolutize(base_url, target));
        }

        entries.push(MappingEntry {
            pattern: pattern.clone(),
            paths,
        });
    }

    // `sort_by_key` is stable: equal prefix lengths keep declaration order.
    entries.sort_by_key(|entry| Reverse(entry.prefix().len()));

    if add_match_all && !raw.contains_key(MATCH_ALL) {
        entries.push(MappingEntry {
            pattern: MATCH_ALL.to_string(),
            paths: vec![join_normalized(base_url, MATCH_ALL)],
        });
    }

    Ok(NormalizedMapping { entries })
}

fn validate_pattern(pattern: &str) -> Result<(), Error> {
    if pattern.is_empty() {
        return Err(Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "pattern is empty".to_string(),
        });
    }
    if pattern.matches('*').count() > 1 {
        return Err(Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "at most one '*' is allowed".to_string(),
        });
    }
    Ok(())
}

fn absolutize(base_url: &Path, target: &str) -> PathBuf {
    if is_rooted(target) {
        normalize_path(Path::new(target))
    } else {
        join_normalized(base_url, target)
    }
}
