//! Candidate existence probing.
//!
//! A candidate is an absolute path with no extension assumed. Probing tries,
//! in order:
//! 1. the candidate with each extension appended
//! 2. if it is a directory: the manifest's main fields, then `index.*`
//! 3. the bare candidate as a file
//!
//! Manifest read or parse failures count as "no main field" and never abort
//! probing.

use crate::manifest_cache::ManifestCache;
use crate::trace::{steps, MatchTrace, MatchTraceStep};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tspaths_util::fs::read_to_string_lossy;
use tspaths_util::path::join_normalized;

/// Manifest file read inside candidate directories.
pub const MANIFEST_FILE: &str = "package.json";

/// Extensions the host loader resolves natively, tried after configured ones.
pub const NATIVE_EXTENSIONS: &[&str] = &[".js", ".json", ".node"];

/// Default configured extensions.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".d.ts"];

/// Maximum number of probed paths to record.
pub const MAX_TRIED_PATHS: usize = 20;

/// Filesystem access used by the matcher.
///
/// Every method answers "no" on I/O errors instead of failing.
pub trait FileSystem: Send + Sync + fmt::Debug {
    fn is_file(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Read and parse a JSON file. `None` if missing, unreadable or malformed.
    fn read_json(&self, path: &Path) -> Option<Value>;
}

/// The real filesystem, with an optional manifest cache.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem {
    manifest_cache: Option<Arc<dyn ManifestCache>>,
}

impl RealFileSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cache(cache: Arc<dyn ManifestCache>) -> Self {
        Self {
            manifest_cache: Some(cache),
        }
    }
}

impl FileSystem for RealFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_json(&self, path: &Path) -> Option<Value> {
        if let Some(cache) = &self.manifest_cache {
            if let Some(value) = cache.get(path) {
                return Some(value);
            }
        }

        let content = read_to_string_lossy(path).ok()?;
        let value: Value = serde_json::from_str(&content).ok()?;

        if let Some(cache) = &self.manifest_cache {
            cache.set(path, value.clone());
        }

        Some(value)
    }
}

/// In-memory filesystem for tests and embedding hosts.
///
/// Directories are implied by the files beneath them; empty directories can
/// be added explicitly.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
}

impl MemoryFileSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with the given contents.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.add_file(path, contents);
        self
    }

    /// Add an empty directory.
    #[must_use]
    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirs.insert(path.into());
        self
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        let path = path.into();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
        self.files.insert(path, contents.into());
    }
}

impl FileSystem for MemoryFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    fn read_json(&self, path: &Path) -> Option<Value> {
        serde_json::from_str(self.files.get(path)?).ok()
    }
}

/// Append an extension to a path without replacing an existing one.
///
/// `lib/foo.service` + `.ts` is `lib/foo.service.ts`.
#[must_use]
pub fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(ext);
    PathBuf::from(s)
}

/// State for probing the candidates of one request.
pub(crate) struct Probe<'a> {
    pub fs: &'a dyn FileSystem,
    pub extensions: &'a [String],
    pub main_fields: &'a [String],
    pub tried: &'a mut Vec<PathBuf>,
    pub trace: &'a mut MatchTrace,
}

impl Probe<'_> {
    /// Probe one candidate. Returns the first existing file.
    pub fn candidate(&mut self, candidate: &Path) -> Option<PathBuf> {
        if let Some(found) = self.with_extensions(candidate) {
            return Some(found);
        }

        if self.fs.is_dir(candidate) {
            if let Some(found) = self.directory(candidate) {
                return Some(found);
            }
        }

        self.add_tried(candidate);
        if self.fs.is_file(candidate) {
            self.trace.add_step(
                MatchTraceStep::new(steps::FILE_EXISTS, true, "Candidate exists as a file")
                    .with_path(candidate),
            );
            return Some(candidate.to_path_buf());
        }

        self.trace.add_step(
            MatchTraceStep::new(steps::FILE_EXISTS, false, "Candidate not found")
                .with_path(candidate),
        );
        None
    }

    fn with_extensions(&mut self, base: &Path) -> Option<PathBuf> {
        for ext in self.extensions {
            let with_ext = append_extension(base, ext);
            self.add_tried(&with_ext);
            tracing::trace!(path = %with_ext.display(), "probing");

            if self.fs.is_file(&with_ext) {
                self.trace.add_step(
                    MatchTraceStep::new(
                        steps::PROBE_EXTENSION,
                        true,
                        format!("Found with extension {ext}"),
                    )
                    .with_path(&with_ext),
                );
                return Some(with_ext);
            }
        }
        None
    }

    fn directory(&mut self, dir: &Path) -> Option<PathBuf> {
        let manifest_path = dir.join(MANIFEST_FILE);
        self.add_tried(&manifest_path);

        if let Some(manifest) = self.fs.read_json(&manifest_path) {
            self.trace.add_step(
                MatchTraceStep::new(steps::READ_MANIFEST, true, "Read manifest")
                    .with_path(&manifest_path),
            );
            for field in self.main_fields {
                if let Some(found) = self.main_field(dir, &manifest, field) {
                    return Some(found);
                }
            }
        } else {
            self.trace.add_step(
                MatchTraceStep::new(steps::READ_MANIFEST, false, "No usable manifest")
                    .with_path(&manifest_path),
            );
        }

        self.index(dir)
    }

    fn main_field(&mut self, dir: &Path, manifest: &Value, field: &str) -> Option<PathBuf> {
        let main = match manifest.get(field).and_then(Value::as_str) {
            Some(main) if !main.is_empty() => main,
            _ => {
                self.trace.failure(
                    steps::RESOLVE_MAIN_FIELD,
                    format!("Manifest has no string field {field:?}"),
                );
                return None;
            }
        };

        let main_path = join_normalized(dir, main);
        self.add_tried(&main_path);

        if self.fs.is_file(&main_path) {
            self.trace.add_step(
                MatchTraceStep::new(
                    steps::RESOLVE_MAIN_FIELD,
                    true,
                    format!("Resolved via {field:?}"),
                )
                .with_path(&main_path),
            );
            return Some(main_path);
        }

        if let Some(found) = self.with_extensions(&main_path) {
            return Some(found);
        }

        if self.fs.is_dir(&main_path) {
            if let Some(found) = self.index(&main_path) {
                return Some(found);
            }
        }

        self.trace.add_step(
            MatchTraceStep::new(
                steps::RESOLVE_MAIN_FIELD,
                false,
                format!("Target of {field:?} not found: {main}"),
            )
            .with_path(&main_path),
        );
        None
    }

    fn index(&mut self, dir: &Path) -> Option<PathBuf> {
        let found = self.with_extensions(&dir.join("index"));
        if found.is_none() {
            self.trace.add_step(
                MatchTraceStep::new(steps::RESOLVE_INDEX, false, "No index file")
                    .with_path(dir),
            );
        }
        found
    }

    fn add_tried(&mut self, path: &Path) {
        if self.tried.len() < MAX_TRIED_PATHS {
            self.tried.push(path.to_path_buf());
        }
    }
}
