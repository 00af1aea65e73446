//! Path matching against a normalized mapping.
//!
//! The first entry whose pattern matches the request owns it: each of that
//! entry's targets is expanded with the wildcard capture and probed in order,
//! and a miss on all of them is a miss for the request. Lower-priority
//! entries are never consulted once one has matched.

use crate::config::LoadedConfig;
use crate::error::Error;
use crate::manifest_cache::StampedManifestCache;
use crate::mapping::{normalize, MappingEntry, NormalizedMapping, MATCH_ALL};
use crate::probe::{FileSystem, Probe, RealFileSystem, DEFAULT_EXTENSIONS, NATIVE_EXTENSIONS};
use crate::trace::{steps, MatchTrace, MatchTraceStep};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tspaths_util::path::{is_absolute_specifier, normalize as normalize_path};

/// Per-call overrides for [`MatchPath::match_path_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions<'a> {
    /// Replaces the matcher's main fields for this call.
    pub main_fields: Option<&'a [String]>,
    /// Tried before the matcher's configured extensions.
    pub extensions: Option<&'a [String]>,
    /// Replaces the matcher's filesystem for this call.
    pub file_system: Option<&'a dyn FileSystem>,
}

/// Full result of matching one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchOutcome {
    pub request: String,
    /// The first candidate that exists, if any.
    pub resolved: Option<PathBuf>,
    /// The pattern that claimed the request.
    pub pattern: Option<String>,
    /// Expanded target templates, in probe order.
    pub candidates: Vec<PathBuf>,
    /// Probed paths (capped).
    pub tried: Vec<PathBuf>,
    pub trace: MatchTrace,
}

/// Matches module requests against declared path aliases.
///
/// Read-only after construction, so one instance can serve concurrent
/// lookups.
#[derive(Debug, Clone)]
pub struct MatchPath {
    absolute_base_url: PathBuf,
    mapping: NormalizedMapping,
    main_fields: Vec<String>,
    extensions: Vec<String>,
    fs: Arc<dyn FileSystem>,
}

impl MatchPath {
    /// Create a matcher over the real filesystem with the default extensions.
    ///
    /// Parsed manifests are cached for the matcher's lifetime and re-read
    /// when a manifest's mtime or size changes.
    #[must_use]
    pub fn new(
        absolute_base_url: impl Into<PathBuf>,
        mapping: NormalizedMapping,
        main_fields: Vec<String>,
    ) -> Self {
        Self {
            absolute_base_url: absolute_base_url.into(),
            mapping,
            main_fields,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
            fs: Arc::new(RealFileSystem::with_cache(Arc::new(
                StampedManifestCache::new(),
            ))),
        }
    }

    /// Normalize a loaded configuration and build a matcher for it.
    pub fn from_config(config: &LoadedConfig) -> Result<Self, Error> {
        let mapping = normalize(
            &config.absolute_base_url,
            &config.paths,
            config.add_match_all,
        )?;
        let matcher = Self::new(
            config.absolute_base_url.clone(),
            mapping,
            config.main_fields.clone(),
        );
        if config.extensions.is_empty() {
            Ok(matcher)
        } else {
            Ok(matcher.with_extensions(config.extensions.clone()))
        }
    }

    /// Replace the configured extensions (native ones are always tried after).
    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    #[must_use]
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Path {
        &self.absolute_base_url
    }

    #[must_use]
    pub fn mapping(&self) -> &NormalizedMapping {
        &self.mapping
    }

    #[must_use]
    pub fn main_fields(&self) -> &[String] {
        &self.main_fields
    }

    /// Resolve `request` through the aliases, or `None` to defer to the
    /// host's own resolution.
    #[must_use]
    pub fn match_path(&self, request: &str) -> Option<PathBuf> {
        self.match_path_with(request, &MatchOptions::default())
    }

    #[must_use]
    pub fn match_path_with(&self, request: &str, options: &MatchOptions<'_>) -> Option<PathBuf> {
        self.explain(request, options).resolved
    }

    /// Match `request` and report every step taken.
    #[must_use]
    pub fn explain(&self, request: &str, options: &MatchOptions<'_>) -> MatchOutcome {
        let mut outcome = MatchOutcome {
            request: request.to_string(),
            ..MatchOutcome::default()
        };

        if !is_aliasable(request) {
            outcome.trace.failure(
                steps::CHECK_REQUEST,
                "Request is empty, relative or absolute; aliases do not apply",
            );
            return outcome;
        }
        outcome
            .trace
            .success(steps::CHECK_REQUEST, "Request is a bare specifier");

        let Some((entry, capture)) = self.find_entry(request) else {
            outcome
                .trace
                .failure(steps::MATCH_PATTERN, "No alias pattern matches");
            return outcome;
        };
        tracing::debug!(request, pattern = entry.pattern(), capture, "alias pattern matched");
        outcome.trace.add_step(
            MatchTraceStep::new(
                steps::MATCH_PATTERN,
                true,
                format!("Matched with capture {capture:?}"),
            )
            .with_pattern(entry.pattern()),
        );
        outcome.pattern = Some(entry.pattern().to_string());

        let extensions = self.extension_list(options.extensions);
        let main_fields = options.main_fields.unwrap_or(self.main_fields.as_slice());
        let fs = options.file_system.unwrap_or(&*self.fs);

        let mut probe = Probe {
            fs,
            extensions: &extensions,
            main_fields,
            tried: &mut outcome.tried,
            trace: &mut outcome.trace,
        };

        for template in entry.paths() {
            let candidate = substitute(template, capture);
            probe.trace.add_step(
                MatchTraceStep::new(steps::EXPAND_CANDIDATE, true, "Expanded target")
                    .with_path(&candidate)
                    .with_pattern(entry.pattern()),
            );
            outcome.candidates.push(candidate.clone());

            if let Some(found) = probe.candidate(&candidate) {
                probe.trace.add_step(
                    MatchTraceStep::new(steps::FINAL_PATH, true, "Alias resolved")
                        .with_path(&found),
                );
                outcome.resolved = Some(found);
                return outcome;
            }
        }

        outcome
    }

    fn find_entry<'r>(&self, request: &'r str) -> Option<(&MappingEntry, &'r str)> {
        self.mapping.iter().find_map(|entry| {
            match_pattern(entry.pattern(), request).map(|capture| (entry, capture))
        })
    }

    /// Per-call extras, then configured, then native; duplicates dropped.
    fn extension_list(&self, extra: Option<&[String]>) -> Vec<String> {
        let mut list: Vec<String> = Vec::new();
        let configured = self.extensions.iter().map(String::as_str);
        let native = NATIVE_EXTENSIONS.iter().copied();
        for ext in extra
            .unwrap_or_default()
            .iter()
            .map(String::as_str)
            .chain(configured)
            .chain(native)
        {
            if !list.iter().any(|e| e == ext) {
                list.push(ext.to_string());
            }
        }
        list
    }
}

/// Whether aliases may apply to `request` at all.
fn is_aliasable(request: &str) -> bool {
    !request.is_empty() && !request.starts_with('.') && !is_absolute_specifier(request)
}

/// Match `request` against one pattern, returning the wildcard capture.
///
/// - `"*"` captures the whole request.
/// - `prefix*suffix` needs a non-empty capture between prefix and suffix.
/// - A pattern without `*` must equal the request; the capture is empty.
#[must_use]
pub fn match_pattern<'r>(pattern: &str, request: &'r str) -> Option<&'r str> {
    if pattern == MATCH_ALL {
        return Some(request);
    }

    let Some(star) = pattern.find('*') else {
        return (pattern == request).then_some("");
    };

    let prefix = &pattern[..star];
    let suffix = &pattern[star + 1..];

    if request.len() <= prefix.len() + suffix.len()
        || !request.starts_with(prefix)
        || !request.ends_with(suffix)
    {
        return None;
    }

    Some(&request[prefix.len()..request.len() - suffix.len()])
}

/// Put `capture` in place of the template's `*`.
fn substitute(template: &Path, capture: &str) -> PathBuf {
    match template.to_str() {
        Some(t) if t.contains('*') => normalize_path(Path::new(&t.replacen('*', capture, 1))),
        _ => template.to_path_buf(),
    }
}
