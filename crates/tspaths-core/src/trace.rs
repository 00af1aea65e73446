//! Match tracing for `tspaths match --trace`.
//!
//! Records each decision the matcher and probe make, so a user can see why a
//! request resolved to a particular file or fell through.

use serde::Serialize;
use std::path::PathBuf;

/// One decision taken while matching a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchTraceStep {
    /// One of the names in [`steps`].
    pub step: &'static str,
    pub ok: bool,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl MatchTraceStep {
    pub fn new(step: &'static str, ok: bool, detail: impl Into<String>) -> Self {
        Self {
            step,
            ok,
            detail: detail.into(),
            path: None,
            pattern: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

/// Steps in the order they were taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MatchTrace {
    pub steps: Vec<MatchTraceStep>,
}

impl MatchTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, step: MatchTraceStep) {
        self.steps.push(step);
    }

    pub fn success(&mut self, step: &'static str, detail: impl Into<String>) {
        self.steps.push(MatchTraceStep::new(step, true, detail));
    }

    pub fn failure(&mut self, step: &'static str, detail: impl Into<String>) {
        self.steps.push(MatchTraceStep::new(step, false, detail));
    }

    /// Names of the recorded steps, in order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.step).collect()
    }
}

/// Step names, stable across releases for `--json` consumers.
pub mod steps {
    pub const CHECK_REQUEST: &str = "check_request";
    pub const MATCH_PATTERN: &str = "match_pattern";
    pub const EXPAND_CANDIDATE: &str = "expand_candidate";
    pub const PROBE_EXTENSION: &str = "probe_extension";
    pub const READ_MANIFEST: &str = "read_manifest";
    pub const RESOLVE_MAIN_FIELD: &str = "resolve_main_field";
    pub const RESOLVE_INDEX: &str = "resolve_index";
    pub const FILE_EXISTS: &str = "file_exists";
    pub const FINAL_PATH: &str = "final_path";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_records_in_order() {
        let mut trace = MatchTrace::new();
        trace.success(steps::CHECK_REQUEST, "request is a bare specifier");
        trace.add_step(
            MatchTraceStep::new(steps::MATCH_PATTERN, true, "matched")
                .with_pattern("@app/*")
                .with_path("/src/app"),
        );
        trace.failure(steps::FILE_EXISTS, "not a file");

        assert_eq!(
            trace.step_names(),
            vec![steps::CHECK_REQUEST, steps::MATCH_PATTERN, steps::FILE_EXISTS]
        );
        assert_eq!(trace.steps[1].pattern.as_deref(), Some("@app/*"));
        assert!(!trace.steps[2].ok);
    }

    #[test]
    fn test_step_serialization_skips_empty_fields() {
        let step = MatchTraceStep::new(steps::FINAL_PATH, true, "done");
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"step": "final_path", "ok": true, "detail": "done"})
        );
    }
}
