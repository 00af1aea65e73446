//! `tspaths match` command implementation.

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::Path;
use tspaths_core::{Config, MatchOptions, MatchOutcome, MatchPath, OUTCOME_SCHEMA_VERSION};

/// Exit code when no alias resolves the request.
const EXIT_NO_MATCH: i32 = 1;

#[derive(Serialize)]
struct MatchReport<'a> {
    schema_version: u32,
    #[serde(flatten)]
    outcome: &'a MatchOutcome,
}

/// Run the match command.
///
/// Prints the resolved path (or the full outcome as JSON) and exits with
/// [`EXIT_NO_MATCH`] when nothing resolved.
pub fn run(
    config: &Config,
    file: &Path,
    request: &str,
    main_fields: &[String],
    extensions: &[String],
    trace: bool,
) -> Result<()> {
    let loaded = super::load_config(&config.cwd, file)?;
    let matcher = MatchPath::from_config(&loaded).into_diagnostic()?;

    let options = MatchOptions {
        main_fields: (!main_fields.is_empty()).then_some(main_fields),
        extensions: (!extensions.is_empty()).then_some(extensions),
        file_system: None,
    };
    let outcome = matcher.explain(request, &options);
    tracing::debug!(request, resolved = ?outcome.resolved, "match finished");

    if config.json_logs {
        let report = MatchReport {
            schema_version: OUTCOME_SCHEMA_VERSION,
            outcome: &outcome,
        };
        let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
        println!("{json}");
    } else {
        print_human(&outcome, trace);
    }

    if outcome.resolved.is_none() {
        std::process::exit(EXIT_NO_MATCH);
    }
    Ok(())
}

fn print_human(outcome: &MatchOutcome, trace: bool) {
    if trace {
        for step in &outcome.trace.steps {
            let mark = if step.ok { "ok" } else { "--" };
            match &step.path {
                Some(path) => println!(
                    "  [{mark}] {}: {} ({})",
                    step.step,
                    step.detail,
                    path.display()
                ),
                None => println!("  [{mark}] {}: {}", step.step, step.detail),
            }
        }
    }

    match &outcome.resolved {
        Some(path) => println!("{}", path.display()),
        None => eprintln!("No alias resolves '{}'", outcome.request),
    }
}
