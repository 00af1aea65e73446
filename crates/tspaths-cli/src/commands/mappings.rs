//! `tspaths mappings` command implementation.

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::Path;
use tspaths_core::{normalize, Config, NormalizedMapping, OUTCOME_SCHEMA_VERSION};

#[derive(Serialize)]
struct MappingsReport<'a> {
    schema_version: u32,
    base_url: &'a Path,
    mappings: &'a NormalizedMapping,
}

pub fn run(config: &Config, file: &Path) -> Result<()> {
    let loaded = super::load_config(&config.cwd, file)?;
    let mapping = normalize(
        &loaded.absolute_base_url,
        &loaded.paths,
        loaded.add_match_all,
    )
    .into_diagnostic()?;

    if config.json_logs {
        let report = MappingsReport {
            schema_version: OUTCOME_SCHEMA_VERSION,
            base_url: &loaded.absolute_base_url,
            mappings: &mapping,
        };
        let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
        println!("{json}");
        return Ok(());
    }

    println!("baseUrl: {}", loaded.absolute_base_url.display());
    for entry in &mapping {
        println!("{}", entry.pattern());
        for path in entry.paths() {
            println!("    -> {}", path.display());
        }
    }
    Ok(())
}
