pub mod mappings;
pub mod match_cmd;
pub mod version;

use miette::{miette, IntoDiagnostic, Result};
use std::path::Path;
use tspaths_core::{ConfigLoader, ConfigLoaderResult, ExplicitParams, LoadedConfig};

/// Read a path-mapping file. A relative `baseUrl` is taken from the file's
/// own directory.
pub fn load_config(cwd: &Path, file: &Path) -> Result<LoadedConfig> {
    let path = cwd.join(file);
    let params = ExplicitParams::from_file(&path).into_diagnostic()?;
    let base = path.parent().unwrap_or(cwd);

    match params.load(base) {
        ConfigLoaderResult::Success(loaded) => Ok(loaded),
        ConfigLoaderResult::Failed { message } => {
            Err(miette!("{message} (in {})", path.display()))
        }
    }
}
