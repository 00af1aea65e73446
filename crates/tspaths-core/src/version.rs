/// Crate version, from Cargo metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the JSON shape printed by `tspaths match --json` and
/// `tspaths mappings --json`.
pub const OUTCOME_SCHEMA_VERSION: u32 = 1;

/// `tspaths <version>`, plus the git hash when the build provides one.
#[must_use]
pub fn version_string() -> String {
    match option_env!("TSPATHS_BUILD_GIT_HASH") {
        Some(hash) => format!("tspaths {VERSION} ({hash})"),
        None => format!("tspaths {VERSION}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_starts_with_name_and_version() {
        assert!(version_string().starts_with(&format!("tspaths {VERSION}")));
    }

    #[test]
    fn test_outcome_schema_version() {
        assert_eq!(OUTCOME_SCHEMA_VERSION, 1);
    }
}
