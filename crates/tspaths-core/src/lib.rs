#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

//! Path alias resolution for module loaders.
//!
//! Declared aliases (`"@app/*": ["src/app/*"]`) are normalized once into a
//! priority-ordered table, matched against bare module requests, and probed
//! against the filesystem. [`register`] installs the result in front of a
//! host's own resolution function.

pub mod builtins;
pub mod config;
pub mod error;
pub mod manifest_cache;
pub mod mapping;
pub mod matcher;
pub mod probe;
pub mod register;
pub mod trace;
pub mod version;

pub use builtins::Builtins;
pub use config::{
    Config, ConfigLoader, ConfigLoaderResult, ExplicitParams, LoadedConfig, PathMapping,
};
pub use error::{Error, ResolveError};
pub use manifest_cache::{ManifestCache, StampedManifestCache};
pub use mapping::{normalize, MappingEntry, NormalizedMapping};
pub use matcher::{match_pattern, MatchOptions, MatchOutcome, MatchPath};
pub use probe::{FileSystem, MemoryFileSystem, RealFileSystem};
pub use register::{
    register, register_config, register_matcher, ModuleHost, Registration, ResolveCall,
    ResolveFilename,
};
pub use trace::{MatchTrace, MatchTraceStep};
pub use version::{OUTCOME_SCHEMA_VERSION, VERSION};
