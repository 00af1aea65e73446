//! Loader hook registration.
//!
//! A [`ModuleHost`] owns the function the host uses to turn a module request
//! into a filename. Each registration stacks an alias layer on top of it; a
//! layer rewrites aliased requests and delegates everything to the resolver
//! below. [`Registration::restore`] unlinks its own layer, so the host's
//! function is back once every registration has been restored.

use crate::builtins::Builtins;
use crate::config::{ConfigLoader, ConfigLoaderResult, LoadedConfig};
use crate::error::{Error, ResolveError};
use crate::matcher::MatchPath;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, warn};

/// Everything a resolution call carries besides the request.
///
/// Forwarded untouched to the wrapped resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveCall {
    pub parent_id: Option<String>,
    pub parent_path: Option<PathBuf>,
    pub is_main: bool,
    /// Host-specific options, opaque to us.
    pub options: Option<serde_json::Value>,
}

impl ResolveCall {
    #[must_use]
    pub fn from_parent(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            parent_id: Some(id.into()),
            parent_path: Some(path.into()),
            ..Self::default()
        }
    }
}

/// A host's module-resolution function.
pub trait ResolveFilename: Send + Sync {
    fn resolve_filename(&self, request: &str, call: &ResolveCall) -> Result<PathBuf, ResolveError>;
}

impl<F> ResolveFilename for F
where
    F: Fn(&str, &ResolveCall) -> Result<PathBuf, ResolveError> + Send + Sync,
{
    fn resolve_filename(&self, request: &str, call: &ResolveCall) -> Result<PathBuf, ResolveError> {
        self(request, call)
    }
}

/// The host's resolution entry point plus its builtin module names.
pub struct ModuleHost {
    hooks: RwLock<HookChain>,
    builtins: Builtins,
}

/// The host's own resolver with alias layers stacked on top, newest outermost.
struct HookChain {
    original: Arc<dyn ResolveFilename>,
    layers: Vec<AliasLayer>,
    next_id: u64,
    installed: Arc<dyn ResolveFilename>,
}

struct AliasLayer {
    id: u64,
    matcher: Arc<MatchPath>,
}

impl HookChain {
    /// Re-link the installed resolver after layers changed. With no layers
    /// left this is the original resolver itself.
    fn relink(&mut self, builtins: &Builtins) {
        self.installed = self.layers.iter().fold(
            Arc::clone(&self.original),
            |next, layer| -> Arc<dyn ResolveFilename> {
                Arc::new(AliasResolver {
                    matcher: Arc::clone(&layer.matcher),
                    builtins: builtins.clone(),
                    next,
                })
            },
        );
    }
}

impl fmt::Debug for ModuleHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHost")
            .field("builtins", &self.builtins)
            .field("alias_layers", &self.alias_layers())
            .finish_non_exhaustive()
    }
}

impl ModuleHost {
    pub fn new(resolver: impl ResolveFilename + 'static) -> Self {
        let original: Arc<dyn ResolveFilename> = Arc::new(resolver);
        Self {
            hooks: RwLock::new(HookChain {
                installed: Arc::clone(&original),
                original,
                layers: Vec::new(),
                next_id: 0,
            }),
            builtins: Builtins::default(),
        }
    }

    pub fn with_builtins(mut self, builtins: Builtins) -> Self {
        self.builtins = builtins;
        self
    }

    #[must_use]
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// The resolver currently installed.
    #[must_use]
    pub fn current(&self) -> Arc<dyn ResolveFilename> {
        let hooks = self.hooks.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&hooks.installed)
    }

    /// Number of alias registrations currently installed.
    #[must_use]
    pub fn alias_layers(&self) -> usize {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .layers
            .len()
    }

    /// Resolve through whatever resolver is installed.
    pub fn resolve_filename(
        &self,
        request: &str,
        call: &ResolveCall,
    ) -> Result<PathBuf, ResolveError> {
        // Lock released before the call; resolvers may re-enter the host.
        let resolver = self.current();
        resolver.resolve_filename(request, call)
    }

    fn push_layer(&self, matcher: MatchPath) -> u64 {
        let mut hooks = self.hooks.write().unwrap_or_else(PoisonError::into_inner);
        let id = hooks.next_id;
        hooks.next_id += 1;
        hooks.layers.push(AliasLayer {
            id,
            matcher: Arc::new(matcher),
        });
        hooks.relink(&self.builtins);
        id
    }

    /// Unlink one layer wherever it sits in the chain.
    fn remove_layer(&self, id: u64) -> bool {
        let mut hooks = self.hooks.write().unwrap_or_else(PoisonError::into_inner);
        let before = hooks.layers.len();
        hooks.layers.retain(|layer| layer.id != id);
        if hooks.layers.len() == before {
            return false;
        }
        hooks.relink(&self.builtins);
        true
    }
}

/// Rewrites aliased requests before handing them to the next resolver.
struct AliasResolver {
    matcher: Arc<MatchPath>,
    builtins: Builtins,
    next: Arc<dyn ResolveFilename>,
}

impl ResolveFilename for AliasResolver {
    fn resolve_filename(&self, request: &str, call: &ResolveCall) -> Result<PathBuf, ResolveError> {
        let is_builtin = self.builtins.contains(request);
        debug!(
            request,
            is_builtin,
            parent = call.parent_id.as_deref().unwrap_or_default(),
            "resolving request"
        );

        if !is_builtin {
            if let Some(found) = self.matcher.match_path(request) {
                // Requests are strings; a path that is not UTF-8 cannot be
                // forwarded as one, so the request goes through untouched.
                if let Some(found) = found.to_str() {
                    debug!(request, found, "alias matched");
                    return self.next.resolve_filename(found, call);
                }
                debug!(request, found = %found.display(), "alias target is not UTF-8");
            }
        }

        self.next.resolve_filename(request, call)
    }
}

/// Handle returned by [`register`]; removes its aliases from the host.
pub struct Registration {
    installed: Mutex<Option<(Arc<ModuleHost>, u64)>>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("active", &self.is_active())
            .finish()
    }
}

impl Registration {
    fn inactive() -> Self {
        Self {
            installed: Mutex::new(None),
        }
    }

    /// Whether a restore is still pending.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Remove this registration's aliases.
    ///
    /// Other registrations on the same host stay installed, whatever order
    /// they are restored in; once all are restored the host's own resolver
    /// is back in place. Later calls do nothing.
    pub fn restore(&self) {
        let taken = self
            .installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some((host, id)) = taken {
            if host.remove_layer(id) {
                debug!(layer = id, "path aliases unregistered");
            }
        }
    }
}

/// Load configuration and install path aliases on `host`.
///
/// A configuration the loader reports as failed is not an error: a warning
/// is logged and the returned registration is inactive. Invalid patterns or
/// targets are errors and leave the host untouched.
pub fn register(
    host: &Arc<ModuleHost>,
    loader: &impl ConfigLoader,
    cwd: &Path,
) -> Result<Registration, Error> {
    debug!(cwd = %cwd.display(), "registering path aliases");
    match loader.load(cwd) {
        ConfigLoaderResult::Failed { message } => {
            warn!("{message}. tspaths will be skipped");
            Ok(Registration::inactive())
        }
        ConfigLoaderResult::Success(config) => register_config(host, &config),
    }
}

/// Install path aliases from an already loaded configuration.
pub fn register_config(
    host: &Arc<ModuleHost>,
    config: &LoadedConfig,
) -> Result<Registration, Error> {
    debug!(
        base_url = %config.absolute_base_url.display(),
        patterns = config.paths.len(),
        add_match_all = config.add_match_all,
        "building matcher"
    );
    let matcher = MatchPath::from_config(config)?;
    Ok(register_matcher(host, matcher))
}

/// Install a prebuilt matcher.
pub fn register_matcher(host: &Arc<ModuleHost>, matcher: MatchPath) -> Registration {
    let id = host.push_layer(matcher);
    debug!(layer = id, "path aliases registered");

    Registration {
        installed: Mutex::new(Some((Arc::clone(host), id))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExplicitParams;
    use crate::mapping::normalize;
    use crate::probe::MemoryFileSystem;
    use std::fs;
    use tempfile::tempdir;

    type Calls = Arc<Mutex<Vec<(String, ResolveCall)>>>;

    /// A host whose original resolver records its arguments and echoes the
    /// request back, failing for requests starting with "missing".
    fn recording_host() -> (Arc<ModuleHost>, Calls) {
        let calls: Calls = Arc::default();
        let seen = Arc::clone(&calls);
        let host = ModuleHost::new(move |request: &str, call: &ResolveCall| {
            seen.lock().unwrap().push((request.to_string(), call.clone()));
            if request.starts_with("missing") {
                Err(ResolveError::not_found(request))
            } else {
                Ok(PathBuf::from(format!("original:{request}")))
            }
        });
        (Arc::new(host), calls)
    }

    fn memory_matcher(pairs: &[(&str, &str)], fs: MemoryFileSystem) -> MatchPath {
        let raw = pairs
            .iter()
            .map(|(p, t)| ((*p).to_string(), vec![(*t).to_string()]))
            .collect();
        let mapping = normalize(Path::new("/project"), &raw, true).unwrap();
        MatchPath::new("/project", mapping, vec!["main".to_string()])
            .with_file_system(Arc::new(fs))
    }

    fn call() -> ResolveCall {
        ResolveCall {
            parent_id: Some("/project/index.ts".to_string()),
            parent_path: Some(PathBuf::from("/project")),
            is_main: false,
            options: Some(serde_json::json!({"paths": ["/project"]})),
        }
    }

    #[test]
    fn test_aliased_request_forwarded_with_found_path() {
        let (host, calls) = recording_host();
        let fs = MemoryFileSystem::new().with_file("/project/src/utils/math.ts", "");
        let matcher = memory_matcher(&[("@utils/*", "src/utils/*")], fs);
        let registration = register_matcher(&host, matcher);
        assert!(registration.is_active());

        let resolved = host.resolve_filename("@utils/math", &call()).unwrap();
        assert_eq!(resolved, PathBuf::from("original:/project/src/utils/math.ts"));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "/project/src/utils/math.ts");
        assert_eq!(calls[0].1, call());
    }

    #[test]
    fn test_unmatched_request_passes_through_untouched() {
        let (host, calls) = recording_host();
        let matcher = memory_matcher(&[("@utils/*", "src/utils/*")], MemoryFileSystem::new());
        let _registration = register_matcher(&host, matcher);

        assert_eq!(
            host.resolve_filename("lodash", &call()).unwrap(),
            PathBuf::from("original:lodash")
        );
        assert_eq!(
            host.resolve_filename("missing-pkg", &call()),
            Err(ResolveError::not_found("missing-pkg"))
        );
        assert_eq!(
            host.resolve_filename("./local", &call()).unwrap(),
            PathBuf::from("original:./local")
        );

        let requests: Vec<String> = calls.lock().unwrap().iter().map(|(r, _)| r.clone()).collect();
        assert_eq!(requests, vec!["lodash", "missing-pkg", "./local"]);
    }

    #[test]
    fn test_builtins_never_intercepted() {
        let (host, calls) = recording_host();
        let host = Arc::new(
            Arc::try_unwrap(host)
                .unwrap()
                .with_builtins(Builtins::from_names(["worker_threads"])),
        );
        let fs = MemoryFileSystem::new()
            .with_file("/project/fs.ts", "")
            .with_file("/project/worker_threads.ts", "")
            .with_file("/project/node:path.ts", "");
        let _registration = register_matcher(&host, memory_matcher(&[], fs));

        for request in ["fs", "worker_threads", "node:path"] {
            assert_eq!(
                host.resolve_filename(request, &call()).unwrap(),
                PathBuf::from(format!("original:{request}"))
            );
        }
        let requests: Vec<String> = calls.lock().unwrap().iter().map(|(r, _)| r.clone()).collect();
        assert_eq!(requests, vec!["fs", "worker_threads", "node:path"]);
    }

    #[test]
    fn test_restore_reinstates_original_exactly() {
        let (host, calls) = recording_host();
        let original = host.current();
        let before = host.resolve_filename("@utils/math", &call());

        let fs = MemoryFileSystem::new().with_file("/project/src/utils/math.ts", "");
        let matcher = memory_matcher(&[("@utils/*", "src/utils/*")], fs);
        let registration = register_matcher(&host, matcher);
        assert!(!Arc::ptr_eq(&host.current(), &original));

        registration.restore();
        assert!(!registration.is_active());
        assert!(Arc::ptr_eq(&host.current(), &original));

        let after = host.resolve_filename("@utils/math", &call());
        assert_eq!(before, after);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
    }

    #[test]
    fn test_restore_is_idempotent() {
        let (host, _calls) = recording_host();
        let original = host.current();
        let registration = register_matcher(&host, memory_matcher(&[], MemoryFileSystem::new()));

        registration.restore();
        registration.restore();
        assert!(Arc::ptr_eq(&host.current(), &original));
        assert!(!registration.is_active());
    }

    #[test]
    fn test_stacked_registrations_restore_in_registration_order() {
        let (host, _calls) = recording_host();
        let original = host.current();
        let fs = MemoryFileSystem::new()
            .with_file("/project/one/a.ts", "")
            .with_file("/project/two/b.ts", "");
        let first = register_matcher(&host, memory_matcher(&[("@a", "one/a")], fs.clone()));
        let second = register_matcher(&host, memory_matcher(&[("@b", "two/b")], fs));
        assert_eq!(host.alias_layers(), 2);

        let resolve = |request: &str| host.resolve_filename(request, &call()).unwrap();
        assert_eq!(resolve("@a"), PathBuf::from("original:/project/one/a.ts"));
        assert_eq!(resolve("@b"), PathBuf::from("original:/project/two/b.ts"));

        first.restore();
        assert!(!first.is_active());
        assert!(second.is_active());
        assert_eq!(host.alias_layers(), 1);
        assert_eq!(resolve("@a"), PathBuf::from("original:@a"));
        assert_eq!(resolve("@b"), PathBuf::from("original:/project/two/b.ts"));

        second.restore();
        assert_eq!(host.alias_layers(), 0);
        assert!(Arc::ptr_eq(&host.current(), &original));
        assert_eq!(resolve("@b"), PathBuf::from("original:@b"));
    }

    #[test]
    fn test_stacked_registrations_restore_newest_first() {
        let (host, _calls) = recording_host();
        let original = host.current();
        let fs = MemoryFileSystem::new().with_file("/project/one/a.ts", "");
        let first = register_matcher(&host, memory_matcher(&[("@a", "one/a")], fs.clone()));
        let second = register_matcher(&host, memory_matcher(&[("@a", "missing/a")], fs));

        second.restore();
        assert_eq!(
            host.resolve_filename("@a", &call()).unwrap(),
            PathBuf::from("original:/project/one/a.ts")
        );

        first.restore();
        first.restore();
        assert!(Arc::ptr_eq(&host.current(), &original));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_target_leaves_request_untouched() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let base = PathBuf::from(OsStr::from_bytes(b"/proj\xffect"));
        let fs = MemoryFileSystem::new().with_file(base.join("bin.ts"), "");
        let raw = [("@bin".to_string(), vec!["bin".to_string()])]
            .into_iter()
            .collect();
        let mapping = normalize(&base, &raw, false).unwrap();
        let matcher = MatchPath::new(base.clone(), mapping, vec!["main".to_string()])
            .with_file_system(Arc::new(fs));
        assert_eq!(matcher.match_path("@bin"), Some(base.join("bin.ts")));

        let (host, calls) = recording_host();
        let _registration = register_matcher(&host, matcher);
        assert_eq!(
            host.resolve_filename("@bin", &call()).unwrap(),
            PathBuf::from("original:@bin")
        );
        assert_eq!(calls.lock().unwrap()[0].0, "@bin");
    }

    #[test]
    fn test_failed_config_is_noop() {
        let (host, _calls) = recording_host();
        let original = host.current();

        let registration =
            register(&host, &ExplicitParams::new(""), Path::new("/project")).unwrap();
        assert!(!registration.is_active());
        assert!(Arc::ptr_eq(&host.current(), &original));

        let registration = register(
            &host,
            &ConfigLoaderResult::failed("Couldn't find tsconfig.json"),
            Path::new("/project"),
        )
        .unwrap();
        registration.restore();
        assert!(Arc::ptr_eq(&host.current(), &original));
    }

    #[test]
    fn test_invalid_pattern_leaves_host_untouched() {
        let (host, _calls) = recording_host();
        let original = host.current();

        let params = ExplicitParams::new(".").with_path("a/*/*", ["x/*"]);
        let result = register(&host, &params, Path::new("/project"));
        assert!(matches!(result, Err(Error::InvalidPattern { .. })));
        assert!(Arc::ptr_eq(&host.current(), &original));
    }

    #[test]
    fn test_register_with_explicit_params_on_disk() {
        let dir = tempdir().unwrap();
        let lib = dir.path().join("src").join("lib");
        fs::create_dir_all(&lib).unwrap();
        fs::write(lib.join("greet.ts"), "export {}").unwrap();

        let (host, calls) = recording_host();
        let params = ExplicitParams::new("./src")
            .with_path("@lib/*", ["lib/*"])
            .with_add_match_all(false);
        let registration = register(&host, &params, dir.path()).unwrap();

        let resolved = host
            .resolve_filename("@lib/greet", &ResolveCall::default())
            .unwrap();
        let expected = lib.join("greet.ts");
        assert_eq!(
            resolved,
            PathBuf::from(format!("original:{}", expected.display()))
        );

        registration.restore();
        host.resolve_filename("@lib/greet", &ResolveCall::default()).unwrap();
        let last = calls.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last.0, "@lib/greet");
    }

    #[test]
    fn test_host_is_shareable_across_threads() {
        let (host, _calls) = recording_host();
        let fs = MemoryFileSystem::new().with_file("/project/src/a.ts", "");
        let _registration = register_matcher(&host, memory_matcher(&[("@a", "src/a")], fs));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let host = Arc::clone(&host);
                std::thread::spawn(move || host.resolve_filename("@a", &ResolveCall::default()))
            })
            .collect();
        for handle in handles {
            assert_eq!(
                handle.join().unwrap().unwrap(),
                PathBuf::from("original:/project/src/a.ts")
            );
        }
    }
}
