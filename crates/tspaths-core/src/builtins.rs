//! Builtin module names that aliases must never shadow.

use std::collections::BTreeSet;

/// Core modules assumed when the host does not report its own list.
pub const DEFAULT_BUILTIN_MODULES: &[&str] = &[
    "assert",
    "buffer",
    "child_process",
    "cluster",
    "crypto",
    "dgram",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "https",
    "net",
    "os",
    "path",
    "punycode",
    "querystring",
    "readline",
    "stream",
    "string_decoder",
    "tls",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "zlib",
];

/// Scheme that always denotes a builtin.
pub const NODE_SCHEME: &str = "node:";

/// Set of builtin module names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builtins {
    names: BTreeSet<String>,
}

impl Default for Builtins {
    fn default() -> Self {
        Self::from_names(DEFAULT_BUILTIN_MODULES.iter().copied())
    }
}

impl Builtins {
    /// The host's own list. The default Node core list is always included.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        set.extend(DEFAULT_BUILTIN_MODULES.iter().map(|s| (*s).to_string()));
        Self { names: set }
    }

    /// Whether `request` names a builtin module.
    #[must_use]
    pub fn contains(&self, request: &str) -> bool {
        request.starts_with(NODE_SCHEME) || self.names.contains(request)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
