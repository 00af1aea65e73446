//! Lexical path helpers.
//!
//! Nothing here touches the filesystem.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by removing `.` and resolving `..` components.
///
/// `..` never climbs above the root of an absolute path.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => result.push(".."),
            },
            other => result.push(other),
        }
    }
    result
}

/// Join `rel` onto `base` and normalize the result.
///
/// If `rel` is rooted it replaces `base`, as with [`Path::join`].
#[must_use]
pub fn join_normalized(base: &Path, rel: &str) -> PathBuf {
    normalize(&base.join(rel))
}

/// Whether a path template is rooted on the current platform.
///
/// On Windows this accepts `\foo` and `/foo` as well as `C:\foo`.
#[must_use]
pub fn is_rooted(template: &str) -> bool {
    Path::new(template).has_root()
}

/// Check if a module specifier is an absolute path.
///
/// Recognizes POSIX roots, Windows drive paths and UNC paths regardless of
/// the host platform, since specifiers are written by users.
#[must_use]
pub fn is_absolute_specifier(spec: &str) -> bool {
    // Unix absolute
    if spec.starts_with('/') {
        return true;
    }

    // Windows absolute: C:\, D:/, etc.
    let bytes = spec.as_bytes();
    if bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
    {
        return true;
    }

    // UNC path: \\server\share
    spec.starts_with("\\\\")
}
