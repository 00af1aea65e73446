//! Small filesystem helpers.

use std::fs;
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Read a whole file as text. Invalid UTF-8 becomes U+FFFD instead of an error,
/// so a manifest with a stray byte in an unrelated field still parses.
///
/// # Errors
/// Only I/O errors from reading `path`.
pub fn read_to_string_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })
}

/// Modification time (milliseconds since epoch) and size of a file.
///
/// Returns `None` if the file has no readable metadata. The mtime is `None`
/// on platforms that do not report it.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn mtime_and_size(path: &Path) -> Option<(Option<u64>, u64)> {
    let meta = path.metadata().ok()?;
    let mtime_ms = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64);
    Some((mtime_ms, meta.len()))
}
