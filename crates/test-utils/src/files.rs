//! Temporary file helpers for tests that load from disk.

use std::io::Write;

use tempfile::NamedTempFile;

/// Write `contents` to a temporary file with the given suffix (e.g. ".json").
///
/// The file is deleted when the returned handle is dropped.
pub fn temp_file_with(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("field-test-")
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}
