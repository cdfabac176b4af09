// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Maps a request target to a file under the document root, and enforces
//! the sandbox: nothing outside `document_root` is ever served.

use std::fs;
use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::error::HttpError;

/// The fixed directory index name (spec.md §6).
const INDEX_FILE: &str = "index.html";

/// A request target resolved to a servable, readable file.
pub struct ResolvedFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Splits a raw request target into its decoded path and raw query string,
/// mirroring `urllib.parse.urlparse` + `unquote_plus` in the original
/// implementation (percent-escapes *and* literal `+` both decode to a
/// space in the path).
pub fn split_target(raw_target: &str) -> (String, Option<String>) {
    let (path, query) = match raw_target.split_once('?') {
        Some((p, q)) => (p, Some(q.to_owned())),
        None => (raw_target, None),
    };

    let plus_decoded = path.replace('+', " ");
    let decoded = percent_decode_str(&plus_decoded).decode_utf8_lossy().into_owned();

    (decoded, query)
}

/// Parses a raw query string into a name → values multimap. Unused by the
/// core server, but part of the contract (spec.md §4.5).
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Resolves a decoded request path to an absolute filesystem path, strips
/// any leading slashes/backslashes, joins with the document root, and
/// normalizes `.`/`..` segments and duplicate separators (spec.md §4.5
/// steps 1-3). Does not touch the filesystem and does not enforce the
/// sandbox; see [`resolve_file`] for the full pipeline.
pub fn join_under_root(document_root: &Path, decoded_path: &str) -> PathBuf {
    let relative = decoded_path.trim_start_matches(['/', '\\']);
    normalize(&document_root.join(relative))
}

/// Lexically normalizes a path: collapses `.` and `..` segments without
/// touching the filesystem (the path may not exist).
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Runs the full spec.md §4.5 pipeline for a decoded request path: resolve,
/// sandbox-check, directory-index fallback, and existence/readability
/// checks. Returns the file to serve or the `HttpError` to respond with.
pub fn resolve_file(document_root: &Path, decoded_path: &str) -> Result<ResolvedFile, HttpError> {
    let mut resolved = join_under_root(document_root, decoded_path);

    if !resolved.starts_with(document_root) {
        return Err(HttpError::Forbidden);
    }

    if resolved.is_dir() {
        resolved.push(INDEX_FILE);
        if !resolved.is_file() {
            return Err(HttpError::Forbidden);
        }
    } else if !resolved.exists() {
        return Err(HttpError::NotFound);
    } else if !resolved.is_file() {
        // Exists but isn't a regular file (e.g. a socket or device node):
        // same policy as unreadable.
        return Err(HttpError::Forbidden);
    }

    // Re-check the sandbox after appending index.html just in case a
    // symlinked document root ever changes the common prefix.
    if !resolved.starts_with(document_root) {
        return Err(HttpError::Forbidden);
    }

    let metadata = fs::metadata(&resolved).map_err(|_| HttpError::Forbidden)?;
    if !is_readable(&metadata) {
        return Err(HttpError::Forbidden);
    }

    Ok(ResolvedFile { path: resolved, size: metadata.len() })
}

#[cfg(unix)]
fn is_readable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o444 != 0
}

#[cfg(not(unix))]
fn is_readable(_metadata: &fs::Metadata) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn decodes_percent_and_plus() {
        let (path, query) = split_target("/a%20b+c?x=1");
        assert_eq!(path, "/a b c");
        assert_eq!(query.as_deref(), Some("x=1"));
    }

    #[test]
    fn strips_leading_slashes_and_backslashes() {
        let root = Path::new("/root");
        assert_eq!(join_under_root(root, "/dir/file.txt"), PathBuf::from("/root/dir/file.txt"));
        assert_eq!(join_under_root(root, "\\dir\\file.txt"), PathBuf::from("/root/dir/file.txt"));
    }

    #[test]
    fn collapses_dot_dot_segments() {
        let root = Path::new("/root");
        let joined = join_under_root(root, "foo/../../etc/passwd");
        assert_eq!(joined, PathBuf::from("/etc/passwd"));
        assert!(!joined.starts_with(root));
    }

    #[test]
    fn serves_index_html_for_directories() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("index.html")).unwrap().write_all(b"0123456789012345678").unwrap();
        let root = dir.path().canonicalize().unwrap();

        let resolved = resolve_file(&root, "/").unwrap();
        assert_eq!(resolved.path, root.join("index.html"));
        assert_eq!(resolved.size, 19);
    }

    #[test]
    fn directory_without_index_is_forbidden() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let root = dir.path().canonicalize().unwrap();

        let err = resolve_file(&root, "/sub").unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();

        let err = resolve_file(&root, "/missing").unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn escaping_the_root_is_forbidden() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();

        let err = resolve_file(&root, "/../etc/passwd").unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
