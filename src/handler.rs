// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Dispatches a parsed request to a [`Response`], per spec.md §4.5.

use std::path::Path;

use crate::error::HttpError;
use crate::request::Request;
use crate::resolver::{resolve_file, split_target};
use crate::response::{BodySource, Response};

/// Resolves `request.target` under `document_root` and builds the response
/// for it, honoring the method (`GET` serves the body, `HEAD` suppresses
/// it while still reporting `Content-Length`).
///
/// Any other method accepted by the parser but not handled here would
/// return [`HttpError::MethodNotAllowed`]; in practice the parser's
/// `IMPLEMENTED_METHODS` allow-list is exactly `{GET, HEAD}`, so this never
/// triggers today, but the fallback keeps the contract honest if that list
/// ever grows.
pub fn dispatch(document_root: &Path, request: &Request, close: bool) -> Result<Response, HttpError> {
    let (decoded_path, _query) = split_target(&request.target);
    let resolved = resolve_file(document_root, &decoded_path)?;
    let body = BodySource { path: resolved.path, size: resolved.size };

    match request.method.as_str() {
        "GET" => Ok(Response::for_file(&request.version, body, false, close)),
        "HEAD" => Ok(Response::for_file(&request.version, body, true, close)),
        _ => Err(HttpError::MethodNotAllowed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Headers;
    use std::fs::File;
    use std::io::Write;

    fn make_request(method: &str, target: &str, version: &str) -> Request {
        Request {
            method: method.to_owned(),
            target: target.to_owned(),
            version: version.to_owned(),
            headers: Headers::default(),
        }
    }

    #[test]
    fn get_returns_200_with_body() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("index.html")).unwrap().write_all(b"0123456789012345678").unwrap();
        let root = dir.path().canonicalize().unwrap();

        let request = make_request("GET", "/", "HTTP/1.1");
        let response = dispatch(&root, &request, false).unwrap();
        assert_eq!(response.status_code, 200);
        assert!(!response.head_only);
        assert_eq!(response.body.as_ref().unwrap().size, 19);
    }

    #[test]
    fn head_returns_200_without_transmitting_body() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("index.html")).unwrap().write_all(b"0123456789012345678").unwrap();
        let root = dir.path().canonicalize().unwrap();

        let request = make_request("HEAD", "/index.html", "HTTP/1.0");
        let response = dispatch(&root, &request, true).unwrap();
        assert_eq!(response.status_code, 200);
        assert!(response.head_only);
        assert_eq!(response.body.as_ref().unwrap().size, 19);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();

        let request = make_request("GET", "/missing", "HTTP/1.1");
        let err = dispatch(&root, &request, false).unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
