// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Extension-to-MIME-type lookup for served files.

use std::path::Path;

/// Returns the `Content-Type` value for a file, looked up by extension.
///
/// Unknown or missing extensions fall back to `application/octet-stream`.
pub fn content_type(path: &Path) -> &'static str {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext,
        None => return "application/octet-stream",
    };

    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "swf" => "application/x-shockwave-flash",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn known_extensions() {
        assert_eq!(content_type(&PathBuf::from("a/b.html")), "text/html");
        assert_eq!(content_type(&PathBuf::from("a/b.css")), "text/css");
        assert_eq!(content_type(&PathBuf::from("a/b.js")), "application/javascript");
        assert_eq!(content_type(&PathBuf::from("a/b.jpeg")), "image/jpeg");
        assert_eq!(content_type(&PathBuf::from("a/b.JPG")), "image/jpeg");
    }

    #[test]
    fn unknown_or_missing_extension() {
        assert_eq!(content_type(&PathBuf::from("a/b.ext")), "application/octet-stream");
        assert_eq!(content_type(&PathBuf::from("a/b")), "application/octet-stream");
    }
}
