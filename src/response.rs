// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Builds and writes the response line, headers, and optional file body.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Utc;

use crate::error::HttpError;
use crate::status::reason_phrase;

/// The body of a successful response: a file whose bytes will be streamed.
pub struct BodySource {
    pub path: PathBuf,
    pub size: u64,
}

/// A response in progress, built by the request handler and handed to
/// [`Response::send`].
pub struct Response {
    pub version: String,
    pub status_code: u16,
    pub reason: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<BodySource>,
    pub head_only: bool,
    pub close: bool,
}

impl Response {
    /// Builds the 200 response for a resolved file, for either GET
    /// (`head_only = false`) or HEAD (`head_only = true`).
    pub fn for_file(version: &str, body: BodySource, head_only: bool, close: bool) -> Response {
        Response {
            version: version.to_owned(),
            status_code: 200,
            reason: None,
            headers: Vec::new(),
            body: Some(body),
            head_only,
            close,
        }
    }

    /// Builds an error response: a status line plus the standard headers,
    /// no body. Always closes the connection (spec.md §4.6).
    pub fn for_error(version: &str, error: &HttpError) -> Response {
        Response {
            version: version.to_owned(),
            status_code: error.status_code(),
            reason: Some(error.reason().to_owned()),
            headers: Vec::new(),
            body: None,
            head_only: true,
            close: true,
        }
    }

    /// Writes the status line, the server-injected headers (in the fixed
    /// order spec.md §4.6 requires), caller-supplied headers, and the body
    /// (unless `head_only`), to `writer`.
    pub fn send<W: Write>(&self, writer: &mut W, banner: &str) -> io::Result<()> {
        let reason = self.reason.as_deref().unwrap_or_else(|| reason_phrase(self.status_code));
        write!(writer, "{} {} {}\r\n", self.version, self.status_code, reason)?;

        write!(writer, "Server: {}\r\n", banner)?;
        write!(writer, "Date: {}\r\n", rfc1123_date())?;

        let content_length = self.body.as_ref().map(|b| b.size).unwrap_or(0);
        write!(writer, "Content-Length: {}\r\n", content_length)?;

        if let Some(body) = &self.body {
            write!(writer, "Content-Type: {}\r\n", crate::mime::content_type(&body.path))?;
        }

        write!(writer, "Connection: {}\r\n", if self.close { "close" } else { "keep-alive" })?;

        for (name, value) in &self.headers {
            write!(writer, "{}: {}\r\n", name, value)?;
        }

        write!(writer, "\r\n")?;

        if !self.head_only {
            if let Some(body) = &self.body {
                let mut file = File::open(&body.path)?;
                io::copy(&mut file, writer)?;
            }
        }

        writer.flush()
    }
}

/// Formats the current time per spec.md §4.6: `"Day, DD Mon YYYY HH:MM:SS GMT"`.
fn rfc1123_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
