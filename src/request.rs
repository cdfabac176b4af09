// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Parses one HTTP/1.x request (start line + header block) off a buffered
//! byte stream.

use std::io::BufRead;

use crate::error::{HttpError, ParseFailure, ReadOutcome};

/// A per-line cap, and a cap on the total bytes spent on headers, to defend
/// against slowloris-style abuse (spec allows, but doesn't mandate, a
/// bound — we take it).
const MAX_LINE_LEN: usize = 8 * 1024;
const MAX_HEADER_BYTES: usize = 64 * 1024;

/// The set of methods this server implements at all. Anything outside this
/// set is rejected at the parser with [`HttpError::MethodNotAllowed`].
pub const IMPLEMENTED_METHODS: &[&str] = &["GET", "HEAD"];

/// An ordered, case-preserving header map where later entries overwrite
/// earlier ones with the same name (case-insensitively), without losing
/// the original position of that header in the list.
#[derive(Debug, Clone, Default)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    fn new() -> Headers {
        Headers(Vec::new())
    }

    /// Inserts a header, overwriting a previous value for the same name
    /// (case-insensitive) if present, or appending at the end otherwise.
    fn set(&mut self, name: String, value: String) {
        if let Some(existing) = self.0.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            existing.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    /// Looks up a header by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Iterates headers in their original order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// A parsed HTTP/1.x request: a valid method and version, and the full
/// header block. This server has no use for request bodies (GET/HEAD
/// only), so none is modeled.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub version: String,
    pub headers: Headers,
}

impl Request {
    /// Reads and parses one request from `reader`.
    ///
    /// Returns `Ok(ReadOutcome::PeerClosed)` if the peer closed the
    /// connection before sending any bytes, and `Ok(ReadOutcome::TimedOut)`
    /// if the read/write deadline elapsed before a full request arrived —
    /// neither is an error, both mean "close the connection, no response".
    /// A malformed start line, unimplemented method, or bad header line is
    /// reported as `Err(ParseFailure)`, carrying the request's HTTP version
    /// alongside the error whenever it was established before the failure
    /// (spec.md §3: the error response echoes the request's own version,
    /// defaulting to `HTTP/1.0` only when none is known) — a response can
    /// and must still be sent before closing.
    pub fn parse<R: BufRead>(reader: &mut R) -> Result<ReadOutcome<Request>, ParseFailure> {
        let line = match read_line(reader).map_err(|e| ParseFailure::new(e, None))? {
            Some(line) => line,
            None => return Ok(ReadOutcome::TimedOut),
        };

        if line.is_empty() {
            return Ok(ReadOutcome::PeerClosed);
        }

        let mut words = line.split_whitespace();
        let method = words.next();
        let target = words.next();
        let version = words.next();
        let extra = words.next();

        let (method, target, version) = match (method, target, version, extra) {
            (Some(m), Some(t), Some(v), None) => (m, t, v),
            _ => {
                return Err(ParseFailure::new(
                    HttpError::BadRequest("Invalid starting line".to_owned()),
                    None,
                ))
            }
        };

        // The version token is known as soon as the start line splits into
        // exactly three words, regardless of whether the method is
        // implemented; only surface it as the response's version once it
        // also matches the required `HTTP/1.<digits>` pattern.
        let known_version = is_valid_http_version(version).then(|| version.to_owned());

        if !IMPLEMENTED_METHODS.contains(&method) {
            return Err(ParseFailure::new(HttpError::MethodNotAllowed, known_version));
        }

        if known_version.is_none() {
            return Err(ParseFailure::new(
                HttpError::BadRequest("Invalid HTTP version".to_owned()),
                None,
            ));
        }

        let headers = match parse_headers(reader).map_err(|e| ParseFailure::new(e, known_version.clone()))? {
            Some(headers) => headers,
            None => return Ok(ReadOutcome::TimedOut),
        };

        Ok(ReadOutcome::Got(Request {
            method: method.to_owned(),
            target: target.to_owned(),
            version: version.to_owned(),
            headers,
        }))
    }

    /// Whether the client asked for the connection to be kept alive or
    /// closed, combining the HTTP version default with an explicit
    /// `Connection` header override (spec.md §4.3).
    pub fn wants_close(&self) -> bool {
        let mut close = self.version != "HTTP/1.1";

        if let Some(value) = self.headers.get("Connection") {
            if value.eq_ignore_ascii_case("close") {
                close = true;
            } else if value.eq_ignore_ascii_case("keep-alive") {
                close = false;
            }
        }

        close
    }
}

fn is_valid_http_version(version: &str) -> bool {
    match version.strip_prefix("HTTP/1.") {
        Some(rest) => !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Reads one line, terminated by `\n` with an optional trailing `\r`
/// tolerated and stripped. Bytes are decoded as Latin-1 (ISO-8859-1), a
/// 1:1 byte-to-codepoint mapping, per spec.md §4.4.
///
/// Returns `Ok(None)` if the deadline elapses before a newline (or EOF)
/// arrives; `Ok(Some(""))` on a clean EOF with zero bytes read.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, HttpError> {
    let mut buf = Vec::new();
    match reader.read_until(b'\n', &mut buf) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
            return Ok(None);
        }
        Err(_) => return Ok(None),
    }

    if buf.len() > MAX_LINE_LEN {
        return Err(HttpError::BadRequest("Header line too long".to_owned()));
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    Ok(Some(latin1_to_string(&buf)))
}

fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Reads header lines until the blank line that terminates the block.
///
/// Returns `Ok(None)` if the deadline elapses partway through the header
/// block (the caller treats this the same as a start-line timeout).
fn parse_headers<R: BufRead>(reader: &mut R) -> Result<Option<Headers>, HttpError> {
    let mut headers = Headers::new();
    let mut total = 0usize;

    loop {
        let line = match read_line(reader)? {
            Some(line) => line,
            None => return Ok(None),
        };

        if line.is_empty() {
            break;
        }

        total += line.len();
        if total > MAX_HEADER_BYTES {
            return Err(HttpError::BadRequest("Header block too large".to_owned()));
        }

        let colon = line.find(':').ok_or_else(|| bad_header(&line))?;
        let (name, value) = line.split_at(colon);
        let name = name.trim();
        let value = value[1..].trim();

        if name.is_empty() {
            return Err(bad_header(&line));
        }

        headers.set(name.to_owned(), value.to_owned());
    }

    Ok(Some(headers))
}

fn bad_header(line: &str) -> HttpError {
    HttpError::BadRequest(format!("Invalid header: {}", line))
}
