// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Drives one accepted TCP connection through the `idle → reading →
//! dispatching → responding → (idle | closing)` state machine of
//! spec.md §4.3, possibly over several pipelined/keep-alive requests.

use std::io::{BufReader, BufWriter, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use crate::config::ServerConfig;
use crate::error::ReadOutcome;
use crate::handler;
use crate::request::Request;
use crate::response::Response;

/// An accepted connection, owned end-to-end by exactly one worker
/// (spec.md §3). The read/write deadline is set once, at construction,
/// matching the original implementation's `socket.settimeout` call rather
/// than being reset before every operation.
pub struct Connection {
    peer_addr: SocketAddr,
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    raw: TcpStream,
}

impl Connection {
    /// Takes ownership of a freshly accepted socket and applies the
    /// connection-wide read/write deadline.
    pub fn new(stream: TcpStream, peer_addr: SocketAddr, idle_timeout: std::time::Duration) -> std::io::Result<Connection> {
        stream.set_read_timeout(Some(idle_timeout))?;
        stream.set_write_timeout(Some(idle_timeout))?;

        let reader = BufReader::new(stream.try_clone()?);
        let writer = BufWriter::new(stream.try_clone()?);

        Ok(Connection { peer_addr, reader, writer, raw: stream })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Runs the per-connection loop until the connection is done (either
    /// side asked to close, a request failed to parse, or the deadline
    /// elapsed), then shuts down both directions.
    pub fn serve(&mut self, config: &ServerConfig) {
        loop {
            match Request::parse(&mut self.reader) {
                Ok(ReadOutcome::Got(request)) => {
                    if !self.handle_one_request(config, request) {
                        break;
                    }
                }
                Ok(ReadOutcome::PeerClosed) => {
                    log::debug!("{} - connection closed by peer before a request", self.peer_addr);
                    break;
                }
                Ok(ReadOutcome::TimedOut) => {
                    log::debug!("{} - idle timeout, closing", self.peer_addr);
                    break;
                }
                Err(failure) => {
                    // Echo the request's own version when the parser
                    // established one before failing (e.g. a rejected
                    // method on an otherwise well-formed start line);
                    // default to HTTP/1.0 only when none is known.
                    let response = Response::for_error(failure.response_version(), &failure.error);
                    if let Err(e) = response.send(&mut self.writer, &config.banner) {
                        log::warn!("{} - failed to send error response: {}", self.peer_addr, e);
                    }
                    break;
                }
            }
        }

        self.close();
    }

    /// Handles one already-parsed request: dispatches it, sends the
    /// response, and returns whether the connection should stay open for
    /// another request.
    fn handle_one_request(&mut self, config: &ServerConfig, request: Request) -> bool {
        let close = request.wants_close();

        let result = handler::dispatch(&config.document_root, &request, close);

        let response = match result {
            Ok(response) => response,
            Err(error) => Response::for_error(&request.version, &error),
        };

        let keep_alive = !response.close;

        if let Err(e) = response.send(&mut self.writer, &config.banner) {
            log::warn!("{} - failed to send response: {}", self.peer_addr, e);
            return false;
        }

        log::debug!(
            "{} - \"{} {} {}\" {}",
            self.peer_addr,
            request.method,
            request.target,
            request.version,
            response.status_code
        );

        keep_alive
    }

    fn close(&mut self) {
        let _ = self.writer.flush();
        let _ = self.raw.shutdown(Shutdown::Both);
        log::debug!("{} - connection closed", self.peer_addr);
    }
}
