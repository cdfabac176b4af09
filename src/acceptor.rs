// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Binds the listening socket and hands accepted connections to the queue.
//! Never parses bytes, never talks to a client directly (spec.md §4.1).

use std::io;
use std::net::TcpListener;

use crate::queue::{Accepted, ConnectionSender};

/// Binds `address:port` and listens. `std::net::TcpListener::bind` already
/// sets `SO_REUSEADDR` before binding on the platforms this crate targets,
/// matching the original implementation's explicit `setsockopt` call.
pub fn bind(address: &str, port: u16) -> io::Result<TcpListener> {
    let listener = TcpListener::bind((address, port))?;
    Ok(listener)
}

/// Accepts connections forever and posts them to `connections`. Failures
/// during `accept` are logged and the loop continues; the loop only ever
/// stops if the listening socket itself is closed out from under it.
pub fn accept_loop(listener: &TcpListener, connections: &ConnectionSender) {
    loop {
        match listener.accept() {
            Ok((stream, peer_addr)) => {
                log::debug!("{peer_addr} - accepted connection");
                if connections.send(Accepted { stream, peer_addr }).is_err() {
                    // Every worker is gone; nothing left to do.
                    break;
                }
            }
            Err(e) => {
                log::warn!("error accepting connection: {e}");
            }
        }
    }
}
