// Copyright 2015 The tiny-http Contributors
// Copyright (c) 2017 The Rouille developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! N independent worker threads, each repeatedly draining the connection
//! queue and driving one connection to completion before returning for the
//! next (spec.md §4.2).

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::queue::ConnectionReceiver;

/// Spawns `config.workers` worker threads sharing one connection receiver.
/// Returns their join handles so the caller can wait on clean shutdown.
pub fn spawn_pool(config: Arc<ServerConfig>, connections: ConnectionReceiver) -> Vec<JoinHandle<()>> {
    (0..config.workers)
        .map(|id| {
            let config = config.clone();
            let connections = connections.clone();
            thread::Builder::new()
                .name(format!("httpd-worker-{id}"))
                .spawn(move || worker_loop(&config, &connections))
                .expect("failed to spawn worker thread")
        })
        .collect()
}

fn worker_loop(config: &ServerConfig, connections: &ConnectionReceiver) {
    while let Some(accepted) = connections.recv() {
        let peer_addr = accepted.peer_addr;

        let mut connection = match Connection::new(accepted.stream, peer_addr, config.idle_timeout) {
            Ok(connection) => connection,
            Err(e) => {
                log::warn!("{peer_addr} - failed to prepare connection: {e}");
                continue;
            }
        };

        // A panic anywhere in the per-connection loop closes that one
        // connection but must never kill the worker thread (spec.md §4.2).
        let result = panic::catch_unwind(AssertUnwindSafe(|| connection.serve(config)));
        if let Err(payload) = result {
            log::error!("{peer_addr} - worker panicked while handling connection: {}", panic_message(&payload));
        }
    }
}

/// Extracts a human-readable message from a panic payload, falling back to
/// a generic description for payloads that aren't `&str`/`String`.
fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
