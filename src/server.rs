// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Wires the acceptor, the bounded connection queue, and the worker pool
//! together (spec.md §2).

use std::io;
use std::net::TcpListener;
use std::sync::Arc;

use crate::acceptor;
use crate::config::ServerConfig;
use crate::queue;
use crate::worker;

/// A bound, not-yet-running server.
pub struct Server {
    config: Arc<ServerConfig>,
    listener: TcpListener,
}

impl Server {
    /// Binds the listening socket. Workers aren't spawned yet; call
    /// [`Server::run`] to start serving.
    pub fn bind(config: ServerConfig) -> io::Result<Server> {
        let listener = acceptor::bind(&config.address, config.port)?;
        Ok(Server { config: Arc::new(config), listener })
    }

    /// The address the listening socket is actually bound to (useful when
    /// the configured port was `0`).
    pub fn local_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Spawns the worker pool and runs the acceptor loop on the calling
    /// thread. Never returns under normal operation; only returns if the
    /// listening socket is closed out from under the process.
    pub fn run(self) {
        let (sender, receiver) = queue::bounded(self.config.workers.max(1));
        let _workers = worker::spawn_pool(self.config.clone(), receiver);

        log::info!(
            "listening on {}:{} (root={}, workers={})",
            self.config.address,
            self.config.port,
            self.config.document_root.display(),
            self.config.workers
        );

        acceptor::accept_loop(&self.listener, &sender);
    }
}
