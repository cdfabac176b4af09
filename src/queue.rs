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

//! The bounded FIFO handoff between the acceptor and the worker pool
//! (spec.md §3's `ConnectionQueue`). Producers block when full, consumers
//! block when empty.

use std::net::{SocketAddr, TcpStream};

use crossbeam_channel::{Receiver, Sender};

/// One accepted, not-yet-served connection.
pub struct Accepted {
    pub stream: TcpStream,
    pub peer_addr: SocketAddr,
}

/// The producer half, held by the acceptor.
#[derive(Clone)]
pub struct ConnectionSender(Sender<Accepted>);

/// The consumer half, shared by every worker.
#[derive(Clone)]
pub struct ConnectionReceiver(Receiver<Accepted>);

/// Builds a bounded connection queue with the given capacity.
pub fn bounded(capacity: usize) -> (ConnectionSender, ConnectionReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (ConnectionSender(tx), ConnectionReceiver(rx))
}

impl ConnectionSender {
    /// Enqueues a connection, blocking if the queue is full.
    pub fn send(&self, accepted: Accepted) -> Result<(), Accepted> {
        self.0.send(accepted).map_err(|e| e.into_inner())
    }
}

impl ConnectionReceiver {
    /// Dequeues a connection, blocking if the queue is empty. Returns
    /// `None` once the sender side has been dropped (shutdown).
    pub fn recv(&self) -> Option<Accepted> {
        self.0.recv().ok()
    }
}
