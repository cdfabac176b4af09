// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Command-line parsing and the immutable configuration derived from it.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Command-line flags accepted by the server.
///
/// The flag letters (`-a`, `-p`, `-w`, `-r`) are part of the server's
/// external contract and must not change.
#[derive(Parser, Debug)]
#[command(name = "httpd", about = "A small multi-threaded static-file HTTP server")]
pub struct Cli {
    /// Interface to bind.
    #[arg(short = 'a', long = "address", default_value = "localhost")]
    pub address: String,

    /// TCP port to listen on.
    #[arg(short = 'p', long = "port", default_value_t = 8080)]
    pub port: u16,

    /// Number of worker threads.
    #[arg(short = 'w', long = "workers", default_value_t = 10)]
    pub workers: usize,

    /// Document root directory. Must already exist.
    #[arg(short = 'r', long = "root")]
    pub root: PathBuf,

    /// Raise log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Immutable configuration the server runs with, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface and port to bind.
    pub address: String,
    pub port: u16,

    /// Number of worker threads draining the connection queue.
    pub workers: usize,

    /// Canonical absolute path of the document root.
    pub document_root: PathBuf,

    /// Read/write deadline applied to every client connection.
    pub idle_timeout: Duration,

    /// Value sent in the `Server` response header.
    pub banner: String,
}

/// What can go wrong while turning CLI flags into a [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("document root {path:?} does not exist or is not a directory")]
    InvalidRoot { path: PathBuf },

    #[error("failed to resolve document root {path:?}: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ServerConfig {
    /// Default read/write timeout applied to client connections.
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

    /// Builds a [`ServerConfig`] from parsed CLI flags, resolving the
    /// document root to its canonical absolute form.
    ///
    /// Fails (without binding any socket) if the root doesn't exist, isn't
    /// a directory, or can't be canonicalized.
    pub fn from_cli(cli: &Cli) -> Result<ServerConfig, ConfigError> {
        if !cli.root.is_dir() {
            return Err(ConfigError::InvalidRoot { path: cli.root.clone() });
        }

        let document_root = cli.root.canonicalize().map_err(|source| ConfigError::Canonicalize {
            path: cli.root.clone(),
            source,
        })?;

        Ok(ServerConfig {
            address: cli.address.clone(),
            port: cli.port,
            workers: cli.workers,
            document_root,
            idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
            banner: format!("httpd/{}", env!("CARGO_PKG_VERSION")),
        })
    }
}
