// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use std::process::ExitCode;

use clap::Parser;
use httpd::{Cli, Server, ServerConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match ServerConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            log::error!("failed to bind listening socket: {e}");
            return ExitCode::FAILURE;
        }
    };

    server.run();
    ExitCode::SUCCESS
}

/// `RUST_LOG` always wins; otherwise `-v` raises the default level one step
/// at a time (warn -> info -> debug -> trace).
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}
