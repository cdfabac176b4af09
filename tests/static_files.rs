// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! End-to-end tests driving a real server over a real TCP socket, the way
//! a client actually would.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

use httpd::{Server, ServerConfig};

/// Starts a server on an ephemeral port with the given document root and
/// returns the address to connect to. The server runs on a background
/// thread for the lifetime of the test process.
fn spawn_server(document_root: std::path::PathBuf) -> SocketAddr {
    let config = ServerConfig {
        address: "127.0.0.1".to_owned(),
        port: 0,
        workers: 4,
        document_root,
        idle_timeout: Duration::from_millis(500),
        banner: "httpd/test".to_owned(),
    };

    let server = Server::bind(config).expect("failed to bind test server");
    let addr = server.local_addr().expect("failed to read local_addr");

    thread::spawn(move || server.run());

    addr
}

fn send_request(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("failed to connect");
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    stream.write_all(request.as_bytes()).unwrap();
    stream.shutdown(std::net::Shutdown::Write).ok();

    let mut response = String::new();
    stream.read_to_string(&mut response).ok();
    response
}

fn make_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), b"0123456789012345678").unwrap();
    dir
}

#[test]
fn get_root_over_http11_returns_index_and_stays_open() {
    let dir = make_root();
    let addr = spawn_server(dir.path().to_owned());

    let response = send_request(addr, "GET / HTTP/1.1\r\nHost: x\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("Content-Type: text/html"));
    assert!(response.contains("Content-Length: 19"));
    assert!(response.contains("Connection: keep-alive"));
    assert!(response.ends_with("0123456789012345678"));
}

#[test]
fn head_over_http10_omits_body_and_closes() {
    let dir = make_root();
    let addr = spawn_server(dir.path().to_owned());

    let response = send_request(addr, "HEAD /index.html HTTP/1.0\r\n\r\n");
    assert!(response.starts_with("HTTP/1.0 200"));
    assert!(response.contains("Content-Length: 19"));
    assert!(response.contains("Connection: close"));
    assert!(!response.contains("0123456789012345678"));
}

#[test]
fn missing_file_is_404_and_closes() {
    let dir = make_root();
    let addr = spawn_server(dir.path().to_owned());

    let response = send_request(addr, "GET /nope.txt HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 404"));
    assert!(response.contains("Connection: close"));
}

#[test]
fn escaping_the_root_is_403() {
    let dir = make_root();
    let addr = spawn_server(dir.path().to_owned());

    let response = send_request(addr, "GET /../../../../etc/passwd HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 403"));
}

#[test]
fn unimplemented_method_is_405() {
    let dir = make_root();
    let addr = spawn_server(dir.path().to_owned());

    let response = send_request(addr, "POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 0\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 405"));
}

#[test]
fn pipelined_requests_are_both_served_on_one_connection() {
    let dir = make_root();
    let addr = spawn_server(dir.path().to_owned());

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\n\r\nGET /index.html HTTP/1.1\r\nConnection: close\r\n\r\n")
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).ok();

    let responses: Vec<&str> = response.split("HTTP/1.1").filter(|s| !s.is_empty()).collect();
    assert_eq!(responses.len(), 2);
    assert!(responses[0].starts_with(" 200"));
    assert!(responses[1].starts_with(" 200"));
}

#[test]
fn malformed_start_line_gets_a_400_and_the_connection_closes() {
    let dir = make_root();
    let addr = spawn_server(dir.path().to_owned());

    let response = send_request(addr, "GARBAGE\r\n\r\n");
    assert!(response.starts_with("HTTP/1.0 400"));
}
