// Integration test utilities
#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ollama_bootstrap::{BootstrapConfig, ServerHandle, StatusService};

/// How long to wait for the server port to become available.
const PORT_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// How often to check if the port is available.
const PORT_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Timeout for socket read/write operations.
const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait for a port to accept connections within timeout
pub fn wait_for_port(addr: SocketAddr) -> bool {
    let start = Instant::now();
    loop {
        match TcpStream::connect(addr) {
            Ok(_) => return true,
            Err(_) => {
                if start.elapsed() > PORT_READY_TIMEOUT {
                    return false;
                }
                thread::sleep(PORT_CHECK_INTERVAL);
            }
        }
    }
}

/// A port on 127.0.0.1 that nothing is listening on.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind probe listener");
    listener.local_addr().unwrap().port()
}

/// Serves one fixed response to each of `connections` connections, then exits.
pub struct FixedResponseServer {
    addr: SocketAddr,
    handle: Option<JoinHandle<()>>,
}

impl FixedResponseServer {
    pub fn start(body: Vec<u8>, connections: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind fixture");
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            for stream in listener.incoming().take(connections) {
                let stream = stream.expect("Failed to accept");
                let body = body.clone();
                thread::spawn(move || Self::respond(stream, &body));
            }
        });

        FixedResponseServer {
            addr,
            handle: Some(handle),
        }
    }

    fn respond(mut stream: TcpStream, body: &[u8]) {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                break;
            }
        }
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(body);
    }

    pub fn url(&self) -> String {
        format!("http://{}/blob", self.addr)
    }

    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("Fixture thread panicked");
        }
    }
}

/// Status service on an OS-assigned port.
pub struct TestServer {
    server: ServerHandle,
}

impl TestServer {
    pub fn start(origins: &[&str]) -> Self {
        let config = BootstrapConfig::new("127.0.0.1", 0).with_origins(origins.iter().copied());
        let server =
            ServerHandle::spawn(&config, StatusService::new()).expect("Failed to start test server");
        wait_for_port(server.addr());
        TestServer { server }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.server.addr(), path)
    }

    pub fn handle(&mut self) -> &mut ServerHandle {
        &mut self.server
    }

    fn connect(&self) -> TcpStream {
        let stream =
            TcpStream::connect(self.server.addr()).expect("Failed to connect to test server");
        stream
            .set_read_timeout(Some(SOCKET_TIMEOUT))
            .expect("Failed to set read timeout");
        stream
            .set_write_timeout(Some(SOCKET_TIMEOUT))
            .expect("Failed to set write timeout");
        stream
    }

    /// Send raw requests over one connection and read one response per request.
    pub fn send_requests(&self, requests: &[&str]) -> Vec<RawResponse> {
        let stream = self.connect();
        let mut reader = BufReader::new(stream);

        requests
            .iter()
            .map(|request| {
                reader
                    .get_mut()
                    .write_all(request.as_bytes())
                    .expect("Failed to write request");
                RawResponse::read(&mut reader)
            })
            .collect()
    }

    pub fn send_request(&self, request: &str) -> RawResponse {
        self.send_requests(&[request]).remove(0)
    }
}

/// A response read off the wire, with lower-cased header names.
#[derive(Debug)]
pub struct RawResponse {
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    fn read<R: BufRead>(reader: &mut R) -> Self {
        let mut status_line = String::new();
        reader
            .read_line(&mut status_line)
            .expect("Failed to read status line");

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader
                .read_line(&mut line)
                .expect("Failed to read header line");
            if line == "\r\n" || line.is_empty() {
                break;
            }
            let (key, value) = line.split_once(':').expect("Malformed header");
            headers.push((key.trim().to_lowercase(), value.trim().to_string()));
        }

        let content_length = headers
            .iter()
            .find(|(k, _)| k == "content-length")
            .map(|(_, v)| v.parse::<usize>().expect("Invalid Content-Length"))
            .unwrap_or(0);

        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).expect("Failed to read body");

        RawResponse {
            status_line: status_line.trim_end().to_string(),
            headers,
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}
