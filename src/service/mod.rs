//! Built-in [`Serve`] implementation answering liveness and version probes.

use std::io::{self, BufReader, ErrorKind, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result as AnyResult};

use crate::bootstrap::{Serve, ShutdownSignal};
use crate::error::Result;
use crate::http::{parse_request, HttpResponse};

pub mod handlers;
pub mod router;

pub use router::{OriginDecision, Router};

/// How often to poll for new connections in non-blocking accept loop.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// EMFILE and ENFILE share these values on Linux, macOS and the BSDs.
#[cfg(unix)]
const FD_EXHAUSTION_ERRNOS: &[i32] = &[23, 24];
#[cfg(not(unix))]
const FD_EXHAUSTION_ERRNOS: &[i32] = &[];

const PERSISTENT_CONNECTION_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Thread-per-connection HTTP/1.1 status server.
#[derive(Debug, Clone, Default)]
pub struct StatusService;

impl StatusService {
    pub fn new() -> Self {
        StatusService
    }

    fn handle_connection(stream: TcpStream, router: Router, shutdown: ShutdownSignal) {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        match Self::process_requests(stream, &router, &shutdown) {
            Ok(()) => log::debug!("Connection from {} closed", peer),
            Err(e) => log::error!("Error handling connection from {}: {:#}", peer, e),
        }
    }

    fn process_requests(
        stream: TcpStream,
        router: &Router,
        shutdown: &ShutdownSignal,
    ) -> AnyResult<()> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(PERSISTENT_CONNECTION_READ_TIMEOUT))?;
        let mut writer = stream.try_clone().context("Failed to clone stream")?;
        let mut reader = BufReader::new(stream);

        loop {
            let request = match parse_request(&mut reader) {
                Ok(Some(request)) => request,
                Ok(None) => break,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    log::debug!("Idle connection timed out");
                    break;
                }
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    log::debug!("Bad request: {}", e);
                    let mut response = HttpResponse::bad_request();
                    response.headers.insert("Content-Length", "0");
                    response.headers.insert("Connection", "close");
                    writer.write_all(&response.to_bytes())?;
                    break;
                }
                Err(e) => return Err(e).context("Failed to parse request"),
            };

            log::debug!("{} {}", request.method, request.uri);
            let mut response = router.handle(&request);
            let close = request.wants_close() || shutdown.is_triggered();
            if close {
                response.headers.insert("Connection", "close");
            }
            writer
                .write_all(&response.to_bytes())
                .context("Failed to write response")?;
            if close {
                break;
            }
        }
        Ok(())
    }
}

/// Accept failures that concern one pending connection or a temporary resource
/// shortage, after which the listener is still usable.
fn is_transient_accept_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionRefused
            | ErrorKind::TimedOut
            | ErrorKind::OutOfMemory
    ) || e
        .raw_os_error()
        .is_some_and(|code| FD_EXHAUSTION_ERRNOS.contains(&code))
}

impl Serve for StatusService {
    fn serve(
        &self,
        listener: TcpListener,
        allowed_origins: Vec<String>,
        shutdown: ShutdownSignal,
    ) -> Result<()> {
        listener.set_nonblocking(true)?;
        let router = Router::new(allowed_origins);
        log::info!("Status service accepting on {}", listener.local_addr()?);

        loop {
            if shutdown.is_triggered() {
                log::debug!("Server shutdown requested");
                break;
            }

            match listener.accept() {
                Ok((stream, peer_addr)) => {
                    log::debug!("Accepted connection from {}", peer_addr);
                    let router = router.clone();
                    let shutdown = shutdown.clone();
                    thread::spawn(move || Self::handle_connection(stream, router, shutdown));
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(ref e) if is_transient_accept_error(e) => {
                    log::warn!("Transient accept error, retrying: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    log::error!("Accept error: {}", e);
                    return Err(e.into());
                }
            }
        }
        log::info!("Status service stopped");
        Ok(())
    }
}
