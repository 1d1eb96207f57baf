//! Listener bootstrap: bind a socket, then hand it to a [`Serve`] implementation.

use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::BootstrapConfig;
use crate::error::{Error, Result};

/// Cooperative stop flag shared between a server and whoever owns it.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Stays set once triggered.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A serving routine that takes ownership of a bound listener.
///
/// Implementations run until `shutdown` is triggered or the listener fails,
/// and own the accept loop for that whole time.
pub trait Serve {
    fn serve(
        &self,
        listener: TcpListener,
        allowed_origins: Vec<String>,
        shutdown: ShutdownSignal,
    ) -> Result<()>;
}

impl<S: Serve + ?Sized> Serve for Arc<S> {
    fn serve(
        &self,
        listener: TcpListener,
        allowed_origins: Vec<String>,
        shutdown: ShutdownSignal,
    ) -> Result<()> {
        (**self).serve(listener, allowed_origins, shutdown)
    }
}

/// Bind the listener described by `config`.
pub fn bind(config: &BootstrapConfig) -> Result<TcpListener> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).map_err(|source| Error::Bind {
        addr: addr.clone(),
        source,
    })?;
    log::info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Bind and delegate to `service` on the calling thread. Returns once the
/// service returns.
pub fn run_server<S: Serve + ?Sized>(
    config: &BootstrapConfig,
    service: &S,
    shutdown: ShutdownSignal,
) -> Result<()> {
    let listener = bind(config)?;
    service.serve(listener, config.allowed_origins.clone(), shutdown)
}

/// A service running on a background thread that can be shut down.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: ShutdownSignal,
    thread_handle: Option<JoinHandle<Result<()>>>,
}

impl ServerHandle {
    /// Bind on the calling thread, so bind failures come back here, then run
    /// `service` on its own thread.
    pub fn spawn<S>(config: &BootstrapConfig, service: S) -> Result<Self>
    where
        S: Serve + Send + 'static,
    {
        let listener = bind(config)?;
        let addr = listener.local_addr()?;
        let shutdown = ShutdownSignal::new();

        let origins = config.allowed_origins.clone();
        let signal = shutdown.clone();
        let thread_handle = thread::Builder::new()
            .name(format!("serve-{}", addr))
            .spawn(move || service.serve(listener, origins, signal))?;

        Ok(ServerHandle {
            addr,
            shutdown,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Signal shutdown and wait for the service thread. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        self.shutdown.trigger();

        if let Some(handle) = self.thread_handle.take() {
            match handle.join() {
                Ok(Ok(())) => log::debug!("Server on {} stopped", self.addr),
                Ok(Err(e)) => log::error!("Server on {} failed: {}", self.addr, e),
                Err(_) => log::error!("Server thread for {} panicked", self.addr),
            }
        }
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_triggered()
            && self
                .thread_handle
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
