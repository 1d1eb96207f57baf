//! Thin network bootstrap for an Ollama-style server.
//!
//! Three independent pieces:
//! - [`fetch`]: blocking HTTP(S) GET returning the body bytes,
//! - [`version`]: the static package version,
//! - [`bootstrap`]: bind a listener and hand it, with the allowed origins, to a
//!   [`Serve`] implementation such as [`StatusService`].

pub mod args;
pub mod bootstrap;
pub mod compression;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod service;
pub mod version;

pub use bootstrap::{bind, run_server, Serve, ServerHandle, ShutdownSignal};
pub use config::BootstrapConfig;
pub use error::{Error, Result};
pub use fetch::{get, Fetcher, FetcherSettings};
pub use service::StatusService;
pub use version::{version, VERSION};
