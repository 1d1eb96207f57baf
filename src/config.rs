use anyhow::{bail, Context, Result};

use crate::args::{parse_args, CliOptions};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Flags understood by [`BootstrapConfig::from_args`] that take no value.
pub const FLAGS: &[&str] = &["h", "help", "V", "version"];

/// Where to listen and which cross-origin callers the server may accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    pub host: String,
    pub port: u16,
    /// Permitted values of the `Origin` request header. Empty denies every
    /// cross-origin request.
    pub allowed_origins: Vec<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origins: Vec::new(),
        }
    }
}

impl BootstrapConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        BootstrapConfig {
            host: host.into(),
            port,
            allowed_origins: Vec::new(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    /// `host:port`, with IPv6 literals bracketed.
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Build a config from command-line arguments (including the program name).
    pub fn from_args(args: &[String]) -> Result<Self> {
        let options = parse_args(args, FLAGS)?;
        Self::from_options(&options)
    }

    pub fn from_options(options: &CliOptions) -> Result<Self> {
        if let Some(unknown) = options
            .keys()
            .find(|k| !matches!(*k, "H" | "host" | "p" | "port" | "o" | "origin"))
        {
            bail!("Unknown option: {}", unknown);
        }

        let mut config = BootstrapConfig::default();

        if let Some(host) = options.get("host").or(options.get("H")) {
            if host.is_empty() {
                bail!("--host must not be empty");
            }
            config.host = host.to_string();
        }

        if let Some(port) = options.get("port").or(options.get("p")) {
            config.port = port
                .parse()
                .with_context(|| format!("Invalid port: '{}'", port))?;
        }

        config.allowed_origins = options
            .get_all("origin")
            .iter()
            .chain(options.get_all("o"))
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect();

        Ok(config)
    }
}
