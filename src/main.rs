use std::env;

use anyhow::{Context, Result};

use ollama_bootstrap::args::parse_args;
use ollama_bootstrap::config::{BootstrapConfig, DEFAULT_HOST, DEFAULT_PORT, FLAGS};
use ollama_bootstrap::{run_server, version, ShutdownSignal, StatusService};

fn usage() -> String {
    format!(
        "Usage: ollama-bootstrap [OPTIONS]\n\
         \n\
         Options:\n  \
           -H, --host <ADDR>      bind address (default {})\n  \
           -p, --port <PORT>      bind port (default {})\n  \
           -o, --origin <ORIGIN>  allowed cross-origin value, repeatable or comma-separated\n  \
           -V, --version          print version\n  \
           -h, --help             print this help",
        DEFAULT_HOST, DEFAULT_PORT
    )
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args, FLAGS)?;

    if options.has_flag("h") || options.has_flag("help") {
        println!("{}", usage());
        return Ok(());
    }
    if options.has_flag("V") || options.has_flag("version") {
        println!("{}", version());
        return Ok(());
    }

    let config = BootstrapConfig::from_options(&options)?;
    log::info!("ollama-bootstrap {} starting: {:?}", version(), config);

    run_server(&config, &StatusService::new(), ShutdownSignal::new())
        .with_context(|| format!("Server on {} failed", config.bind_addr()))?;

    Ok(())
}
