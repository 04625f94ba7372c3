//! errpage - serve the error-page editor and example pages.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use errpage_server::{LogFormat, Overrides, ServerConfig};

/// Serve the error-page editor and rendered example pages
#[derive(Parser)]
#[command(name = "errpage")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path (default: ./errpage.toml or ./errpage.json if present)
    #[arg(short, long, env = "ERRPAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(long, env = "ERRPAGE_BIND")]
    bind: Option<String>,

    /// Path prefix for every route
    #[arg(long, env = "URL_PREFIX")]
    url_prefix: Option<String>,

    /// Directory of example parameter documents
    #[arg(long, env = "ERRPAGE_EXAMPLES_DIR")]
    examples_dir: Option<PathBuf>,

    /// Directory of static editor files
    #[arg(long, env = "ERRPAGE_EDITOR_DIR")]
    editor_dir: Option<PathBuf>,

    /// Do not mark rendered pages as publicly cacheable
    #[arg(long)]
    no_edge_cache: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            bind: self.bind.clone(),
            url_prefix: self.url_prefix.clone(),
            examples_dir: self.examples_dir.clone(),
            editor_dir: self.editor_dir.clone(),
            no_edge_cache: self.no_edge_cache,
            log_level: self.verbose.then(|| "debug".to_string()),
            log_format: self.log_format,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let mut config = ServerConfig::discover(cli.config.as_deref(), &cwd)?;
    cli.overrides().apply(&mut config);
    config.validate()?;

    errpage_server::logging::init(&config.log)?;

    if let Err(e) = errpage_server::serve(config).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
