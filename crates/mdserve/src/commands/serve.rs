//! `mdserve serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdserve_config::{CliSettings, Config};
use mdserve_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args, Debug)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover mdserve.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// URL prefix stripped before looking up documents (overrides config).
    #[arg(long)]
    base_path: Option<String>,

    /// Seconds a rendered page is served from cache (overrides config).
    #[arg(long, value_name = "SECS")]
    cache_duration: Option<u64>,

    /// Page template file (overrides config).
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Enable verbose output (request and cache logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;

        output.highlight(&format!(
            "Serving on http://{}:{}{}",
            config.server.host, config.server.port, config.docs_resolved.base_path
        ));
        output.info(&format!(
            "Source directory: {}",
            config.docs_resolved.source_dir.display()
        ));
        output.info(&format!("Cache duration: {}s", config.cache.duration_secs));
        match &config.template_path {
            Some(path) => output.info(&format!("Template: {}", path.display())),
            None => output.info("Template: built-in"),
        }

        let server_config = server_config_from_config(&config);
        run_server(server_config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            host: self.host.clone(),
            port: self.port,
            source_dir: self.source_dir.clone(),
            base_path: self.base_path.clone(),
            cache_duration_secs: self.cache_duration,
            template: self.template.clone(),
        }
    }
}
