//! Configuration: a `config.toml` file layered with `DOCAUDIT_`-prefixed
//! environment overrides, plus a handful of CLI flags for local runs.

use clap::Parser;
use serde::Deserialize;

use crate::error::ServerError;

#[derive(Debug, Clone, Deserialize)]
pub struct QdrantConfig {
    pub host: String,
    pub port: u16,
    pub grpc_port: u16,
    pub https: bool,
    pub collection_name: String,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6333,
            grpc_port: 6334,
            https: false,
            collection_name: "docaudit".to_string(),
        }
    }
}

impl QdrantConfig {
    pub fn base_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbedderConfig {
    pub url: String,
    pub batch_size: usize,
    pub model: String,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8001".to_string(),
            batch_size: docaudit_core::embed::DEFAULT_BATCH_SIZE,
            model: "sentence-transformers/all-roberta-large-v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub qdrant: QdrantConfig,
    #[serde(default)]
    pub embedder: EmbedderConfig,
    #[serde(default)]
    pub server: HttpConfig,
}

/// CLI flags layered on top of the file/env config. Mirrors the teacher's
/// `Config::new() -> Self { Self::parse() }` shape.
#[derive(Debug, Parser)]
#[command(name = "docaudit-server", version, about = "Document ingestion and query server")]
pub struct Cli {
    /// Path to a config.toml file. Missing file falls back to defaults and
    /// environment overrides only.
    #[arg(long, default_value = "config.toml")]
    pub config: String,

    /// Overrides server.host.
    #[arg(long)]
    pub host: Option<String>,

    /// Overrides server.port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Verbose logging (debug level).
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

impl Config {
    /// Loads defaults, then `cli.config` if present, then
    /// `DOCAUDIT_`-prefixed environment variables, then CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self, ServerError> {
        let built = ::config::Config::builder()
            .add_source(::config::File::with_name(&cli.config).required(false))
            .add_source(::config::Environment::with_prefix("DOCAUDIT").separator("__"))
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        let mut parsed: Config = built
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        if let Some(host) = &cli.host {
            parsed.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            parsed.server.port = port;
        }

        Ok(parsed)
    }
}
