//! Server configuration: defaults, an optional TOML file, then CLI flags.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use respd::{Cli, ServerConfig};
//!
//! let args = Cli::parse();
//! let config = ServerConfig::from_cli(args)?;
//! println!("listening on {}", config.addr());
//! # Ok::<(), respd::ConfigError>(())
//! ```

use std::path::Path;

use clap::Parser;
use resp::DecoderConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("Failed to read configuration file '{path}': {source}")]
	Io {
		source: std::io::Error,
		path: String,
	},

	#[error("Failed to parse TOML configuration: {0}")]
	TomlParse(#[from] toml::de::Error),

	#[error("Unsupported configuration format: {0}")]
	UnsupportedFormat(String),

	#[error("Configuration file has no extension")]
	NoExtension,
}

/// Command-line arguments for the server
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
	/// Configuration file path (TOML)
	#[arg(short, long)]
	pub config: Option<String>,

	/// Port to listen on
	#[arg(short, long)]
	pub port: Option<u16>,

	/// Host to bind to
	#[arg(long)]
	pub host: Option<String>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long)]
	pub log_level: Option<String>,

	/// Maximum array nesting accepted from clients
	#[arg(long)]
	pub max_depth: Option<usize>,

	/// Maximum bulk string length accepted from clients, in bytes
	#[arg(long)]
	pub max_bulk_len: Option<usize>,

	/// Maximum simple string, error or length line accepted from clients, in
	/// bytes
	#[arg(long)]
	pub max_line_len: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
	pub log_level: String,
	pub max_depth: usize,
	pub max_bulk_len: usize,
	pub max_line_len: usize,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".into(),
			port: 6379,
			log_level: "info".into(),
			max_depth: resp::DEFAULT_MAX_DEPTH,
			max_bulk_len: resp::DEFAULT_MAX_BULK_LEN,
			max_line_len: resp::DEFAULT_MAX_LINE_LEN,
		}
	}
}

impl ServerConfig {
	/// Build the effective configuration. Explicit CLI flags win over the
	/// file, and the file wins over defaults.
	pub fn from_cli(args: Cli) -> Result<Self, ConfigError> {
		let mut config = match args.config.as_deref() {
			Some(p) => load_from_file(p)?,
			None => ServerConfig::default(),
		};

		if let Some(host) = args.host {
			config.host = host;
		}
		if let Some(port) = args.port {
			config.port = port;
		}
		if let Some(log_level) = args.log_level {
			config.log_level = log_level;
		}
		if let Some(depth) = args.max_depth {
			config.max_depth = depth;
		}
		if let Some(len) = args.max_bulk_len {
			config.max_bulk_len = len;
		}
		if let Some(len) = args.max_line_len {
			config.max_line_len = len;
		}

		Ok(config)
	}

	pub fn addr(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}

	/// Decoder limits applied to every client connection
	pub fn decoder_config(&self) -> DecoderConfig {
		DecoderConfig::default()
			.with_max_depth(self.max_depth)
			.with_max_bulk_len(self.max_bulk_len)
			.with_max_line_len(self.max_line_len)
	}
}

pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<ServerConfig, ConfigError> {
	let path_ref = path.as_ref();

	let extension = path_ref
		.extension()
		.and_then(|ext| ext.to_str())
		.ok_or(ConfigError::NoExtension)?;

	if !extension.eq_ignore_ascii_case("toml") {
		return Err(ConfigError::UnsupportedFormat(extension.to_string()));
	}

	let content = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
		path: path_ref.display().to_string(),
		source,
	})?;

	Ok(toml::from_str(&content)?)
}
