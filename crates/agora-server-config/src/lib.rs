// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for Agora server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`AGORA_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use agora_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Database at {}", config.database.url);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::debug;

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub database: DatabaseConfig,
	pub jobs: JobsConfig,
	pub checks: ChecksConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`AGORA_SERVER_*`)
/// 2. Config file (`/etc/agora/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![Box::new(DefaultsSource), Box::new(EnvSource)])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	Ok(finalize(merged))
}

fn finalize(layer: ServerConfigLayer) -> ServerConfig {
	ServerConfig {
		database: layer.database.unwrap_or_default().finalize(),
		jobs: layer.jobs.unwrap_or_default().finalize(),
		checks: layer.checks.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn defaults_resolve_without_any_source_data() {
		let config = finalize(ServerConfigLayer::default());
		assert_eq!(config.database.url, "sqlite:./agora.db");
		assert_eq!(config.jobs.tick_interval_secs, 60);
		assert_eq!(config.checks.failing_threshold, 3);
		assert_eq!(config.logging.level, "info");
	}

	#[test]
	fn config_file_overrides_defaults() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[database]
url = "sqlite:./forum.db"

[jobs]
flag_retention_days = 30
"#
		)
		.unwrap();

		let config = load_config_with_file(file.path()).unwrap();
		assert_eq!(config.database.url, "sqlite:./forum.db");
		assert_eq!(config.jobs.flag_retention_days, 30);
		// Untouched fields keep their defaults.
		assert_eq!(config.jobs.history_retention_days, 90);
	}
}
