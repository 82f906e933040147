// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files, environment.

use std::path::PathBuf;

use tracing::debug;

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{ChecksConfigLayer, DatabaseConfigLayer, JobsConfigLayer, LoggingConfigLayer};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/agora/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: AGORA_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			database: Some(DatabaseConfigLayer {
				url: env_var("AGORA_SERVER_DATABASE_URL"),
			}),
			jobs: Some(JobsConfigLayer {
				tick_interval_secs: env_u64("AGORA_SERVER_JOBS_TICK_INTERVAL_SECS")?,
				history_retention_days: env_u32("AGORA_SERVER_JOBS_HISTORY_RETENTION_DAYS")?,
				history_cleanup_batch: env_u32("AGORA_SERVER_JOBS_HISTORY_CLEANUP_BATCH")?,
				flag_retention_days: env_u32("AGORA_SERVER_JOBS_FLAG_RETENTION_DAYS")?,
				flag_cleanup_batch: env_u32("AGORA_SERVER_JOBS_FLAG_CLEANUP_BATCH")?,
				flag_auto_dismiss_days: env_u32("AGORA_SERVER_JOBS_FLAG_AUTO_DISMISS_DAYS")?,
				upload_stale_days: env_u32("AGORA_SERVER_JOBS_UPLOAD_STALE_DAYS")?,
				upload_reprocess_batch: env_u32("AGORA_SERVER_JOBS_UPLOAD_REPROCESS_BATCH")?,
			}),
			checks: Some(ChecksConfigLayer {
				sweep_interval_secs: env_u64("AGORA_SERVER_CHECKS_SWEEP_INTERVAL_SECS")?,
				stale_margin_secs: env_u64("AGORA_SERVER_CHECKS_STALE_MARGIN_SECS")?,
				failing_threshold: env_u32("AGORA_SERVER_CHECKS_FAILING_THRESHOLD")?,
				upload_backlog_threshold: env_u64("AGORA_SERVER_CHECKS_UPLOAD_BACKLOG_THRESHOLD")?,
			}),
			logging: Some(LoggingConfigLayer {
				level: env_var("AGORA_SERVER_LOG_LEVEL"),
				json: env_bool("AGORA_SERVER_LOG_JSON")?,
			}),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	env_var(name)
		.map(|s| {
			s.parse().map_err(|_| ConfigError::InvalidValue {
				name: name.to_string(),
				message: format!("expected an integer, got {s:?}"),
			})
		})
		.transpose()
}

fn env_u32(name: &str) -> Result<Option<u32>, ConfigError> {
	env_var(name)
		.map(|s| {
			s.parse().map_err(|_| ConfigError::InvalidValue {
				name: name.to_string(),
				message: format!("expected an integer, got {s:?}"),
			})
		})
		.transpose()
}

fn env_bool(name: &str) -> Result<Option<bool>, ConfigError> {
	env_var(name)
		.map(|s| match s.as_str() {
			"1" | "true" | "yes" => Ok(true),
			"0" | "false" | "no" => Ok(false),
			_ => Err(ConfigError::InvalidValue {
				name: name.to_string(),
				message: format!("expected a boolean, got {s:?}"),
			}),
		})
		.transpose()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_file_is_an_empty_layer() {
		let source = TomlSource::new("/nonexistent/agora/server.toml");
		let layer = source.load().unwrap();
		assert_eq!(layer, ServerConfigLayer::default());
	}

	#[test]
	fn precedence_orders_sources() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}
}
