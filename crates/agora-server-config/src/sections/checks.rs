// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Problem-checks configuration section.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChecksConfigLayer {
	pub sweep_interval_secs: Option<u64>,
	pub stale_margin_secs: Option<u64>,
	pub failing_threshold: Option<u32>,
	pub upload_backlog_threshold: Option<u64>,
}

impl ChecksConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.sweep_interval_secs.is_some() {
			self.sweep_interval_secs = other.sweep_interval_secs;
		}
		if other.stale_margin_secs.is_some() {
			self.stale_margin_secs = other.stale_margin_secs;
		}
		if other.failing_threshold.is_some() {
			self.failing_threshold = other.failing_threshold;
		}
		if other.upload_backlog_threshold.is_some() {
			self.upload_backlog_threshold = other.upload_backlog_threshold;
		}
	}

	pub fn finalize(self) -> ChecksConfig {
		ChecksConfig {
			sweep_interval_secs: self.sweep_interval_secs.unwrap_or(600),
			stale_margin_secs: self.stale_margin_secs.unwrap_or(300),
			failing_threshold: self.failing_threshold.unwrap_or(3),
			upload_backlog_threshold: self.upload_backlog_threshold.unwrap_or(1000),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecksConfig {
	pub sweep_interval_secs: u64,
	/// Grace period before a job's missed slot counts as overdue.
	pub stale_margin_secs: u64,
	pub failing_threshold: u32,
	pub upload_backlog_threshold: u64,
}

impl Default for ChecksConfig {
	fn default() -> Self {
		ChecksConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_values() {
		let config = ChecksConfig::default();
		assert_eq!(config.sweep_interval_secs, 600);
		assert_eq!(config.failing_threshold, 3);
	}

	#[test]
	fn serde_roundtrip() {
		let config = ChecksConfig {
			sweep_interval_secs: 60,
			stale_margin_secs: 120,
			failing_threshold: 5,
			upload_backlog_threshold: 10,
		};
		let toml_str = toml::to_string(&config).unwrap();
		let parsed: ChecksConfig = toml::from_str(&toml_str).unwrap();
		assert_eq!(config, parsed);
	}
}
