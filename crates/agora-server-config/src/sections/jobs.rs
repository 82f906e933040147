// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Jobs configuration section.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobsConfigLayer {
	pub tick_interval_secs: Option<u64>,
	pub history_retention_days: Option<u32>,
	pub history_cleanup_batch: Option<u32>,
	pub flag_retention_days: Option<u32>,
	pub flag_cleanup_batch: Option<u32>,
	pub flag_auto_dismiss_days: Option<u32>,
	pub upload_stale_days: Option<u32>,
	pub upload_reprocess_batch: Option<u32>,
}

impl JobsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.tick_interval_secs.is_some() {
			self.tick_interval_secs = other.tick_interval_secs;
		}
		if other.history_retention_days.is_some() {
			self.history_retention_days = other.history_retention_days;
		}
		if other.history_cleanup_batch.is_some() {
			self.history_cleanup_batch = other.history_cleanup_batch;
		}
		if other.flag_retention_days.is_some() {
			self.flag_retention_days = other.flag_retention_days;
		}
		if other.flag_cleanup_batch.is_some() {
			self.flag_cleanup_batch = other.flag_cleanup_batch;
		}
		if other.flag_auto_dismiss_days.is_some() {
			self.flag_auto_dismiss_days = other.flag_auto_dismiss_days;
		}
		if other.upload_stale_days.is_some() {
			self.upload_stale_days = other.upload_stale_days;
		}
		if other.upload_reprocess_batch.is_some() {
			self.upload_reprocess_batch = other.upload_reprocess_batch;
		}
	}

	pub fn finalize(self) -> JobsConfig {
		JobsConfig {
			tick_interval_secs: self.tick_interval_secs.unwrap_or(60),
			history_retention_days: self.history_retention_days.unwrap_or(90),
			history_cleanup_batch: self.history_cleanup_batch.unwrap_or(1000),
			flag_retention_days: self.flag_retention_days.unwrap_or(365),
			flag_cleanup_batch: self.flag_cleanup_batch.unwrap_or(500),
			flag_auto_dismiss_days: self.flag_auto_dismiss_days.unwrap_or(30),
			upload_stale_days: self.upload_stale_days.unwrap_or(30),
			upload_reprocess_batch: self.upload_reprocess_batch.unwrap_or(200),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobsConfig {
	pub tick_interval_secs: u64,
	pub history_retention_days: u32,
	pub history_cleanup_batch: u32,
	pub flag_retention_days: u32,
	pub flag_cleanup_batch: u32,
	pub flag_auto_dismiss_days: u32,
	pub upload_stale_days: u32,
	pub upload_reprocess_batch: u32,
}

impl Default for JobsConfig {
	fn default() -> Self {
		JobsConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_values() {
		let config = JobsConfig::default();
		assert_eq!(config.tick_interval_secs, 60);
		assert_eq!(config.history_retention_days, 90);
		assert_eq!(config.flag_cleanup_batch, 500);
	}

	#[test]
	fn deserialize_partial_layer() {
		let layer: JobsConfigLayer = toml::from_str("flag_retention_days = 30").unwrap();
		assert_eq!(layer.flag_retention_days, Some(30));
		assert!(layer.tick_interval_secs.is_none());
	}

	#[test]
	fn merge_keeps_unset_fields() {
		let mut base = JobsConfigLayer {
			tick_interval_secs: Some(30),
			..Default::default()
		};
		base.merge(JobsConfigLayer {
			flag_cleanup_batch: Some(50),
			..Default::default()
		});
		assert_eq!(base.tick_interval_secs, Some(30));
		assert_eq!(base.flag_cleanup_batch, Some(50));
	}
}
