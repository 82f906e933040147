// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One configuration source's partial view, mergeable with others.

use serde::{Deserialize, Serialize};

use crate::sections::{ChecksConfigLayer, DatabaseConfigLayer, JobsConfigLayer, LoggingConfigLayer};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerConfigLayer {
	pub database: Option<DatabaseConfigLayer>,
	pub jobs: Option<JobsConfigLayer>,
	pub checks: Option<ChecksConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge a higher-precedence layer into this one. Set fields win;
	/// unset fields keep whatever was there.
	pub fn merge(&mut self, other: Self) {
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.jobs, other.jobs, JobsConfigLayer::merge);
		merge_section(&mut self.checks, other.checks, ChecksConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(base), Some(other)) => merge(base, other),
		(None, Some(other)) => *base = Some(other),
		_ => {}
	}
}
