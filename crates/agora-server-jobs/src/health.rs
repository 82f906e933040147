// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job health derived from run history.

use crate::types::{JobRun, JobStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
	Healthy,
	Degraded,
	Unhealthy,
}

impl HealthState {
	/// Derive a job's health from its most recent run and the number of
	/// consecutive failures. One failure degrades, three make it unhealthy.
	pub fn from_last_run(last_run: Option<&JobRun>, consecutive_failures: u32) -> Self {
		match last_run {
			None => HealthState::Healthy,
			Some(run) => match run.status {
				JobStatus::Succeeded | JobStatus::Running | JobStatus::Cancelled => {
					HealthState::Healthy
				}
				JobStatus::Failed => {
					if consecutive_failures >= 3 {
						HealthState::Unhealthy
					} else if consecutive_failures >= 1 {
						HealthState::Degraded
					} else {
						HealthState::Healthy
					}
				}
			},
		}
	}

	pub fn worst(self, other: Self) -> Self {
		use HealthState::*;
		match (self, other) {
			(Unhealthy, _) | (_, Unhealthy) => Unhealthy,
			(Degraded, _) | (_, Degraded) => Degraded,
			_ => Healthy,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct LastRunInfo {
	pub run_id: String,
	pub status: JobStatus,
	pub started_at: DateTime<Utc>,
	pub duration_ms: Option<i64>,
	pub error: Option<String>,
}

impl From<JobRun> for LastRunInfo {
	fn from(run: JobRun) -> Self {
		Self {
			run_id: run.id,
			status: run.status,
			started_at: run.started_at,
			duration_ms: run.duration_ms,
			error: run.error_message,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct JobHealthStatus {
	pub job_id: String,
	pub name: String,
	pub status: HealthState,
	pub last_run: Option<LastRunInfo>,
	pub consecutive_failures: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobsHealthStatus {
	pub status: HealthState,
	pub jobs: Vec<JobHealthStatus>,
}

impl JobsHealthStatus {
	pub fn aggregate(jobs: Vec<JobHealthStatus>) -> Self {
		let status = jobs
			.iter()
			.fold(HealthState::Healthy, |acc, j| acc.worst(j.status));
		Self { status, jobs }
	}
}
