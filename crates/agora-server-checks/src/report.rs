// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::check::{CheckOutcome, CheckPriority};

/// One check's result as handed to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemReport {
	pub check_id: String,
	pub priority: CheckPriority,
	pub outcome: CheckOutcome,
	pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardStatus {
	Ok,
	Warning,
	Critical,
}

/// The aggregated sweep result: worst-of status plus every report, with
/// high-priority problems sorted first.
#[derive(Debug, Clone, Serialize)]
pub struct ChecksReport {
	pub status: DashboardStatus,
	pub reports: Vec<ProblemReport>,
}

impl ChecksReport {
	pub fn aggregate(mut reports: Vec<ProblemReport>) -> Self {
		let mut status = DashboardStatus::Ok;
		for report in &reports {
			if report.outcome.is_problem() {
				match report.priority {
					CheckPriority::High => status = DashboardStatus::Critical,
					CheckPriority::Low => {
						if status == DashboardStatus::Ok {
							status = DashboardStatus::Warning;
						}
					}
				}
			}
		}

		// Problems before clean results, high priority first.
		reports.sort_by_key(|r| {
			(
				!r.outcome.is_problem(),
				r.priority != CheckPriority::High,
				r.check_id.clone(),
			)
		});

		Self { status, reports }
	}

	pub fn problems(&self) -> impl Iterator<Item = &ProblemReport> {
		self.reports.iter().filter(|r| r.outcome.is_problem())
	}
}
