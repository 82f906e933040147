// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::check::{CheckOutcome, ProblemCheck};
use crate::report::{ChecksReport, ProblemReport};

/// Holds the registered checks and sweeps them on demand.
///
/// Each check runs on its own task, so a panicking check surfaces as a
/// generic problem instead of taking the sweep down with it.
#[derive(Default)]
pub struct ProblemCheckRegistry {
	checks: Vec<Arc<dyn ProblemCheck>>,
}

impl ProblemCheckRegistry {
	pub fn new() -> Self {
		Self { checks: Vec::new() }
	}

	pub fn register(&mut self, check: Arc<dyn ProblemCheck>) {
		self.checks.push(check);
	}

	pub fn check_ids(&self) -> Vec<String> {
		self.checks.iter().map(|c| c.id().to_string()).collect()
	}

	#[instrument(skip(self))]
	pub async fn run_all(&self) -> ChecksReport {
		let handles: Vec<_> = self
			.checks
			.iter()
			.map(|check| {
				let check = Arc::clone(check);
				tokio::spawn(async move { check.check().await })
			})
			.collect();

		let mut reports = Vec::with_capacity(handles.len());
		for (check, handle) in self.checks.iter().zip(handles) {
			let outcome = match handle.await {
				Ok(Ok(outcome)) => outcome,
				Ok(Err(e)) => {
					warn!(check_id = %check.id(), error = %e, "problem check errored");
					check_errored(check.id())
				}
				Err(e) => {
					warn!(check_id = %check.id(), error = %e, "problem check panicked");
					check_errored(check.id())
				}
			};

			reports.push(ProblemReport {
				check_id: check.id().to_string(),
				priority: check.priority(),
				outcome,
				checked_at: Utc::now(),
			});
		}

		ChecksReport::aggregate(reports)
	}
}

/// Generic problem reported for a check that errored or panicked. The
/// underlying error goes to the log, not the dashboard.
fn check_errored(check_id: &str) -> CheckOutcome {
	CheckOutcome::problem(
		"dashboard.problem.check_errored",
		json!({ "check_id": check_id }),
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::check::{CheckPriority, ProblemCheck};
	use crate::error::CheckError;
	use crate::report::DashboardStatus;
	use async_trait::async_trait;

	struct StaticCheck {
		id: &'static str,
		priority: CheckPriority,
		outcome: CheckOutcome,
	}

	#[async_trait]
	impl ProblemCheck for StaticCheck {
		fn id(&self) -> &str {
			self.id
		}

		fn priority(&self) -> CheckPriority {
			self.priority
		}

		async fn check(&self) -> Result<CheckOutcome, CheckError> {
			Ok(self.outcome.clone())
		}
	}

	struct ErroringCheck;

	#[async_trait]
	impl ProblemCheck for ErroringCheck {
		fn id(&self) -> &str {
			"erroring"
		}

		async fn check(&self) -> Result<CheckOutcome, CheckError> {
			Err(CheckError::Failed("connection refused".to_string()))
		}
	}

	struct PanickingCheck;

	#[async_trait]
	impl ProblemCheck for PanickingCheck {
		fn id(&self) -> &str {
			"panicking"
		}

		async fn check(&self) -> Result<CheckOutcome, CheckError> {
			panic!("unexpected");
		}
	}

	fn ok_check(id: &'static str) -> Arc<StaticCheck> {
		Arc::new(StaticCheck {
			id,
			priority: CheckPriority::Low,
			outcome: CheckOutcome::NoProblem,
		})
	}

	#[tokio::test]
	async fn all_checks_appear_in_the_report() {
		let mut registry = ProblemCheckRegistry::new();
		registry.register(ok_check("a"));
		registry.register(ok_check("b"));

		let report = registry.run_all().await;
		assert_eq!(report.reports.len(), 2);
		assert_eq!(report.status, DashboardStatus::Ok);
	}

	#[tokio::test]
	async fn erroring_check_is_isolated() {
		let mut registry = ProblemCheckRegistry::new();
		registry.register(Arc::new(ErroringCheck));
		registry.register(ok_check("healthy"));

		let report = registry.run_all().await;
		assert_eq!(report.reports.len(), 2);

		let errored = report
			.reports
			.iter()
			.find(|r| r.check_id == "erroring")
			.unwrap();
		match &errored.outcome {
			CheckOutcome::Problem { message_key, params } => {
				assert_eq!(message_key, "dashboard.problem.check_errored");
				assert_eq!(params["check_id"], "erroring");
			}
			CheckOutcome::NoProblem => panic!("expected a problem"),
		}

		let healthy = report
			.reports
			.iter()
			.find(|r| r.check_id == "healthy")
			.unwrap();
		assert_eq!(healthy.outcome, CheckOutcome::NoProblem);
	}

	#[tokio::test]
	async fn panicking_check_is_isolated() {
		let mut registry = ProblemCheckRegistry::new();
		registry.register(Arc::new(PanickingCheck));
		registry.register(ok_check("healthy"));

		let report = registry.run_all().await;
		assert_eq!(report.reports.len(), 2);
		assert_eq!(
			report
				.reports
				.iter()
				.filter(|r| r.outcome.is_problem())
				.count(),
			1
		);
	}

	#[tokio::test]
	async fn high_priority_problem_is_critical() {
		let mut registry = ProblemCheckRegistry::new();
		registry.register(Arc::new(StaticCheck {
			id: "disk",
			priority: CheckPriority::High,
			outcome: CheckOutcome::problem("dashboard.problem.disk", serde_json::json!({})),
		}));
		registry.register(ok_check("healthy"));

		let report = registry.run_all().await;
		assert_eq!(report.status, DashboardStatus::Critical);
		assert_eq!(report.reports[0].check_id, "disk");
	}
}
