// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use agora_server_checks::{CheckError, CheckOutcome, CheckPriority, ProblemCheck};
use agora_server_jobs::JobStore;

/// Reports jobs whose due slot went unclaimed past the grace margin, which
/// usually means the scheduler loop is wedged or the process is down.
pub struct StaleJobsCheck {
	store: Arc<JobStore>,
	margin: Duration,
}

impl StaleJobsCheck {
	pub fn new(store: Arc<JobStore>, margin: Duration) -> Self {
		Self { store, margin }
	}
}

#[async_trait]
impl ProblemCheck for StaleJobsCheck {
	fn id(&self) -> &str {
		"stale-jobs"
	}

	fn priority(&self) -> CheckPriority {
		CheckPriority::Low
	}

	async fn check(&self) -> Result<CheckOutcome, CheckError> {
		let overdue = self
			.store
			.overdue_jobs(Utc::now(), self.margin)
			.await
			.map_err(|e| CheckError::Failed(e.to_string()))?;

		if overdue.is_empty() {
			Ok(CheckOutcome::NoProblem)
		} else {
			Ok(CheckOutcome::problem(
				"dashboard.problem.stale_jobs",
				serde_json::json!({ "job_ids": overdue }),
			))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use agora_server_db::testing::create_test_pool;
	use agora_server_db::JobDefinition;
	use chrono::Duration as ChronoDuration;

	#[tokio::test]
	async fn overdue_job_is_reported() {
		let pool = create_test_pool().await;
		let store = Arc::new(JobStore::new(pool));
		store
			.upsert_definition(&JobDefinition {
				id: "j1".to_string(),
				name: "j1".to_string(),
				description: "test".to_string(),
				cadence_secs: 3600,
				enabled: true,
			})
			.await
			.unwrap();
		store
			.claim_due(
				"j1",
				Utc::now() - ChronoDuration::hours(3),
				Duration::from_secs(3600),
			)
			.await
			.unwrap();

		let check = StaleJobsCheck::new(store, Duration::from_secs(300));
		match check.check().await.unwrap() {
			CheckOutcome::Problem { params, .. } => {
				assert_eq!(params["job_ids"][0], "j1");
			}
			CheckOutcome::NoProblem => panic!("expected a problem"),
		}
	}

	#[tokio::test]
	async fn recently_claimed_job_is_clean() {
		let pool = create_test_pool().await;
		let store = Arc::new(JobStore::new(pool));
		store
			.upsert_definition(&JobDefinition {
				id: "j1".to_string(),
				name: "j1".to_string(),
				description: "test".to_string(),
				cadence_secs: 3600,
				enabled: true,
			})
			.await
			.unwrap();
		store
			.claim_due("j1", Utc::now(), Duration::from_secs(3600))
			.await
			.unwrap();

		let check = StaleJobsCheck::new(store, Duration::from_secs(300));
		assert_eq!(check.check().await.unwrap(), CheckOutcome::NoProblem);
	}
}
