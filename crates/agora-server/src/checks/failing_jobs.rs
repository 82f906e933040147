// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use std::sync::Arc;

use agora_server_checks::{CheckError, CheckOutcome, CheckPriority, ProblemCheck};
use agora_server_jobs::JobStore;

/// Reports jobs whose consecutive-failure streak reached the threshold.
pub struct FailingJobsCheck {
	store: Arc<JobStore>,
	threshold: u32,
}

impl FailingJobsCheck {
	pub fn new(store: Arc<JobStore>, threshold: u32) -> Self {
		Self { store, threshold }
	}
}

#[async_trait]
impl ProblemCheck for FailingJobsCheck {
	fn id(&self) -> &str {
		"failing-jobs"
	}

	fn priority(&self) -> CheckPriority {
		CheckPriority::High
	}

	async fn check(&self) -> Result<CheckOutcome, CheckError> {
		let definitions = self
			.store
			.list_definitions()
			.await
			.map_err(|e| CheckError::Failed(e.to_string()))?;

		let mut failing = Vec::new();
		for def in &definitions {
			let failures = self
				.store
				.count_consecutive_failures(&def.id)
				.await
				.map_err(|e| CheckError::Failed(e.to_string()))?;
			if failures >= self.threshold {
				failing.push(def.id.clone());
			}
		}

		if failing.is_empty() {
			Ok(CheckOutcome::NoProblem)
		} else {
			Ok(CheckOutcome::problem(
				"dashboard.problem.failing_jobs",
				serde_json::json!({
					"job_ids": failing,
					"threshold": self.threshold
				}),
			))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use agora_server_db::testing::create_test_pool;
	use agora_server_db::{JobDefinition, JobRun, JobStatus, TriggerSource};
	use chrono::Utc;
	use uuid::Uuid;

	async fn store_with_failures(failures: u32) -> Arc<JobStore> {
		let pool = create_test_pool().await;
		let store = Arc::new(JobStore::new(pool));
		store
			.upsert_definition(&JobDefinition {
				id: "j1".to_string(),
				name: "j1".to_string(),
				description: "test".to_string(),
				cadence_secs: 60,
				enabled: true,
			})
			.await
			.unwrap();

		for _ in 0..failures {
			let run = JobRun {
				id: Uuid::new_v4().to_string(),
				job_id: "j1".to_string(),
				status: JobStatus::Running,
				started_at: Utc::now(),
				completed_at: None,
				duration_ms: None,
				error_message: None,
				triggered_by: TriggerSource::Schedule,
				metadata: None,
			};
			store.record_run_start(&run).await.unwrap();
			store
				.record_run_complete(&run.id, JobStatus::Failed, Some("boom".to_string()), None)
				.await
				.unwrap();
		}

		store
	}

	#[tokio::test]
	async fn below_threshold_is_no_problem() {
		let store = store_with_failures(2).await;
		let check = FailingJobsCheck::new(store, 3);
		assert_eq!(check.check().await.unwrap(), CheckOutcome::NoProblem);
	}

	#[tokio::test]
	async fn streak_at_threshold_is_reported() {
		let store = store_with_failures(3).await;
		let check = FailingJobsCheck::new(store, 3);

		match check.check().await.unwrap() {
			CheckOutcome::Problem { params, .. } => {
				assert_eq!(params["job_ids"][0], "j1");
			}
			CheckOutcome::NoProblem => panic!("expected a problem"),
		}
	}
}
