// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use agora_server_checks::{CheckError, CheckOutcome, CheckPriority, ProblemCheck};
use agora_server_db::UploadStore;

/// Reports when the reprocess backlog outgrows what the upload-reprocess
/// job can drain at its current batch size.
pub struct UploadBacklogCheck {
	store: UploadStore,
	stale_days: u32,
	threshold: u64,
}

impl UploadBacklogCheck {
	pub fn new(store: UploadStore, stale_days: u32, threshold: u64) -> Self {
		Self {
			store,
			stale_days,
			threshold,
		}
	}
}

#[async_trait]
impl ProblemCheck for UploadBacklogCheck {
	fn id(&self) -> &str {
		"upload-backlog"
	}

	fn priority(&self) -> CheckPriority {
		CheckPriority::Low
	}

	async fn check(&self) -> Result<CheckOutcome, CheckError> {
		let backlog = self
			.store
			.count_stale(self.stale_days)
			.await
			.map_err(|e| CheckError::Failed(e.to_string()))?;

		if backlog <= self.threshold {
			Ok(CheckOutcome::NoProblem)
		} else {
			Ok(CheckOutcome::problem(
				"dashboard.problem.upload_backlog",
				serde_json::json!({
					"backlog": backlog,
					"threshold": self.threshold
				}),
			))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use agora_server_db::testing::{create_test_pool, insert_upload};

	#[tokio::test]
	async fn backlog_over_threshold_is_reported() {
		let pool = create_test_pool().await;
		let store = UploadStore::new(pool);
		for i in 0..4 {
			insert_upload(&store, &format!("u{i}"), None).await;
		}

		let check = UploadBacklogCheck::new(store.clone(), 30, 3);
		assert!(check.check().await.unwrap().is_problem());

		let check = UploadBacklogCheck::new(store, 30, 10);
		assert_eq!(check.check().await.unwrap(), CheckOutcome::NoProblem);
	}
}
