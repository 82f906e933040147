// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use agora_server_jobs::{Job, JobContext, JobError, JobOutput, JobStore};
use std::sync::Arc;

/// Prunes old job-run history so the runs table stays bounded.
pub struct JobHistoryCleanupJob {
	store: Arc<JobStore>,
	retention_days: u32,
	batch_limit: u32,
}

impl JobHistoryCleanupJob {
	pub fn new(store: Arc<JobStore>, retention_days: u32, batch_limit: u32) -> Self {
		Self {
			store,
			retention_days,
			batch_limit,
		}
	}
}

#[async_trait]
impl Job for JobHistoryCleanupJob {
	fn id(&self) -> &str {
		"job-history-cleanup"
	}

	fn name(&self) -> &str {
		"Job History Cleanup"
	}

	fn description(&self) -> &str {
		"Removes old job run history entries"
	}

	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		ctx.ensure_active()?;

		let deleted = self
			.store
			.cleanup_old_runs(self.retention_days, self.batch_limit)
			.await
			.map_err(|e| JobError::Failed {
				message: format!("job history cleanup failed: {e}"),
			})?;

		tracing::info!(
			deleted,
			retention_days = self.retention_days,
			"Job history cleanup completed"
		);
		Ok(JobOutput {
			message: format!("Cleaned up {deleted} old job run records"),
			metadata: Some(serde_json::json!({
				"deleted_count": deleted,
				"retention_days": self.retention_days
			})),
		})
	}
}
