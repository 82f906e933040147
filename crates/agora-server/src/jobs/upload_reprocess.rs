// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use agora_server_db::UploadStore;
use agora_server_jobs::{Job, JobContext, JobError, JobOutput};

/// Refreshes derived upload metadata on a rolling window: each firing takes
/// the oldest stale uploads, a bounded batch at a time.
pub struct UploadReprocessJob {
	store: UploadStore,
	stale_days: u32,
	batch_limit: u32,
}

impl UploadReprocessJob {
	pub fn new(store: UploadStore, stale_days: u32, batch_limit: u32) -> Self {
		Self {
			store,
			stale_days,
			batch_limit,
		}
	}
}

#[async_trait]
impl Job for UploadReprocessJob {
	fn id(&self) -> &str {
		"upload-reprocess"
	}

	fn name(&self) -> &str {
		"Upload Reprocess"
	}

	fn description(&self) -> &str {
		"Refreshes derived metadata for stale uploads"
	}

	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		ctx.ensure_active()?;

		let reprocessed = self
			.store
			.reprocess_stale(self.stale_days, self.batch_limit)
			.await
			.map_err(|e| JobError::Failed {
				message: format!("upload reprocess failed: {e}"),
			})?;

		tracing::info!(
			reprocessed,
			stale_days = self.stale_days,
			"Upload reprocess completed"
		);
		Ok(JobOutput {
			message: format!("Reprocessed {reprocessed} uploads"),
			metadata: Some(serde_json::json!({
				"reprocessed_count": reprocessed,
				"batch_limit": self.batch_limit
			})),
		})
	}
}
