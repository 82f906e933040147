// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use agora_server_db::FlagStore;
use agora_server_jobs::{Job, JobContext, JobError, JobOutput};

/// Deletes handled flags past the retention window, a bounded batch per
/// firing.
pub struct FlagHistoryCleanupJob {
	store: FlagStore,
	retention_days: u32,
	batch_limit: u32,
}

impl FlagHistoryCleanupJob {
	pub fn new(store: FlagStore, retention_days: u32, batch_limit: u32) -> Self {
		Self {
			store,
			retention_days,
			batch_limit,
		}
	}
}

#[async_trait]
impl Job for FlagHistoryCleanupJob {
	fn id(&self) -> &str {
		"flag-history-cleanup"
	}

	fn name(&self) -> &str {
		"Flag History Cleanup"
	}

	fn description(&self) -> &str {
		"Removes handled flags past the retention window"
	}

	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		ctx.ensure_active()?;

		let deleted = self
			.store
			.delete_handled_older_than(self.retention_days, self.batch_limit)
			.await
			.map_err(|e| JobError::Failed {
				message: format!("flag history cleanup failed: {e}"),
			})?;

		tracing::info!(
			deleted,
			retention_days = self.retention_days,
			"Flag history cleanup completed"
		);
		Ok(JobOutput {
			message: format!("Deleted {deleted} handled flags"),
			metadata: Some(serde_json::json!({
				"deleted_count": deleted,
				"retention_days": self.retention_days
			})),
		})
	}
}
