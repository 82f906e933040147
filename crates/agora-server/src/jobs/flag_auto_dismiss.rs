// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use agora_server_db::FlagStore;
use agora_server_jobs::{Job, JobContext, JobError, JobOutput};
use agora_server_services::{Actor, ServicePipeline};

/// Dismisses pending flags nobody reviewed within the age window, going
/// through the same review pipeline a moderator would, as the system actor.
pub struct FlagAutoDismissJob {
	store: FlagStore,
	pipeline: ServicePipeline,
	older_than_days: u32,
	batch_limit: u32,
}

impl FlagAutoDismissJob {
	pub fn new(
		store: FlagStore,
		pipeline: ServicePipeline,
		older_than_days: u32,
		batch_limit: u32,
	) -> Self {
		Self {
			store,
			pipeline,
			older_than_days,
			batch_limit,
		}
	}
}

#[async_trait]
impl Job for FlagAutoDismissJob {
	fn id(&self) -> &str {
		"flag-auto-dismiss"
	}

	fn name(&self) -> &str {
		"Flag Auto Dismiss"
	}

	fn description(&self) -> &str {
		"Dismisses pending flags that sat unreviewed past the age window"
	}

	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		ctx.ensure_active()?;

		let stale = self
			.store
			.stale_pending(self.older_than_days, self.batch_limit)
			.await
			.map_err(|e| JobError::Failed {
				message: format!("stale flag lookup failed: {e}"),
			})?;

		let mut dismissed = 0u64;
		for flag_id in &stale {
			let params = serde_json::json!({ "flag_id": flag_id, "action": "dismiss" });
			let outcome = self
				.pipeline
				.run(self.store.pool(), Actor::system(), params)
				.await;
			if outcome.is_success() {
				dismissed += 1;
			} else {
				tracing::warn!(
					flag_id = %flag_id,
					outcome = outcome.label(),
					"Auto-dismiss skipped a flag"
				);
			}
		}

		tracing::info!(
			dismissed,
			considered = stale.len(),
			older_than_days = self.older_than_days,
			"Flag auto-dismiss completed"
		);
		Ok(JobOutput {
			message: format!("Dismissed {dismissed} stale flags"),
			metadata: Some(serde_json::json!({
				"dismissed_count": dismissed,
				"considered_count": stale.len()
			})),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::services::review_flag_pipeline;
	use agora_server_db::testing::{create_test_pool, insert_flag};
	use agora_server_db::FlagStatus;
	use agora_server_jobs::{CancellationToken, TriggerSource};
	use chrono::{Duration as ChronoDuration, Utc};
	use std::sync::Arc;

	#[tokio::test]
	async fn dismisses_only_stale_pending_flags() {
		let pool = create_test_pool().await;
		let store = FlagStore::new(pool.clone());

		insert_flag(&store, "old", FlagStatus::Pending).await;
		insert_flag(&store, "fresh", FlagStatus::Pending).await;

		let month_ago = Utc::now() - ChronoDuration::days(35);
		sqlx::query("UPDATE flags SET created_at = ? WHERE id = 'old'")
			.bind(month_ago)
			.execute(&pool)
			.await
			.unwrap();

		let pipeline = review_flag_pipeline(
			store.clone(),
			Arc::new(agora_server_services::TracingAuditSink),
		);
		let job = FlagAutoDismissJob::new(store.clone(), pipeline, 30, 100);
		let ctx = JobContext::new("run-1", TriggerSource::Schedule, CancellationToken::new());

		let output = job.run(&ctx).await.unwrap();
		assert_eq!(output.metadata.unwrap()["dismissed_count"], 1);

		let old = store.get("old").await.unwrap().unwrap();
		assert_eq!(old.status, FlagStatus::Dismissed);
		assert_eq!(old.handled_by.as_deref(), Some("system"));

		let fresh = store.get("fresh").await.unwrap().unwrap();
		assert_eq!(fresh.status, FlagStatus::Pending);

		// The dismissal went through the review pipeline, so it is logged.
		assert_eq!(store.count_reviews("old").await.unwrap(), 1);
	}
}
