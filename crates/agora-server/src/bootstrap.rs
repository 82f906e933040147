// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wiring: stores, the scheduler with its job roster, and the check
//! registry, all built from the resolved configuration.

use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use agora_server_checks::ProblemCheckRegistry;
use agora_server_config::{ChecksConfig, JobsConfig};
use agora_server_db::{FlagStore, JobStore, UploadStore};
use agora_server_jobs::JobScheduler;
use agora_server_services::ServiceAuditSink;

use crate::checks::{DatabaseCheck, FailingJobsCheck, StaleJobsCheck, UploadBacklogCheck};
use crate::jobs::{
	FlagAutoDismissJob, FlagHistoryCleanupJob, JobHistoryCleanupJob, UploadReprocessJob,
};
use crate::services::review_flag_pipeline;

const HOUR: Duration = Duration::from_secs(3600);
const DAY: Duration = Duration::from_secs(86400);

pub struct Stores {
	pub jobs: Arc<JobStore>,
	pub flags: FlagStore,
	pub uploads: UploadStore,
}

pub fn build_stores(pool: &SqlitePool) -> Stores {
	Stores {
		jobs: Arc::new(JobStore::new(pool.clone())),
		flags: FlagStore::new(pool.clone()),
		uploads: UploadStore::new(pool.clone()),
	}
}

pub fn build_scheduler(
	stores: &Stores,
	config: &JobsConfig,
	audit: Arc<dyn ServiceAuditSink>,
) -> JobScheduler {
	let mut scheduler = JobScheduler::new(Arc::clone(&stores.jobs));

	scheduler.register(
		Arc::new(FlagHistoryCleanupJob::new(
			stores.flags.clone(),
			config.flag_retention_days,
			config.flag_cleanup_batch,
		)),
		DAY,
	);
	scheduler.register(
		Arc::new(FlagAutoDismissJob::new(
			stores.flags.clone(),
			review_flag_pipeline(stores.flags.clone(), audit),
			config.flag_auto_dismiss_days,
			config.flag_cleanup_batch,
		)),
		DAY,
	);
	scheduler.register(
		Arc::new(UploadReprocessJob::new(
			stores.uploads.clone(),
			config.upload_stale_days,
			config.upload_reprocess_batch,
		)),
		HOUR,
	);
	scheduler.register(
		Arc::new(JobHistoryCleanupJob::new(
			Arc::clone(&stores.jobs),
			config.history_retention_days,
			config.history_cleanup_batch,
		)),
		DAY,
	);

	scheduler
}

pub fn build_check_registry(
	pool: &SqlitePool,
	stores: &Stores,
	checks: &ChecksConfig,
	jobs: &JobsConfig,
) -> ProblemCheckRegistry {
	let mut registry = ProblemCheckRegistry::new();

	registry.register(Arc::new(DatabaseCheck::new(pool.clone())));
	registry.register(Arc::new(FailingJobsCheck::new(
		Arc::clone(&stores.jobs),
		checks.failing_threshold,
	)));
	registry.register(Arc::new(StaleJobsCheck::new(
		Arc::clone(&stores.jobs),
		Duration::from_secs(checks.stale_margin_secs),
	)));
	registry.register(Arc::new(UploadBacklogCheck::new(
		stores.uploads.clone(),
		jobs.upload_stale_days,
		checks.upload_backlog_threshold,
	)));

	registry
}
