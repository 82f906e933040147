// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::{CancellationToken, JobContext};
use crate::error::{JobError, Result};
use crate::health::{HealthState, JobHealthStatus, JobsHealthStatus, LastRunInfo};
use crate::job::Job;
use crate::types::{JobDefinition, JobRun, JobStatus, JobStore, TriggerSource};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

#[derive(Clone)]
struct RegisteredJob {
	job: Arc<dyn Job>,
	cadence: Duration,
	cancellation_token: CancellationToken,
}

/// Cadence-driven scheduler over a persistent last-run store.
///
/// `tick(now)` is the whole scheduling contract: a job fires when its last
/// claimed slot plus its cadence has passed, the slot claim happens before
/// the handler runs, and a handler failure is logged and leaves the job
/// eligible at its next slot. `start` merely drives `tick` on an interval.
pub struct JobScheduler {
	jobs: HashMap<String, RegisteredJob>,
	store: Arc<JobStore>,
	shutdown_tx: broadcast::Sender<()>,
	handles: Mutex<Vec<JoinHandle<()>>>,
}

impl JobScheduler {
	pub fn new(store: Arc<JobStore>) -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			jobs: HashMap::new(),
			store,
			shutdown_tx,
			handles: Mutex::new(Vec::new()),
		}
	}

	pub fn register(&mut self, job: Arc<dyn Job>, cadence: Duration) {
		let id = job.id().to_string();
		self.jobs.insert(
			id,
			RegisteredJob {
				job,
				cadence,
				cancellation_token: CancellationToken::new(),
			},
		);
	}

	/// Upsert a definition row for every registered job.
	///
	/// Must run before the first `tick`; run rows reference definitions.
	#[instrument(skip(self))]
	pub async fn sync_definitions(&self) -> Result<()> {
		for (job_id, registered) in &self.jobs {
			let def = JobDefinition {
				id: job_id.clone(),
				name: registered.job.name().to_string(),
				description: registered.job.description().to_string(),
				cadence_secs: registered.cadence.as_secs() as i64,
				enabled: true,
			};
			self.store.upsert_definition(&def).await?;
		}
		Ok(())
	}

	/// Fire every job whose due slot has arrived, one after another.
	/// Returns the ids of the jobs that fired.
	#[instrument(skip(self))]
	pub async fn tick(&self, now: DateTime<Utc>) -> Vec<String> {
		let mut fired = Vec::new();
		for (job_id, registered) in &self.jobs {
			if tick_one(job_id, registered, &self.store, now).await {
				fired.push(job_id.clone());
			}
		}
		fired
	}

	/// Drive `tick(Utc::now())` on a fixed interval until shutdown.
	#[instrument(skip(self))]
	pub async fn start(&self, tick_interval: Duration) -> Result<()> {
		self.sync_definitions().await?;

		let snapshot: Vec<(String, RegisteredJob)> = self
			.jobs
			.iter()
			.map(|(id, registered)| (id.clone(), registered.clone()))
			.collect();
		let store = Arc::clone(&self.store);
		let mut shutdown_rx = self.shutdown_tx.subscribe();

		let handle = tokio::spawn(async move {
			let mut interval = tokio::time::interval(tick_interval);
			interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
			loop {
				tokio::select! {
					_ = interval.tick() => {
						let now = Utc::now();
						for (job_id, registered) in &snapshot {
							tick_one(job_id, registered, &store, now).await;
						}
					}
					_ = shutdown_rx.recv() => {
						info!("Shutting down job scheduler loop");
						break;
					}
				}
			}
		});

		self.handles.lock().await.push(handle);
		info!(job_count = self.jobs.len(), "Job scheduler started");
		Ok(())
	}

	/// Run a job out of band, bypassing its cadence. The due slot is left
	/// untouched, so the next scheduled firing is unaffected.
	#[instrument(skip(self))]
	pub async fn trigger(&self, job_id: &str, triggered_by: TriggerSource) -> Result<String> {
		let registered = self
			.jobs
			.get(job_id)
			.ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

		run_job(
			&registered.job,
			&self.store,
			triggered_by,
			&registered.cancellation_token,
		)
		.await
	}

	#[instrument(skip(self))]
	pub async fn cancel_job(&self, job_id: &str) -> Result<()> {
		let registered = self
			.jobs
			.get(job_id)
			.ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

		registered.cancellation_token.cancel();
		Ok(())
	}

	/// Undo [`cancel_job`](Self::cancel_job); the job fires again at its
	/// next due slot.
	#[instrument(skip(self))]
	pub async fn resume_job(&self, job_id: &str) -> Result<()> {
		let registered = self
			.jobs
			.get(job_id)
			.ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

		registered.cancellation_token.reset();
		Ok(())
	}

	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		let _ = self.shutdown_tx.send(());

		let mut handles = self.handles.lock().await;
		for handle in handles.drain(..) {
			let _ = handle.await;
		}

		info!("Job scheduler shut down");
	}

	pub fn job_ids(&self) -> Vec<String> {
		self.jobs.keys().cloned().collect()
	}

	#[instrument(skip(self))]
	pub async fn job_status(&self, job_id: &str) -> Option<JobHealthStatus> {
		let registered = self.jobs.get(job_id)?;

		let last_run = self.store.get_last_run(job_id).await.ok().flatten();
		let consecutive_failures = self
			.store
			.count_consecutive_failures(job_id)
			.await
			.unwrap_or(0);

		let status = HealthState::from_last_run(last_run.as_ref(), consecutive_failures);

		Some(JobHealthStatus {
			job_id: job_id.to_string(),
			name: registered.job.name().to_string(),
			status,
			last_run: last_run.map(LastRunInfo::from),
			consecutive_failures,
		})
	}

	#[instrument(skip(self))]
	pub async fn health_status(&self) -> JobsHealthStatus {
		let mut jobs = Vec::new();
		for job_id in self.jobs.keys() {
			if let Some(status) = self.job_status(job_id).await {
				jobs.push(status);
			}
		}
		JobsHealthStatus::aggregate(jobs)
	}
}

/// Claim and fire one job if its slot is due. Returns whether it fired.
///
/// Store errors and handler errors are both contained here; a broken job
/// or a flaky schedule read never stops sibling jobs in the same tick.
async fn tick_one(
	job_id: &str,
	registered: &RegisteredJob,
	store: &JobStore,
	now: DateTime<Utc>,
) -> bool {
	if registered.cancellation_token.is_cancelled() {
		return false;
	}

	let claimed = match store.claim_due(job_id, now, registered.cadence).await {
		Ok(claimed) => claimed,
		Err(e) => {
			warn!(job_id = %job_id, error = %e, "Failed to read job schedule");
			return false;
		}
	};
	if !claimed {
		return false;
	}

	if let Err(e) = run_job(
		&registered.job,
		store,
		TriggerSource::Schedule,
		&registered.cancellation_token,
	)
	.await
	{
		// Stays eligible at its next cadence slot; no early retry.
		warn!(job_id = %job_id, error = %e, "Job failed");
	}

	true
}

async fn run_job(
	job: &Arc<dyn Job>,
	store: &JobStore,
	triggered_by: TriggerSource,
	cancellation_token: &CancellationToken,
) -> Result<String> {
	let run_id = uuid::Uuid::new_v4().to_string();

	let ctx = JobContext::new(run_id.clone(), triggered_by, cancellation_token.clone());

	let run = JobRun {
		id: run_id.clone(),
		job_id: job.id().to_string(),
		status: JobStatus::Running,
		started_at: Utc::now(),
		completed_at: None,
		duration_ms: None,
		error_message: None,
		triggered_by,
		metadata: None,
	};
	store.record_run_start(&run).await?;

	match job.run(&ctx).await {
		Ok(output) => {
			store
				.record_run_complete(&run_id, JobStatus::Succeeded, None, output.metadata)
				.await?;
			info!(job_id = %job.id(), run_id = %run_id, "Job completed successfully");
			Ok(run_id)
		}
		Err(JobError::Cancelled) => {
			store
				.record_run_complete(&run_id, JobStatus::Cancelled, None, None)
				.await?;
			info!(job_id = %job.id(), run_id = %run_id, "Job cancelled");
			Err(JobError::Cancelled)
		}
		Err(e) => {
			let message = e.to_string();
			store
				.record_run_complete(&run_id, JobStatus::Failed, Some(message.clone()), None)
				.await?;
			warn!(job_id = %job.id(), run_id = %run_id, error = %message, "Job failed");
			Err(e)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::JobOutput;
	use agora_server_db::testing::create_test_pool;
	use async_trait::async_trait;
	use chrono::Duration as ChronoDuration;
	use std::sync::atomic::{AtomicUsize, Ordering};

	struct CountingJob {
		id: String,
		runs: AtomicUsize,
		fail: bool,
	}

	impl CountingJob {
		fn new(id: &str) -> Arc<Self> {
			Arc::new(Self {
				id: id.to_string(),
				runs: AtomicUsize::new(0),
				fail: false,
			})
		}

		fn failing(id: &str) -> Arc<Self> {
			Arc::new(Self {
				id: id.to_string(),
				runs: AtomicUsize::new(0),
				fail: true,
			})
		}

		fn run_count(&self) -> usize {
			self.runs.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl Job for CountingJob {
		fn id(&self) -> &str {
			&self.id
		}

		fn name(&self) -> &str {
			&self.id
		}

		fn description(&self) -> &str {
			"a counting job for tests"
		}

		async fn run(&self, _ctx: &JobContext) -> std::result::Result<JobOutput, JobError> {
			self.runs.fetch_add(1, Ordering::SeqCst);
			if self.fail {
				return Err(JobError::Failed {
					message: "boom".to_string(),
				});
			}
			Ok(JobOutput {
				message: "done".to_string(),
				metadata: None,
			})
		}
	}

	async fn scheduler_with(jobs: Vec<(Arc<CountingJob>, Duration)>) -> (JobScheduler, Arc<JobStore>) {
		let pool = create_test_pool().await;
		let store = Arc::new(JobStore::new(pool));
		let mut scheduler = JobScheduler::new(Arc::clone(&store));
		for (job, cadence) in jobs {
			scheduler.register(job, cadence);
		}
		scheduler.sync_definitions().await.unwrap();
		(scheduler, store)
	}

	#[tokio::test]
	async fn tick_fires_due_job_exactly_once() {
		let job = CountingJob::new("cleanup");
		let (scheduler, _store) =
			scheduler_with(vec![(Arc::clone(&job), Duration::from_secs(86400))]).await;

		let now = Utc::now();
		let fired = scheduler.tick(now).await;
		assert_eq!(fired, vec!["cleanup".to_string()]);
		assert_eq!(job.run_count(), 1);

		// Second tick in the same minute: the slot is already claimed.
		let fired = scheduler.tick(now + ChronoDuration::seconds(30)).await;
		assert!(fired.is_empty());
		assert_eq!(job.run_count(), 1);
	}

	#[tokio::test]
	async fn tick_fires_again_after_cadence() {
		let job = CountingJob::new("cleanup");
		let (scheduler, _store) =
			scheduler_with(vec![(Arc::clone(&job), Duration::from_secs(86400))]).await;

		let yesterday = Utc::now() - ChronoDuration::hours(25);
		scheduler.tick(yesterday).await;
		assert_eq!(job.run_count(), 1);

		let fired = scheduler.tick(Utc::now()).await;
		assert_eq!(fired.len(), 1);
		assert_eq!(job.run_count(), 2);
	}

	#[tokio::test]
	async fn failing_job_does_not_block_siblings() {
		let bad = CountingJob::failing("bad");
		let good = CountingJob::new("good");
		let (scheduler, store) = scheduler_with(vec![
			(Arc::clone(&bad), Duration::from_secs(60)),
			(Arc::clone(&good), Duration::from_secs(60)),
		])
		.await;

		let fired = scheduler.tick(Utc::now()).await;
		assert_eq!(fired.len(), 2);
		assert_eq!(bad.run_count(), 1);
		assert_eq!(good.run_count(), 1);

		let last = store.get_last_run("bad").await.unwrap().unwrap();
		assert_eq!(last.status, JobStatus::Failed);
		let last = store.get_last_run("good").await.unwrap().unwrap();
		assert_eq!(last.status, JobStatus::Succeeded);
	}

	#[tokio::test]
	async fn failed_job_waits_for_next_slot() {
		let bad = CountingJob::failing("bad");
		let (scheduler, _store) =
			scheduler_with(vec![(Arc::clone(&bad), Duration::from_secs(3600))]).await;

		let now = Utc::now();
		scheduler.tick(now).await;
		assert_eq!(bad.run_count(), 1);

		// No retry before the next cadence slot.
		scheduler.tick(now + ChronoDuration::minutes(5)).await;
		assert_eq!(bad.run_count(), 1);

		scheduler.tick(now + ChronoDuration::minutes(61)).await;
		assert_eq!(bad.run_count(), 2);
	}

	#[tokio::test]
	async fn cancelled_job_is_skipped() {
		let job = CountingJob::new("cleanup");
		let (scheduler, _store) =
			scheduler_with(vec![(Arc::clone(&job), Duration::from_secs(60))]).await;

		scheduler.cancel_job("cleanup").await.unwrap();
		let fired = scheduler.tick(Utc::now()).await;
		assert!(fired.is_empty());
		assert_eq!(job.run_count(), 0);

		// Resuming makes the job eligible again; the skipped slot was
		// never claimed, so it fires on the next tick.
		scheduler.resume_job("cleanup").await.unwrap();
		let fired = scheduler.tick(Utc::now()).await;
		assert_eq!(fired.len(), 1);
		assert_eq!(job.run_count(), 1);
	}

	#[tokio::test]
	async fn trigger_runs_outside_cadence() {
		let job = CountingJob::new("cleanup");
		let (scheduler, store) =
			scheduler_with(vec![(Arc::clone(&job), Duration::from_secs(60))]).await;

		let run_id = scheduler
			.trigger("cleanup", TriggerSource::Manual)
			.await
			.unwrap();
		assert_eq!(job.run_count(), 1);

		let last = store.get_last_run("cleanup").await.unwrap().unwrap();
		assert_eq!(last.id, run_id);
		assert_eq!(last.triggered_by, TriggerSource::Manual);

		// The due slot was not consumed by the manual run.
		let fired = scheduler.tick(Utc::now()).await;
		assert_eq!(fired.len(), 1);
	}

	#[tokio::test]
	async fn trigger_unknown_job_is_not_found() {
		let (scheduler, _store) = scheduler_with(vec![]).await;

		let result = scheduler.trigger("nope", TriggerSource::Manual).await;
		match result {
			Err(JobError::NotFound(id)) => assert_eq!(id, "nope"),
			other => panic!("expected NotFound, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn health_reflects_failure_streak() {
		let bad = CountingJob::failing("bad");
		let (scheduler, _store) =
			scheduler_with(vec![(Arc::clone(&bad), Duration::from_secs(1))]).await;

		let mut at = Utc::now() - ChronoDuration::seconds(10);
		for _ in 0..3 {
			at += ChronoDuration::seconds(2);
			scheduler.tick(at).await;
		}
		assert_eq!(bad.run_count(), 3);

		let health = scheduler.health_status().await;
		assert_eq!(health.status, HealthState::Unhealthy);
		assert_eq!(health.jobs.len(), 1);
		assert_eq!(health.jobs[0].consecutive_failures, 3);
	}
}
