// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job schedule and run-history store.
//!
//! The `job_schedule` table is the persistent last-run store for the
//! scheduler: a due slot is claimed with a single conditional upsert, so two
//! ticks racing on the same slot (same process or another process sharing
//! the database) resolve to exactly one firing.

use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::time::Duration;

use crate::error::{DbError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
	Running,
	Succeeded,
	Failed,
	Cancelled,
}

impl JobStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			JobStatus::Running => "running",
			JobStatus::Succeeded => "succeeded",
			JobStatus::Failed => "failed",
			JobStatus::Cancelled => "cancelled",
		}
	}
}

impl std::str::FromStr for JobStatus {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"running" => Ok(JobStatus::Running),
			"succeeded" => Ok(JobStatus::Succeeded),
			"failed" => Ok(JobStatus::Failed),
			"cancelled" => Ok(JobStatus::Cancelled),
			_ => Err(format!("unknown job status: {s}")),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
	Schedule,
	Manual,
}

impl TriggerSource {
	pub fn as_str(&self) -> &'static str {
		match self {
			TriggerSource::Schedule => "schedule",
			TriggerSource::Manual => "manual",
		}
	}
}

impl std::str::FromStr for TriggerSource {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"schedule" => Ok(TriggerSource::Schedule),
			"manual" => Ok(TriggerSource::Manual),
			_ => Err(format!("unknown trigger source: {s}")),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
	pub id: String,
	pub name: String,
	pub description: String,
	pub cadence_secs: i64,
	pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
	pub id: String,
	pub job_id: String,
	pub status: JobStatus,
	pub started_at: DateTime<Utc>,
	pub completed_at: Option<DateTime<Utc>>,
	pub duration_ms: Option<i64>,
	pub error_message: Option<String>,
	pub triggered_by: TriggerSource,
	pub metadata: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct JobStore {
	pool: SqlitePool,
}

impl JobStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, def), fields(job_id = %def.id))]
	pub async fn upsert_definition(&self, def: &JobDefinition) -> Result<()> {
		let now = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
		sqlx::query(
			r#"
			INSERT INTO job_definitions (id, name, description, cadence_secs, enabled, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT(id) DO UPDATE SET
				name = excluded.name,
				description = excluded.description,
				cadence_secs = excluded.cadence_secs,
				enabled = excluded.enabled,
				updated_at = excluded.updated_at
			"#,
		)
		.bind(&def.id)
		.bind(&def.name)
		.bind(&def.description)
		.bind(def.cadence_secs)
		.bind(def.enabled)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_definition(&self, id: &str) -> Result<Option<JobDefinition>> {
		let row = sqlx::query_as::<_, (String, String, String, i64, bool)>(
			"SELECT id, name, description, cadence_secs, enabled FROM job_definitions WHERE id = ?",
		)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(
			row.map(|(id, name, description, cadence_secs, enabled)| JobDefinition {
				id,
				name,
				description,
				cadence_secs,
				enabled,
			}),
		)
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_definitions(&self) -> Result<Vec<JobDefinition>> {
		let rows = sqlx::query_as::<_, (String, String, String, i64, bool)>(
			"SELECT id, name, description, cadence_secs, enabled FROM job_definitions ORDER BY name",
		)
		.fetch_all(&self.pool)
		.await?;

		Ok(
			rows
				.into_iter()
				.map(|(id, name, description, cadence_secs, enabled)| JobDefinition {
					id,
					name,
					description,
					cadence_secs,
					enabled,
				})
				.collect(),
		)
	}

	#[tracing::instrument(skip(self))]
	pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<()> {
		let result = sqlx::query("UPDATE job_definitions SET enabled = ? WHERE id = ?")
			.bind(enabled)
			.bind(id)
			.execute(&self.pool)
			.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(id.to_string()));
		}

		Ok(())
	}

	/// Claim the due slot for a job, atomically updating its last-run mark.
	///
	/// Returns `true` when the job was due (`last_run + cadence <= now`, or
	/// no run recorded yet) and this caller won the claim. A second call for
	/// the same slot loses the conditional upsert and returns `false`, which
	/// is what keeps one due slot from firing twice across racing ticks.
	#[tracing::instrument(skip(self))]
	pub async fn claim_due(
		&self,
		job_id: &str,
		now: DateTime<Utc>,
		cadence: Duration,
	) -> Result<bool> {
		let cadence = ChronoDuration::from_std(cadence)
			.map_err(|e| DbError::Internal(format!("cadence out of range: {e}")))?;
		let due_before = now - cadence;

		let result = sqlx::query(
			r#"
			INSERT INTO job_schedule (job_id, last_run_at)
			VALUES (?1, ?2)
			ON CONFLICT(job_id) DO UPDATE SET last_run_at = excluded.last_run_at
			WHERE julianday(job_schedule.last_run_at) <= julianday(?3)
			"#,
		)
		.bind(job_id)
		.bind(now)
		.bind(due_before)
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	#[tracing::instrument(skip(self))]
	pub async fn last_run_at(&self, job_id: &str) -> Result<Option<DateTime<Utc>>> {
		let row = sqlx::query_as::<_, (DateTime<Utc>,)>(
			"SELECT last_run_at FROM job_schedule WHERE job_id = ?",
		)
		.bind(job_id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(row.map(|(at,)| at))
	}

	/// Jobs whose last claimed slot (or registration, if never claimed) is
	/// older than cadence plus the grace margin.
	#[tracing::instrument(skip(self))]
	pub async fn overdue_jobs(
		&self,
		now: DateTime<Utc>,
		margin: Duration,
	) -> Result<Vec<String>> {
		let margin_secs = margin.as_secs() as i64;
		let rows = sqlx::query_as::<_, (String,)>(
			r#"
			SELECT d.id
			FROM job_definitions d
			LEFT JOIN job_schedule s ON s.job_id = d.id
			WHERE d.enabled = 1
			  AND julianday(COALESCE(s.last_run_at, d.created_at))
			      < julianday(?1) - (d.cadence_secs + ?2) / 86400.0
			ORDER BY d.id
			"#,
		)
		.bind(now)
		.bind(margin_secs)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(|(id,)| id).collect())
	}

	#[tracing::instrument(skip(self, run), fields(run_id = %run.id, job_id = %run.job_id))]
	pub async fn record_run_start(&self, run: &JobRun) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO job_runs (id, job_id, status, started_at, triggered_by)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(&run.id)
		.bind(&run.job_id)
		.bind(run.status.as_str())
		.bind(run.started_at)
		.bind(run.triggered_by.as_str())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self, metadata))]
	pub async fn record_run_complete(
		&self,
		run_id: &str,
		status: JobStatus,
		error: Option<String>,
		metadata: Option<serde_json::Value>,
	) -> Result<()> {
		let now = Utc::now();
		let metadata_str = metadata.map(|m| m.to_string());

		sqlx::query(
			r#"
			UPDATE job_runs
			SET status = ?,
			    completed_at = ?,
			    duration_ms = CAST((julianday(?) - julianday(started_at)) * 86400000 AS INTEGER),
			    error_message = ?,
			    metadata = ?
			WHERE id = ?
			"#,
		)
		.bind(status.as_str())
		.bind(now)
		.bind(now)
		.bind(error)
		.bind(metadata_str)
		.bind(run_id)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_last_run(&self, job_id: &str) -> Result<Option<JobRun>> {
		type Row = (
			String,
			String,
			String,
			DateTime<Utc>,
			Option<DateTime<Utc>>,
			Option<i64>,
			Option<String>,
			String,
			Option<String>,
		);

		let row = sqlx::query_as::<_, Row>(
			r#"
			SELECT id, job_id, status, started_at, completed_at, duration_ms, error_message, triggered_by, metadata
			FROM job_runs
			WHERE job_id = ?
			ORDER BY started_at DESC
			LIMIT 1
			"#,
		)
		.bind(job_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(Self::run_from_row).transpose()
	}

	/// Count failed runs since the last run that finished in any other state.
	#[tracing::instrument(skip(self))]
	pub async fn count_consecutive_failures(&self, job_id: &str) -> Result<u32> {
		let (count,): (i64,) = sqlx::query_as(
			r#"
			SELECT COUNT(*)
			FROM job_runs
			WHERE job_id = ?1
			  AND status = 'failed'
			  AND started_at > COALESCE(
			      (SELECT MAX(started_at) FROM job_runs
			       WHERE job_id = ?1 AND status IN ('succeeded', 'cancelled')),
			      '')
			"#,
		)
		.bind(job_id)
		.fetch_one(&self.pool)
		.await?;

		Ok(count as u32)
	}

	/// Delete completed runs older than the retention window, at most
	/// `batch_limit` rows per call.
	#[tracing::instrument(skip(self))]
	pub async fn cleanup_old_runs(&self, retention_days: u32, batch_limit: u32) -> Result<u64> {
		let cutoff = Utc::now() - ChronoDuration::days(retention_days as i64);

		let result = sqlx::query(
			r#"
			DELETE FROM job_runs
			WHERE id IN (
				SELECT id FROM job_runs
				WHERE completed_at IS NOT NULL
				  AND julianday(completed_at) < julianday(?)
				ORDER BY completed_at
				LIMIT ?
			)
			"#,
		)
		.bind(cutoff)
		.bind(batch_limit as i64)
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected())
	}

	fn run_from_row(
		(id, job_id, status, started_at, completed_at, duration_ms, error_message, triggered_by, metadata): (
			String,
			String,
			String,
			DateTime<Utc>,
			Option<DateTime<Utc>>,
			Option<i64>,
			Option<String>,
			String,
			Option<String>,
		),
	) -> Result<JobRun> {
		let status = status
			.parse::<JobStatus>()
			.map_err(DbError::Internal)?;
		let triggered_by = triggered_by
			.parse::<TriggerSource>()
			.map_err(DbError::Internal)?;
		let metadata = metadata
			.map(|m| serde_json::from_str(&m))
			.transpose()?;

		Ok(JobRun {
			id,
			job_id,
			status,
			started_at,
			completed_at,
			duration_ms,
			error_message,
			triggered_by,
			metadata,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;
	use uuid::Uuid;

	fn definition(id: &str, cadence_secs: i64) -> JobDefinition {
		JobDefinition {
			id: id.to_string(),
			name: id.to_string(),
			description: "test job".to_string(),
			cadence_secs,
			enabled: true,
		}
	}

	fn run(job_id: &str, status: JobStatus) -> JobRun {
		JobRun {
			id: Uuid::new_v4().to_string(),
			job_id: job_id.to_string(),
			status,
			started_at: Utc::now(),
			completed_at: None,
			duration_ms: None,
			error_message: None,
			triggered_by: TriggerSource::Schedule,
			metadata: None,
		}
	}

	async fn record(store: &JobStore, job_id: &str, status: JobStatus) {
		let r = run(job_id, JobStatus::Running);
		store.record_run_start(&r).await.unwrap();
		store
			.record_run_complete(&r.id, status, None, None)
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn claim_due_fires_when_never_run() {
		let pool = create_test_pool().await;
		let store = JobStore::new(pool);
		store.upsert_definition(&definition("j1", 60)).await.unwrap();

		let now = Utc::now();
		assert!(store
			.claim_due("j1", now, Duration::from_secs(60))
			.await
			.unwrap());
	}

	#[tokio::test]
	async fn claim_due_never_fires_twice_for_same_slot() {
		let pool = create_test_pool().await;
		let store = JobStore::new(pool);
		store.upsert_definition(&definition("j1", 60)).await.unwrap();

		let now = Utc::now();
		assert!(store
			.claim_due("j1", now, Duration::from_secs(60))
			.await
			.unwrap());
		// Second tick within the same minute loses the claim.
		assert!(!store
			.claim_due("j1", now + ChronoDuration::seconds(5), Duration::from_secs(60))
			.await
			.unwrap());
	}

	#[tokio::test]
	async fn claim_due_fires_once_cadence_elapsed() {
		let pool = create_test_pool().await;
		let store = JobStore::new(pool);
		store.upsert_definition(&definition("j1", 86400)).await.unwrap();

		let yesterday = Utc::now() - ChronoDuration::hours(25);
		assert!(store
			.claim_due("j1", yesterday, Duration::from_secs(86400))
			.await
			.unwrap());

		let today = Utc::now();
		assert!(store
			.claim_due("j1", today, Duration::from_secs(86400))
			.await
			.unwrap());
		assert!(!store
			.claim_due("j1", today, Duration::from_secs(86400))
			.await
			.unwrap());
	}

	#[tokio::test]
	async fn last_run_at_reflects_claim() {
		let pool = create_test_pool().await;
		let store = JobStore::new(pool);
		store.upsert_definition(&definition("j1", 60)).await.unwrap();

		assert!(store.last_run_at("j1").await.unwrap().is_none());

		let now = Utc::now();
		store
			.claim_due("j1", now, Duration::from_secs(60))
			.await
			.unwrap();

		let recorded = store.last_run_at("j1").await.unwrap().unwrap();
		assert!((recorded - now).num_milliseconds().abs() < 1000);
	}

	#[tokio::test]
	async fn consecutive_failures_reset_by_success() {
		let pool = create_test_pool().await;
		let store = JobStore::new(pool);
		store.upsert_definition(&definition("j1", 60)).await.unwrap();

		record(&store, "j1", JobStatus::Failed).await;
		record(&store, "j1", JobStatus::Failed).await;
		assert_eq!(store.count_consecutive_failures("j1").await.unwrap(), 2);

		record(&store, "j1", JobStatus::Succeeded).await;
		assert_eq!(store.count_consecutive_failures("j1").await.unwrap(), 0);

		record(&store, "j1", JobStatus::Failed).await;
		assert_eq!(store.count_consecutive_failures("j1").await.unwrap(), 1);
	}

	#[tokio::test]
	async fn cleanup_old_runs_is_batch_bounded() {
		let pool = create_test_pool().await;
		let store = JobStore::new(pool.clone());
		store.upsert_definition(&definition("j1", 60)).await.unwrap();

		for _ in 0..5 {
			let r = run("j1", JobStatus::Running);
			store.record_run_start(&r).await.unwrap();
			store
				.record_run_complete(&r.id, JobStatus::Succeeded, None, None)
				.await
				.unwrap();
		}

		// Age every run past the retention window.
		let old = Utc::now() - ChronoDuration::days(120);
		sqlx::query("UPDATE job_runs SET completed_at = ?")
			.bind(old)
			.execute(&pool)
			.await
			.unwrap();

		let deleted = store.cleanup_old_runs(90, 2).await.unwrap();
		assert_eq!(deleted, 2);

		let deleted = store.cleanup_old_runs(90, 10).await.unwrap();
		assert_eq!(deleted, 3);
	}

	#[tokio::test]
	async fn overdue_jobs_respects_margin() {
		let pool = create_test_pool().await;
		let store = JobStore::new(pool);
		store.upsert_definition(&definition("j1", 3600)).await.unwrap();

		let two_hours_ago = Utc::now() - ChronoDuration::hours(2);
		store
			.claim_due("j1", two_hours_ago, Duration::from_secs(3600))
			.await
			.unwrap();

		let overdue = store
			.overdue_jobs(Utc::now(), Duration::from_secs(300))
			.await
			.unwrap();
		assert_eq!(overdue, vec!["j1".to_string()]);

		let overdue = store
			.overdue_jobs(Utc::now(), Duration::from_secs(7200))
			.await
			.unwrap();
		assert!(overdue.is_empty());
	}

	#[tokio::test]
	async fn set_enabled_flips_the_definition() {
		let pool = create_test_pool().await;
		let store = JobStore::new(pool);
		store.upsert_definition(&definition("j1", 60)).await.unwrap();

		store.set_enabled("j1", false).await.unwrap();
		let def = store.get_definition("j1").await.unwrap().unwrap();
		assert!(!def.enabled);

		match store.set_enabled("missing", true).await {
			Err(DbError::NotFound(id)) => assert_eq!(id, "missing"),
			other => panic!("expected NotFound, got {other:?}"),
		}
	}

	#[test]
	fn job_status_roundtrip() {
		for status in [
			JobStatus::Running,
			JobStatus::Succeeded,
			JobStatus::Failed,
			JobStatus::Cancelled,
		] {
			assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
		}
	}
}
