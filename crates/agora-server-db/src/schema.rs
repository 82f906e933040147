// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema bootstrap for the maintenance core tables.

use sqlx::SqlitePool;

use crate::error::Result;

/// Create all tables and indexes if they do not exist yet.
///
/// Safe to call on every startup; existing tables are left untouched.
#[tracing::instrument(skip(pool))]
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS job_definitions (
			id TEXT PRIMARY KEY,
			name TEXT NOT NULL,
			description TEXT NOT NULL,
			cadence_secs INTEGER NOT NULL,
			enabled INTEGER NOT NULL DEFAULT 1,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS job_schedule (
			job_id TEXT PRIMARY KEY REFERENCES job_definitions(id),
			last_run_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS job_runs (
			id TEXT PRIMARY KEY,
			job_id TEXT NOT NULL REFERENCES job_definitions(id),
			status TEXT NOT NULL,
			started_at TEXT NOT NULL,
			completed_at TEXT,
			duration_ms INTEGER,
			error_message TEXT,
			triggered_by TEXT NOT NULL,
			metadata TEXT
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_job_runs_job_started ON job_runs(job_id, started_at)")
		.execute(pool)
		.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS flags (
			id TEXT PRIMARY KEY,
			post_id TEXT NOT NULL,
			flagged_by TEXT NOT NULL,
			reason TEXT NOT NULL,
			status TEXT NOT NULL DEFAULT 'pending',
			created_at TEXT NOT NULL,
			handled_at TEXT,
			handled_by TEXT
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_flags_status_created ON flags(status, created_at)")
		.execute(pool)
		.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS review_log (
			id TEXT PRIMARY KEY,
			flag_id TEXT NOT NULL,
			actor_id TEXT NOT NULL,
			action TEXT NOT NULL,
			created_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS uploads (
			id TEXT PRIMARY KEY,
			path TEXT NOT NULL,
			byte_size INTEGER NOT NULL,
			created_at TEXT NOT NULL,
			reprocessed_at TEXT
		)
		"#,
	)
	.execute(pool)
	.await?;

	tracing::debug!("schema ensured");
	Ok(())
}
