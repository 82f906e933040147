// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Upload metadata store used by the reprocessing job and the backlog check.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
	pub id: String,
	pub path: String,
	pub byte_size: i64,
	pub created_at: DateTime<Utc>,
	pub reprocessed_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct UploadStore {
	pool: SqlitePool,
}

impl UploadStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, upload), fields(upload_id = %upload.id))]
	pub async fn create(&self, upload: &Upload) -> Result<()> {
		sqlx::query(
			"INSERT INTO uploads (id, path, byte_size, created_at, reprocessed_at) VALUES (?, ?, ?, ?, ?)",
		)
		.bind(&upload.id)
		.bind(&upload.path)
		.bind(upload.byte_size)
		.bind(upload.created_at)
		.bind(upload.reprocessed_at)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn get(&self, id: &str) -> Result<Option<Upload>> {
		let row = sqlx::query_as::<
			_,
			(String, String, i64, DateTime<Utc>, Option<DateTime<Utc>>),
		>("SELECT id, path, byte_size, created_at, reprocessed_at FROM uploads WHERE id = ?")
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(row.map(|(id, path, byte_size, created_at, reprocessed_at)| Upload {
			id,
			path,
			byte_size,
			created_at,
			reprocessed_at,
		}))
	}

	/// Uploads never reprocessed, or last reprocessed before the staleness
	/// window.
	#[tracing::instrument(skip(self))]
	pub async fn count_stale(&self, stale_days: u32) -> Result<u64> {
		let cutoff = Utc::now() - ChronoDuration::days(stale_days as i64);
		let (count,): (i64,) = sqlx::query_as(
			r#"
			SELECT COUNT(*) FROM uploads
			WHERE reprocessed_at IS NULL OR julianday(reprocessed_at) < julianday(?)
			"#,
		)
		.bind(cutoff)
		.fetch_one(&self.pool)
		.await?;

		Ok(count as u64)
	}

	/// Mark a bounded batch of stale uploads reprocessed, oldest first.
	/// Returns how many rows were touched.
	#[tracing::instrument(skip(self))]
	pub async fn reprocess_stale(&self, stale_days: u32, batch_limit: u32) -> Result<u64> {
		let now = Utc::now();
		let cutoff = now - ChronoDuration::days(stale_days as i64);

		let result = sqlx::query(
			r#"
			UPDATE uploads
			SET reprocessed_at = ?
			WHERE id IN (
				SELECT id FROM uploads
				WHERE reprocessed_at IS NULL OR julianday(reprocessed_at) < julianday(?)
				ORDER BY created_at
				LIMIT ?
			)
			"#,
		)
		.bind(now)
		.bind(cutoff)
		.bind(batch_limit as i64)
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected())
	}
}
