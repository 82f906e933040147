// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Post-flag store and the review log appended when moderators handle flags.
//!
//! Mutations that belong to one moderation action take an explicit
//! `sqlx::Transaction` so the service pipeline can group them atomically.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::{DbError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagStatus {
	Pending,
	Agreed,
	Dismissed,
}

impl FlagStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			FlagStatus::Pending => "pending",
			FlagStatus::Agreed => "agreed",
			FlagStatus::Dismissed => "dismissed",
		}
	}
}

impl std::str::FromStr for FlagStatus {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"pending" => Ok(FlagStatus::Pending),
			"agreed" => Ok(FlagStatus::Agreed),
			"dismissed" => Ok(FlagStatus::Dismissed),
			_ => Err(format!("unknown flag status: {s}")),
		}
	}
}

/// What a moderator did with a flag. `Delete` removes the flag row itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
	Agree,
	Dismiss,
	Delete,
}

impl ReviewAction {
	pub fn as_str(&self) -> &'static str {
		match self {
			ReviewAction::Agree => "agree",
			ReviewAction::Dismiss => "dismiss",
			ReviewAction::Delete => "delete",
		}
	}
}

impl std::str::FromStr for ReviewAction {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"agree" => Ok(ReviewAction::Agree),
			"dismiss" => Ok(ReviewAction::Dismiss),
			"delete" => Ok(ReviewAction::Delete),
			_ => Err(format!("unknown review action: {s}")),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flag {
	pub id: String,
	pub post_id: String,
	pub flagged_by: String,
	pub reason: String,
	pub status: FlagStatus,
	pub created_at: DateTime<Utc>,
	pub handled_at: Option<DateTime<Utc>>,
	pub handled_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewLogEntry {
	pub id: String,
	pub flag_id: String,
	pub actor_id: String,
	pub action: ReviewAction,
	pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct FlagStore {
	pool: SqlitePool,
}

impl FlagStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	#[tracing::instrument(skip(self, flag), fields(flag_id = %flag.id))]
	pub async fn create(&self, flag: &Flag) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO flags (id, post_id, flagged_by, reason, status, created_at, handled_at, handled_by)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(&flag.id)
		.bind(&flag.post_id)
		.bind(&flag.flagged_by)
		.bind(&flag.reason)
		.bind(flag.status.as_str())
		.bind(flag.created_at)
		.bind(flag.handled_at)
		.bind(&flag.handled_by)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn get(&self, id: &str) -> Result<Option<Flag>> {
		type Row = (
			String,
			String,
			String,
			String,
			String,
			DateTime<Utc>,
			Option<DateTime<Utc>>,
			Option<String>,
		);

		let row = sqlx::query_as::<_, Row>(
			r#"
			SELECT id, post_id, flagged_by, reason, status, created_at, handled_at, handled_by
			FROM flags
			WHERE id = ?
			"#,
		)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		row
			.map(
				|(id, post_id, flagged_by, reason, status, created_at, handled_at, handled_by)| {
					let status = status.parse::<FlagStatus>().map_err(DbError::Internal)?;
					Ok(Flag {
						id,
						post_id,
						flagged_by,
						reason,
						status,
						created_at,
						handled_at,
						handled_by,
					})
				},
			)
			.transpose()
	}

	/// Mark a pending flag as handled, inside the caller's transaction.
	#[tracing::instrument(skip(self, tx))]
	pub async fn mark_handled_in_tx(
		&self,
		tx: &mut Transaction<'_, Sqlite>,
		id: &str,
		status: FlagStatus,
		actor_id: &str,
		now: DateTime<Utc>,
	) -> Result<()> {
		let result = sqlx::query(
			"UPDATE flags SET status = ?, handled_at = ?, handled_by = ? WHERE id = ?",
		)
		.bind(status.as_str())
		.bind(now)
		.bind(actor_id)
		.bind(id)
		.execute(&mut **tx)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(id.to_string()));
		}

		Ok(())
	}

	/// Remove a flag row entirely, inside the caller's transaction.
	#[tracing::instrument(skip(self, tx))]
	pub async fn delete_in_tx(&self, tx: &mut Transaction<'_, Sqlite>, id: &str) -> Result<()> {
		let result = sqlx::query("DELETE FROM flags WHERE id = ?")
			.bind(id)
			.execute(&mut **tx)
			.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(id.to_string()));
		}

		Ok(())
	}

	#[tracing::instrument(skip(self, tx, entry), fields(flag_id = %entry.flag_id))]
	pub async fn append_review_in_tx(
		&self,
		tx: &mut Transaction<'_, Sqlite>,
		entry: &ReviewLogEntry,
	) -> Result<()> {
		sqlx::query(
			"INSERT INTO review_log (id, flag_id, actor_id, action, created_at) VALUES (?, ?, ?, ?, ?)",
		)
		.bind(&entry.id)
		.bind(&entry.flag_id)
		.bind(&entry.actor_id)
		.bind(entry.action.as_str())
		.bind(entry.created_at)
		.execute(&mut **tx)
		.await?;

		Ok(())
	}

	#[tracing::instrument(skip(self))]
	pub async fn count_reviews(&self, flag_id: &str) -> Result<u64> {
		let (count,): (i64,) =
			sqlx::query_as("SELECT COUNT(*) FROM review_log WHERE flag_id = ?")
				.bind(flag_id)
				.fetch_one(&self.pool)
				.await?;

		Ok(count as u64)
	}

	#[tracing::instrument(skip(self))]
	pub async fn count_pending(&self) -> Result<u64> {
		let (count,): (i64,) =
			sqlx::query_as("SELECT COUNT(*) FROM flags WHERE status = 'pending'")
				.fetch_one(&self.pool)
				.await?;

		Ok(count as u64)
	}

	/// Pending flags older than the given age, oldest first, at most `limit`.
	#[tracing::instrument(skip(self))]
	pub async fn stale_pending(&self, older_than_days: u32, limit: u32) -> Result<Vec<String>> {
		let cutoff = Utc::now() - ChronoDuration::days(older_than_days as i64);
		let rows = sqlx::query_as::<_, (String,)>(
			r#"
			SELECT id FROM flags
			WHERE status = 'pending' AND julianday(created_at) < julianday(?)
			ORDER BY created_at
			LIMIT ?
			"#,
		)
		.bind(cutoff)
		.bind(limit as i64)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(|(id,)| id).collect())
	}

	/// Delete handled flags older than the retention window, at most
	/// `batch_limit` rows per call.
	#[tracing::instrument(skip(self))]
	pub async fn delete_handled_older_than(
		&self,
		retention_days: u32,
		batch_limit: u32,
	) -> Result<u64> {
		let cutoff = Utc::now() - ChronoDuration::days(retention_days as i64);

		let result = sqlx::query(
			r#"
			DELETE FROM flags
			WHERE id IN (
				SELECT id FROM flags
				WHERE status != 'pending'
				  AND handled_at IS NOT NULL
				  AND julianday(handled_at) < julianday(?)
				ORDER BY handled_at
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
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_test_pool, insert_flag};

	#[tokio::test]
	async fn create_and_get_roundtrip() {
		let pool = create_test_pool().await;
		let store = FlagStore::new(pool);

		insert_flag(&store, "f1", FlagStatus::Pending).await;

		let flag = store.get("f1").await.unwrap().unwrap();
		assert_eq!(flag.status, FlagStatus::Pending);
		assert!(flag.handled_at.is_none());

		assert!(store.get("missing").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn mark_handled_rolls_back_with_transaction() {
		let pool = create_test_pool().await;
		let store = FlagStore::new(pool.clone());
		insert_flag(&store, "f1", FlagStatus::Pending).await;

		let mut tx = pool.begin().await.unwrap();
		store
			.mark_handled_in_tx(&mut tx, "f1", FlagStatus::Agreed, "mod-1", Utc::now())
			.await
			.unwrap();
		tx.rollback().await.unwrap();

		let flag = store.get("f1").await.unwrap().unwrap();
		assert_eq!(flag.status, FlagStatus::Pending);
	}

	#[tokio::test]
	async fn delete_handled_older_than_is_batch_bounded() {
		let pool = create_test_pool().await;
		let store = FlagStore::new(pool.clone());

		for i in 0..4 {
			insert_flag(&store, &format!("f{i}"), FlagStatus::Agreed).await;
		}

		let old = Utc::now() - ChronoDuration::days(400);
		sqlx::query("UPDATE flags SET handled_at = ?")
			.bind(old)
			.execute(&pool)
			.await
			.unwrap();

		assert_eq!(store.delete_handled_older_than(365, 3).await.unwrap(), 3);
		assert_eq!(store.delete_handled_older_than(365, 3).await.unwrap(), 1);
	}

	#[tokio::test]
	async fn pending_flags_survive_handled_cleanup() {
		let pool = create_test_pool().await;
		let store = FlagStore::new(pool.clone());

		insert_flag(&store, "pending", FlagStatus::Pending).await;
		insert_flag(&store, "agreed", FlagStatus::Agreed).await;

		let old = Utc::now() - ChronoDuration::days(400);
		sqlx::query("UPDATE flags SET handled_at = ?, created_at = ?")
			.bind(old)
			.bind(old)
			.execute(&pool)
			.await
			.unwrap();

		store.delete_handled_older_than(365, 100).await.unwrap();
		assert!(store.get("pending").await.unwrap().is_some());
		assert!(store.get("agreed").await.unwrap().is_none());
	}
}
