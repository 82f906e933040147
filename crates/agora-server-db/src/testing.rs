// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory pools and row factories for tests. Not compiled out of
//! dev builds so dependent crates can use them in their own tests.

use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::flag::{Flag, FlagStatus, FlagStore};
use crate::schema::ensure_schema;
use crate::upload::{Upload, UploadStore};

/// One-connection in-memory pool; every connection to `:memory:` is its
/// own database, so the pool must never open a second one.
pub async fn create_test_pool() -> SqlitePool {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect(":memory:")
		.await
		.unwrap();
	ensure_schema(&pool).await.unwrap();
	pool
}

pub async fn insert_flag(store: &FlagStore, id: &str, status: FlagStatus) {
	let handled = status != FlagStatus::Pending;
	store
		.create(&Flag {
			id: id.to_string(),
			post_id: format!("post-{id}"),
			flagged_by: "user-1".to_string(),
			reason: "spam".to_string(),
			status,
			created_at: Utc::now(),
			handled_at: handled.then(Utc::now),
			handled_by: handled.then(|| "mod-1".to_string()),
		})
		.await
		.unwrap();
}

pub async fn insert_upload(
	store: &UploadStore,
	id: &str,
	reprocessed_at: Option<chrono::DateTime<Utc>>,
) {
	store
		.create(&Upload {
			id: id.to_string(),
			path: format!("/uploads/{id}.png"),
			byte_size: 1024,
			created_at: Utc::now(),
			reprocessed_at,
		})
		.await
		.unwrap();
}
