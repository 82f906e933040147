// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use agora_server_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
	/// A model step could not find its entity.
	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Database error: {0}")]
	Db(#[from] DbError),

	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("Internal: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
