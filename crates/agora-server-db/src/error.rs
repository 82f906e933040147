// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error taxonomy shared by every store in this crate.

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// A row the caller required was not there.
	#[error("Not found: {0}")]
	NotFound(String),

	/// Invariant violations inside the store: bad URLs, unparseable
	/// status columns, out-of-range cadences.
	#[error("Internal: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, DbError>;
