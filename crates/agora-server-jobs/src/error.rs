// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use agora_server_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
	#[error("Job not found: {0}")]
	NotFound(String),

	#[error("Job cancelled")]
	Cancelled,

	#[error("Job failed: {message}")]
	Failed { message: String },

	#[error("Database error: {0}")]
	Db(#[from] DbError),
}

pub type Result<T> = std::result::Result<T, JobError>;
