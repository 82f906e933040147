// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use sqlx::SqlitePool;

use agora_server_checks::{CheckError, CheckOutcome, CheckPriority, ProblemCheck};

/// Probes database connectivity. A failed probe is the problem itself, not
/// an errored check.
pub struct DatabaseCheck {
	pool: SqlitePool,
}

impl DatabaseCheck {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl ProblemCheck for DatabaseCheck {
	fn id(&self) -> &str {
		"database"
	}

	fn priority(&self) -> CheckPriority {
		CheckPriority::High
	}

	async fn check(&self) -> Result<CheckOutcome, CheckError> {
		match sqlx::query("SELECT 1").execute(&self.pool).await {
			Ok(_) => Ok(CheckOutcome::NoProblem),
			Err(e) => {
				tracing::warn!(error = %e, "database probe failed");
				Ok(CheckOutcome::problem(
					"dashboard.problem.database_unreachable",
					serde_json::json!({}),
				))
			}
		}
	}
}
