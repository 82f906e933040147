// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CheckError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckPriority {
	Low,
	High,
}

impl CheckPriority {
	pub fn as_str(&self) -> &'static str {
		match self {
			CheckPriority::Low => "low",
			CheckPriority::High => "high",
		}
	}
}

/// What one evaluation of a check found.
///
/// A problem carries a translation key and its params; the dashboard
/// collaborator owns the actual message text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
	NoProblem,
	Problem {
		message_key: String,
		params: serde_json::Value,
	},
}

impl CheckOutcome {
	pub fn problem(message_key: impl Into<String>, params: serde_json::Value) -> Self {
		CheckOutcome::Problem {
			message_key: message_key.into(),
			params,
		}
	}

	pub fn is_problem(&self) -> bool {
		matches!(self, CheckOutcome::Problem { .. })
	}
}

/// A stateless health predicate evaluated on the registry's cadence.
///
/// Implementations must be read-only and idempotent; anything cached lives
/// only for the duration of one `check` call.
#[async_trait]
pub trait ProblemCheck: Send + Sync {
	fn id(&self) -> &str;

	fn priority(&self) -> CheckPriority {
		CheckPriority::Low
	}

	async fn check(&self) -> Result<CheckOutcome, CheckError>;
}
