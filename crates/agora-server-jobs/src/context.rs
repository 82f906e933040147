// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::{JobError, Result};
use crate::types::TriggerSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-run state handed to a job's handler.
pub struct JobContext {
	pub run_id: String,
	pub triggered_by: TriggerSource,
	pub cancellation_token: CancellationToken,
}

impl JobContext {
	pub fn new(
		run_id: impl Into<String>,
		triggered_by: TriggerSource,
		cancellation_token: CancellationToken,
	) -> Self {
		Self {
			run_id: run_id.into(),
			triggered_by,
			cancellation_token,
		}
	}

	/// Err(`Cancelled`) once this job's token has been cancelled. Handlers
	/// check this before starting a batch of work.
	pub fn ensure_active(&self) -> Result<()> {
		if self.cancellation_token.is_cancelled() {
			return Err(JobError::Cancelled);
		}
		Ok(())
	}
}

/// Shared cancel flag for one registered job. Cancelling makes the
/// scheduler skip the job's firings until [`CancellationToken::reset`].
#[derive(Clone)]
pub struct CancellationToken {
	cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
	pub fn new() -> Self {
		Self {
			cancelled: Arc::new(AtomicBool::new(false)),
		}
	}

	pub fn cancel(&self) {
		self.cancelled.store(true, Ordering::SeqCst);
	}

	pub fn reset(&self) {
		self.cancelled.store(false, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::SeqCst)
	}
}

impl Default for CancellationToken {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ensure_active_follows_the_token() {
		let ctx = JobContext::new("run-1", TriggerSource::Manual, CancellationToken::new());
		assert!(ctx.ensure_active().is_ok());

		ctx.cancellation_token.cancel();
		assert!(matches!(ctx.ensure_active(), Err(JobError::Cancelled)));

		ctx.cancellation_token.reset();
		assert!(ctx.ensure_active().is_ok());
	}
}
