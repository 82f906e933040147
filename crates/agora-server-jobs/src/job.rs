// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::context::JobContext;
use crate::error::JobError;
use crate::types::JobOutput;

/// A unit of recurring background work.
///
/// Implementations must be idempotent per invocation: a handler may mutate
/// external storage, but the amount of work per firing is expected to be
/// bounded (batch limits live in the handler, not the scheduler).
#[async_trait]
pub trait Job: Send + Sync {
	/// Stable identifier, also the key of the persistent last-run record.
	fn id(&self) -> &str;

	fn name(&self) -> &str;

	fn description(&self) -> &str;

	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError>;
}
