// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit hook for completed service runs.
//!
//! Sinks observe every finished pipeline run; a sink failure is logged by
//! the pipeline and never surfaced to the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ServiceAuditRecord {
	pub service: String,
	pub actor_id: String,
	pub outcome: String,
	pub duration_ms: u64,
	pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuditSinkError {
	#[error("Transient sink error: {0}")]
	Transient(String),
}

#[async_trait]
pub trait ServiceAuditSink: Send + Sync {
	fn name(&self) -> &str;

	async fn publish(&self, record: &ServiceAuditRecord) -> Result<(), AuditSinkError>;
}

/// Default sink: writes the record to the log stream.
pub struct TracingAuditSink;

#[async_trait]
impl ServiceAuditSink for TracingAuditSink {
	fn name(&self) -> &str {
		"tracing"
	}

	async fn publish(&self, record: &ServiceAuditRecord) -> Result<(), AuditSinkError> {
		tracing::info!(
			service = %record.service,
			actor_id = %record.actor_id,
			outcome = %record.outcome,
			duration_ms = record.duration_ms,
			"service completed"
		);
		Ok(())
	}
}
