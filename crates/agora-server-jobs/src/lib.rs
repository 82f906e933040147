// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background job scheduler for Agora server.
//!
//! This crate provides cadence-driven background maintenance jobs with
//! run-history persistence and health monitoring. The scheduler is driven by
//! `tick(now)`: a job fires when its last claimed slot plus its cadence has
//! passed, and the claim on the last-run store is atomic, so concurrent
//! ticks never double-fire one slot. A failed handler is logged and stays
//! eligible for its next slot; there is no early retry.

pub mod context;
pub mod error;
pub mod health;
pub mod job;
pub mod scheduler;
pub mod types;

pub use context::{CancellationToken, JobContext};
pub use error::{JobError, Result};
pub use health::{HealthState, JobHealthStatus, JobsHealthStatus, LastRunInfo};
pub use job::Job;
pub use scheduler::JobScheduler;
pub use types::{JobDefinition, JobOutput, JobRun, JobStatus, JobStore, TriggerSource};
