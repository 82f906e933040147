// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence layer for Agora server.
//!
//! This crate provides the connection pool, schema bootstrap, and the stores
//! consumed by the scheduler, the service pipeline, and the problem checks:
//! job schedule/history, post flags with their review log, and uploads.

pub mod error;
pub mod flag;
pub mod job;
pub mod pool;
pub mod schema;
pub mod testing;
pub mod upload;

pub use error::{DbError, Result};
pub use flag::{Flag, FlagStatus, FlagStore, ReviewAction, ReviewLogEntry};
pub use job::{JobDefinition, JobRun, JobStatus, JobStore, TriggerSource};
pub use pool::create_pool;
pub use schema::ensure_schema;
pub use upload::{Upload, UploadStore};
