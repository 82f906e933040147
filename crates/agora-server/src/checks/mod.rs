// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Concrete problem checks behind the admin dashboard.

mod database;
mod failing_jobs;
mod stale_jobs;
mod upload_backlog;

pub use database::DatabaseCheck;
pub use failing_jobs::FailingJobsCheck;
pub use stale_jobs::StaleJobsCheck;
pub use upload_backlog::UploadBacklogCheck;
