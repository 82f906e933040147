// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Concrete background jobs. Each one does a bounded slice of work per
//! firing; anything left over waits for the next cadence slot.

mod flag_auto_dismiss;
mod flag_history_cleanup;
mod job_history_cleanup;
mod upload_reprocess;

pub use flag_auto_dismiss::FlagAutoDismissJob;
pub use flag_history_cleanup::FlagHistoryCleanupJob;
pub use job_history_cleanup::JobHistoryCleanupJob;
pub use upload_reprocess::UploadReprocessJob;
