// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Agora forum maintenance server.
//!
//! Wires the maintenance core together: the concrete background jobs, the
//! problem checks feeding the admin dashboard, and the moderation services
//! built on the service pipeline.

pub mod bootstrap;
pub mod checks;
pub mod jobs;
pub mod services;

pub use bootstrap::{build_check_registry, build_scheduler, build_stores, Stores};
