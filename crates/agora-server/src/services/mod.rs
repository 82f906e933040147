// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Moderation services built on the service pipeline.

mod review_flag;

pub use review_flag::review_flag_pipeline;
