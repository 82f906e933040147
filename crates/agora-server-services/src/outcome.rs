// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use http::StatusCode;
use serde::Serialize;

use crate::context::ServiceContext;

/// One invalid field in the caller's params.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
	pub field: String,
	pub code: String,
	pub message: String,
}

/// Field-level validation failures collected by a contract step.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ContractErrors {
	errors: Vec<FieldError>,
}

impl ContractErrors {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(
		&mut self,
		field: impl Into<String>,
		code: impl Into<String>,
		message: impl Into<String>,
	) {
		self.errors.push(FieldError {
			field: field.into(),
			code: code.into(),
			message: message.into(),
		});
	}

	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	pub fn errors(&self) -> &[FieldError] {
		&self.errors
	}
}

/// How a pipeline run ended. The first failing step decides the variant;
/// the response collaborator maps it straight onto a status code.
#[derive(Debug)]
pub enum ServiceOutcome {
	Success {
		context: ServiceContext,
	},
	ContractViolation {
		step: String,
		errors: ContractErrors,
	},
	NotFound {
		step: String,
		model: String,
	},
	InvalidAccess {
		step: String,
	},
	StepFailed {
		step: String,
		cause: String,
	},
}

impl ServiceOutcome {
	pub fn is_success(&self) -> bool {
		matches!(self, ServiceOutcome::Success { .. })
	}

	/// Short label used in logs and audit records.
	pub fn label(&self) -> &'static str {
		match self {
			ServiceOutcome::Success { .. } => "success",
			ServiceOutcome::ContractViolation { .. } => "contract_violation",
			ServiceOutcome::NotFound { .. } => "not_found",
			ServiceOutcome::InvalidAccess { .. } => "invalid_access",
			ServiceOutcome::StepFailed { .. } => "step_failed",
		}
	}

	pub fn status_code(&self) -> StatusCode {
		match self {
			ServiceOutcome::Success { .. } => StatusCode::OK,
			ServiceOutcome::ContractViolation { .. } => StatusCode::BAD_REQUEST,
			ServiceOutcome::InvalidAccess { .. } => StatusCode::FORBIDDEN,
			ServiceOutcome::NotFound { .. } => StatusCode::NOT_FOUND,
			ServiceOutcome::StepFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
		}
	}
}
