// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Step kinds a service pipeline is assembled from.
//!
//! Each kind is a small trait so concrete services stay plain structs; the
//! [`Step`] enum fixes which kinds exist and what each may touch. Only
//! transaction steps get a handle on the open transaction, and only they
//! may mutate.

use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::context::ServiceContext;
use crate::error::ServiceError;
use crate::outcome::ContractErrors;

/// Validates the shape of the caller's params before anything runs.
pub trait ContractStep: Send + Sync {
	fn name(&self) -> &str;

	/// Returns the accumulated field-level errors, empty meaning valid.
	fn validate(&self, ctx: &ServiceContext) -> ContractErrors;
}

/// Fetches one entity by id and registers it in the context.
#[async_trait]
pub trait ModelStep: Send + Sync {
	fn name(&self) -> &str;

	/// The context key the fetched entity is registered under.
	fn key(&self) -> &str;

	/// Err([`ServiceError::NotFound`]) when the entity is absent.
	async fn fetch(
		&self,
		ctx: &ServiceContext,
		pool: &SqlitePool,
	) -> Result<serde_json::Value, ServiceError>;
}

/// A boolean predicate over the actor and the fetched entities.
#[async_trait]
pub trait PolicyStep: Send + Sync {
	fn name(&self) -> &str;

	async fn allowed(&self, ctx: &ServiceContext) -> Result<bool, ServiceError>;
}

/// One mutation inside the service's transaction group.
#[async_trait]
pub trait TransactionStep: Send + Sync {
	fn name(&self) -> &str;

	async fn apply(
		&self,
		ctx: &mut ServiceContext,
		tx: &mut Transaction<'_, Sqlite>,
	) -> Result<(), ServiceError>;
}

/// Work that runs only after the transaction group committed.
#[async_trait]
pub trait PostCommitStep: Send + Sync {
	fn name(&self) -> &str;

	async fn run(&self, ctx: &ServiceContext) -> Result<(), ServiceError>;
}

pub enum Step {
	Contract(Box<dyn ContractStep>),
	Model(Box<dyn ModelStep>),
	Policy(Box<dyn PolicyStep>),
	/// All contained steps commit or roll back together.
	Transaction(Vec<Box<dyn TransactionStep>>),
	PostCommit(Box<dyn PostCommitStep>),
}

impl Step {
	pub fn kind(&self) -> &'static str {
		match self {
			Step::Contract(_) => "contract",
			Step::Model(_) => "model",
			Step::Policy(_) => "policy",
			Step::Transaction(_) => "transaction",
			Step::PostCommit(_) => "post_commit",
		}
	}
}
