// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The review-flag service: a moderator (or the system actor) agrees with,
//! dismisses, or deletes a flag. The status change and the review-log entry
//! commit together or not at all.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use uuid::Uuid;

use agora_server_db::{FlagStatus, FlagStore, ReviewAction, ReviewLogEntry};
use agora_server_services::{
	ContractErrors, ContractStep, ModelStep, PolicyStep, ServiceAuditSink, ServiceContext,
	ServiceError, ServicePipeline, TransactionStep,
};

pub fn review_flag_pipeline(
	store: FlagStore,
	audit: Arc<dyn ServiceAuditSink>,
) -> ServicePipeline {
	ServicePipeline::builder("review_flag")
		.contract(ReviewFlagContract)
		.model(FlagModel {
			store: store.clone(),
		})
		.policy(CanReviewFlags)
		.transaction(vec![
			Box::new(ApplyReviewAction {
				store: store.clone(),
			}),
			Box::new(AppendReviewLog { store }),
		])
		.audit(audit)
		.build()
}

struct ReviewFlagContract;

impl ContractStep for ReviewFlagContract {
	fn name(&self) -> &str {
		"review_flag_params"
	}

	fn validate(&self, ctx: &ServiceContext) -> ContractErrors {
		let mut errors = ContractErrors::new();

		match ctx.param_str("flag_id") {
			Some(id) if !id.is_empty() => {}
			_ => errors.add("flag_id", "blank", "must be present"),
		}

		match ctx.param_str("action") {
			Some(action) if action.parse::<ReviewAction>().is_ok() => {}
			Some(_) => errors.add("action", "inclusion", "is not a valid review action"),
			None => errors.add("action", "blank", "must be present"),
		}

		errors
	}
}

struct FlagModel {
	store: FlagStore,
}

#[async_trait]
impl ModelStep for FlagModel {
	fn name(&self) -> &str {
		"flag"
	}

	fn key(&self) -> &str {
		"flag"
	}

	async fn fetch(
		&self,
		ctx: &ServiceContext,
		_pool: &SqlitePool,
	) -> Result<serde_json::Value, ServiceError> {
		let flag_id = ctx
			.param_str("flag_id")
			.ok_or_else(|| ServiceError::Internal("flag_id missing from params".to_string()))?;

		match self.store.get(flag_id).await? {
			Some(flag) => Ok(serde_json::to_value(flag)?),
			None => Err(ServiceError::NotFound("flag".to_string())),
		}
	}
}

struct CanReviewFlags;

#[async_trait]
impl PolicyStep for CanReviewFlags {
	fn name(&self) -> &str {
		"can_review_flags"
	}

	async fn allowed(&self, ctx: &ServiceContext) -> Result<bool, ServiceError> {
		Ok(ctx.actor.moderator || ctx.actor.admin)
	}
}

struct ApplyReviewAction {
	store: FlagStore,
}

#[async_trait]
impl TransactionStep for ApplyReviewAction {
	fn name(&self) -> &str {
		"apply_review_action"
	}

	async fn apply(
		&self,
		ctx: &mut ServiceContext,
		tx: &mut Transaction<'_, Sqlite>,
	) -> Result<(), ServiceError> {
		let flag_id = ctx
			.param_str("flag_id")
			.ok_or_else(|| ServiceError::Internal("flag_id missing from params".to_string()))?
			.to_string();
		let action = parse_action(ctx)?;

		match action {
			ReviewAction::Agree => {
				self.store
					.mark_handled_in_tx(tx, &flag_id, FlagStatus::Agreed, &ctx.actor.id, Utc::now())
					.await?;
			}
			ReviewAction::Dismiss => {
				self.store
					.mark_handled_in_tx(
						tx,
						&flag_id,
						FlagStatus::Dismissed,
						&ctx.actor.id,
						Utc::now(),
					)
					.await?;
			}
			ReviewAction::Delete => {
				self.store.delete_in_tx(tx, &flag_id).await?;
			}
		}

		Ok(())
	}
}

struct AppendReviewLog {
	store: FlagStore,
}

#[async_trait]
impl TransactionStep for AppendReviewLog {
	fn name(&self) -> &str {
		"append_review_log"
	}

	async fn apply(
		&self,
		ctx: &mut ServiceContext,
		tx: &mut Transaction<'_, Sqlite>,
	) -> Result<(), ServiceError> {
		let flag_id = ctx
			.param_str("flag_id")
			.ok_or_else(|| ServiceError::Internal("flag_id missing from params".to_string()))?
			.to_string();
		let action = parse_action(ctx)?;

		let entry = ReviewLogEntry {
			id: Uuid::new_v4().to_string(),
			flag_id,
			actor_id: ctx.actor.id.clone(),
			action,
			created_at: Utc::now(),
		};
		self.store.append_review_in_tx(tx, &entry).await?;

		Ok(())
	}
}

fn parse_action(ctx: &ServiceContext) -> Result<ReviewAction, ServiceError> {
	ctx.param_str("action")
		.ok_or_else(|| ServiceError::Internal("action missing from params".to_string()))?
		.parse::<ReviewAction>()
		.map_err(ServiceError::Internal)
}
