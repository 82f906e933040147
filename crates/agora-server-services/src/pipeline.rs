// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{instrument, warn};

use crate::audit::{ServiceAuditRecord, ServiceAuditSink};
use crate::context::{Actor, ServiceContext};
use crate::error::ServiceError;
use crate::outcome::ServiceOutcome;
use crate::step::{
	ContractStep, ModelStep, PolicyStep, PostCommitStep, Step, TransactionStep,
};

/// One named business operation as an ordered step list.
///
/// Steps run in declared order and the first failure decides the outcome.
/// The transaction group is atomic: when any contained step fails the whole
/// group rolls back, and no later step of the pipeline runs.
pub struct ServicePipeline {
	name: String,
	steps: Vec<Step>,
	audit: Option<Arc<dyn ServiceAuditSink>>,
}

impl ServicePipeline {
	pub fn builder(name: impl Into<String>) -> ServicePipelineBuilder {
		ServicePipelineBuilder {
			name: name.into(),
			steps: Vec::new(),
			audit: None,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	#[instrument(skip(self, pool, actor, params), fields(service = %self.name))]
	pub async fn run(
		&self,
		pool: &SqlitePool,
		actor: Actor,
		params: serde_json::Value,
	) -> ServiceOutcome {
		let started = Instant::now();
		let actor_id = actor.id.clone();
		let mut ctx = ServiceContext::new(actor, params);
		let mut failure = None;

		for step in &self.steps {
			match step {
				Step::Contract(contract) => {
					let errors = contract.validate(&ctx);
					if !errors.is_empty() {
						failure = Some(ServiceOutcome::ContractViolation {
							step: contract.name().to_string(),
							errors,
						});
						break;
					}
				}
				Step::Model(model) => match model.fetch(&ctx, pool).await {
					Ok(entity) => ctx.insert_entity(model.key().to_string(), entity),
					Err(ServiceError::NotFound(name)) => {
						failure = Some(ServiceOutcome::NotFound {
							step: model.name().to_string(),
							model: name,
						});
						break;
					}
					Err(e) => {
						failure = Some(ServiceOutcome::StepFailed {
							step: model.name().to_string(),
							cause: e.to_string(),
						});
						break;
					}
				},
				Step::Policy(policy) => match policy.allowed(&ctx).await {
					Ok(true) => {}
					Ok(false) => {
						failure = Some(ServiceOutcome::InvalidAccess {
							step: policy.name().to_string(),
						});
						break;
					}
					Err(e) => {
						failure = Some(ServiceOutcome::StepFailed {
							step: policy.name().to_string(),
							cause: e.to_string(),
						});
						break;
					}
				},
				Step::Transaction(group) => {
					if let Some(outcome) = run_transaction(group, &mut ctx, pool).await {
						failure = Some(outcome);
						break;
					}
				}
				Step::PostCommit(post) => {
					// The mutation already committed; a post-commit failure
					// is logged and does not change the outcome.
					if let Err(e) = post.run(&ctx).await {
						warn!(step = %post.name(), error = %e, "post-commit step failed");
					}
				}
			}
		}

		let outcome = match failure {
			Some(outcome) => outcome,
			None => ServiceOutcome::Success { context: ctx },
		};

		if let Some(sink) = &self.audit {
			let record = ServiceAuditRecord {
				service: self.name.clone(),
				actor_id,
				outcome: outcome.label().to_string(),
				duration_ms: started.elapsed().as_millis() as u64,
				recorded_at: chrono::Utc::now(),
			};
			if let Err(e) = sink.publish(&record).await {
				warn!(sink = sink.name(), error = %e, "audit sink publish failed");
			}
		}

		outcome
	}
}

async fn run_transaction(
	group: &[Box<dyn TransactionStep>],
	ctx: &mut ServiceContext,
	pool: &SqlitePool,
) -> Option<ServiceOutcome> {
	let mut tx = match pool.begin().await {
		Ok(tx) => tx,
		Err(e) => {
			return Some(ServiceOutcome::StepFailed {
				step: "begin".to_string(),
				cause: e.to_string(),
			})
		}
	};

	for step in group {
		if let Err(e) = step.apply(ctx, &mut tx).await {
			if let Err(rollback_err) = tx.rollback().await {
				warn!(step = %step.name(), error = %rollback_err, "rollback failed");
			}
			return Some(ServiceOutcome::StepFailed {
				step: step.name().to_string(),
				cause: e.to_string(),
			});
		}
	}

	if let Err(e) = tx.commit().await {
		return Some(ServiceOutcome::StepFailed {
			step: "commit".to_string(),
			cause: e.to_string(),
		});
	}

	None
}

pub struct ServicePipelineBuilder {
	name: String,
	steps: Vec<Step>,
	audit: Option<Arc<dyn ServiceAuditSink>>,
}

impl ServicePipelineBuilder {
	pub fn contract(mut self, step: impl ContractStep + 'static) -> Self {
		self.steps.push(Step::Contract(Box::new(step)));
		self
	}

	pub fn model(mut self, step: impl ModelStep + 'static) -> Self {
		self.steps.push(Step::Model(Box::new(step)));
		self
	}

	pub fn policy(mut self, step: impl PolicyStep + 'static) -> Self {
		self.steps.push(Step::Policy(Box::new(step)));
		self
	}

	pub fn transaction(mut self, group: Vec<Box<dyn TransactionStep>>) -> Self {
		self.steps.push(Step::Transaction(group));
		self
	}

	pub fn post_commit(mut self, step: impl PostCommitStep + 'static) -> Self {
		self.steps.push(Step::PostCommit(Box::new(step)));
		self
	}

	pub fn audit(mut self, sink: Arc<dyn ServiceAuditSink>) -> Self {
		self.audit = Some(sink);
		self
	}

	pub fn build(self) -> ServicePipeline {
		ServicePipeline {
			name: self.name,
			steps: self.steps,
			audit: self.audit,
		}
	}
}
