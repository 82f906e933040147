// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ServiceError;

/// Who is performing the operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
	pub id: String,
	pub username: String,
	pub moderator: bool,
	pub admin: bool,
}

impl Actor {
	pub fn system() -> Self {
		Self {
			id: "system".to_string(),
			username: "system".to_string(),
			moderator: true,
			admin: true,
		}
	}
}

/// State threaded through a pipeline run: the caller's params, the actor,
/// and the entities fetched by model steps (keyed by the name the step
/// registered them under).
#[derive(Debug)]
pub struct ServiceContext {
	pub actor: Actor,
	pub params: serde_json::Value,
	entities: HashMap<String, serde_json::Value>,
}

impl ServiceContext {
	pub fn new(actor: Actor, params: serde_json::Value) -> Self {
		Self {
			actor,
			params,
			entities: HashMap::new(),
		}
	}

	pub fn insert_entity(&mut self, key: impl Into<String>, entity: serde_json::Value) {
		self.entities.insert(key.into(), entity);
	}

	pub fn entity(&self, key: &str) -> Option<&serde_json::Value> {
		self.entities.get(key)
	}

	/// Fetch an entity a prior model step must have registered.
	pub fn require_entity(&self, key: &str) -> Result<&serde_json::Value, ServiceError> {
		self.entities
			.get(key)
			.ok_or_else(|| ServiceError::Internal(format!("entity not in context: {key}")))
	}

	/// A string field from the caller's params, if present and a string.
	pub fn param_str(&self, field: &str) -> Option<&str> {
		self.params.get(field).and_then(|v| v.as_str())
	}
}
