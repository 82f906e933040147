// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database configuration section.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfigLayer {
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	pub fn finalize(self) -> DatabaseConfig {
		DatabaseConfig {
			url: self.url.unwrap_or_else(|| "sqlite:./agora.db".to_string()),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		DatabaseConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_url_is_local_sqlite() {
		assert_eq!(DatabaseConfig::default().url, "sqlite:./agora.db");
	}

	#[test]
	fn merge_overwrites() {
		let mut base = DatabaseConfigLayer {
			url: Some("sqlite:./a.db".to_string()),
		};
		base.merge(DatabaseConfigLayer {
			url: Some("sqlite:./b.db".to_string()),
		});
		assert_eq!(base.finalize().url, "sqlite:./b.db");
	}
}
