// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite connection settings.
//!
//! Only SQLite URLs are accepted; the pool and migrations are SQLite-specific.

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_DATABASE_URL: &str = "sqlite:./realm.db";
const SQLITE_SCHEME: &str = "sqlite:";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: Self) {
		self.url = other.url.or(self.url.take());
	}

	/// Surrounding whitespace is dropped so a padded env var still parses.
	pub fn finalize(self) -> DatabaseConfig {
		let url = self
			.url
			.map(|url| url.trim().to_string())
			.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
		DatabaseConfig { url }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		DatabaseConfigLayer::default().finalize()
	}
}

impl DatabaseConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.url.is_empty() {
			return Err(ConfigError::InvalidValue {
				key: "database.url".to_string(),
				message: "must not be empty".to_string(),
			});
		}
		if !self.url.starts_with(SQLITE_SCHEME) {
			return Err(ConfigError::InvalidValue {
				key: "database.url".to_string(),
				message: format!("expected a {SQLITE_SCHEME} URL, got {:?}", self.url),
			});
		}
		Ok(())
	}
}
