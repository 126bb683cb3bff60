// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit retention configuration section.

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_RETENTION_DAYS: i64 = 90;
const DEFAULT_PURGE_INTERVAL_SECS: u64 = 3600;

/// Upper bound on `retention_days`, roughly 2700 years. Keeps `now - days`
/// well inside the range the purge cutoff can represent.
pub const MAX_RETENTION_DAYS: i64 = 1_000_000;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AuditConfigLayer {
	#[serde(default)]
	pub retention_enabled: Option<bool>,
	#[serde(default)]
	pub retention_days: Option<i64>,
	#[serde(default)]
	pub purge_interval_secs: Option<u64>,
}

impl AuditConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.retention_enabled.is_some() {
			self.retention_enabled = other.retention_enabled;
		}
		if other.retention_days.is_some() {
			self.retention_days = other.retention_days;
		}
		if other.purge_interval_secs.is_some() {
			self.purge_interval_secs = other.purge_interval_secs;
		}
	}

	pub fn finalize(self) -> AuditConfig {
		AuditConfig {
			retention_enabled: self.retention_enabled.unwrap_or(true),
			retention_days: self.retention_days.unwrap_or(DEFAULT_RETENTION_DAYS),
			purge_interval_secs: self
				.purge_interval_secs
				.unwrap_or(DEFAULT_PURGE_INTERVAL_SECS),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConfig {
	/// Whether the periodic purge job runs at all.
	pub retention_enabled: bool,
	/// Entries older than this many days are purged.
	pub retention_days: i64,
	pub purge_interval_secs: u64,
}

impl Default for AuditConfig {
	fn default() -> Self {
		AuditConfigLayer::default().finalize()
	}
}

impl AuditConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !(1..=MAX_RETENTION_DAYS).contains(&self.retention_days) {
			return Err(ConfigError::Validation(format!(
				"audit.retention_days must be between 1 and {MAX_RETENTION_DAYS}, got {}",
				self.retention_days
			)));
		}
		if self.purge_interval_secs == 0 {
			return Err(ConfigError::Validation(
				"audit.purge_interval_secs must be at least 1".to_string(),
			));
		}
		Ok(())
	}
}
