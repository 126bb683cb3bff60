// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;

use realm_server_db::{AuditStore, DbError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Deletes audit entries older than the configured retention period.
pub struct AuditRetentionJob {
	audit: Arc<dyn AuditStore>,
	retention_days: i64,
}

impl AuditRetentionJob {
	pub fn new(audit: Arc<dyn AuditStore>, retention_days: i64) -> Self {
		Self {
			audit,
			retention_days,
		}
	}

	pub fn retention_days(&self) -> i64 {
		self.retention_days
	}

	/// Purge once. Returns the number of entries deleted.
	#[instrument(skip(self), fields(job_id = "audit-retention"))]
	pub async fn run_once(&self) -> Result<u64, DbError> {
		let max_age = chrono::Duration::try_days(self.retention_days).ok_or_else(|| {
			DbError::Internal(format!(
				"retention of {} days is out of range",
				self.retention_days
			))
		})?;
		let deleted = self.audit.purge_older_than(max_age).await?;
		tracing::info!(
			deleted,
			retention_days = self.retention_days,
			"Audit retention cleanup completed"
		);
		Ok(deleted)
	}

	/// Run [`run_once`](Self::run_once) every `interval` until `shutdown` is
	/// cancelled. The first purge happens immediately.
	pub fn spawn(self: Arc<Self>, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
		tokio::spawn(async move {
			tracing::info!(
				interval_secs = interval.as_secs(),
				retention_days = self.retention_days,
				"Audit retention job started"
			);
			loop {
				if let Err(e) = self.run_once().await {
					tracing::error!(error = %e, "Audit retention cleanup failed");
				}

				tokio::select! {
					_ = tokio::time::sleep(interval) => {}
					_ = shutdown.cancelled() => {
						tracing::info!("Audit retention job shutting down");
						break;
					}
				}
			}
		})
	}
}
