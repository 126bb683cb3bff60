// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit entry persistence and retention.
//!
//! Entries are written once and never updated. The only removal path is
//! [`AuditRepository::purge_older_than`], which deletes by creation time.
//! Reference discriminators are stored verbatim and validated on read by
//! the resolver, not here.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use realm_server_audit::{AuditEntry, AuditRef};
use realm_server_auth::{RealmId, UserId};
use sqlx::{sqlite::SqlitePool, Row, Sqlite, Transaction};

use crate::error::{DbError, Result};
use crate::types::{format_timestamp, parse_timestamp, parse_uuid};

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 1000;

#[async_trait]
pub trait AuditStore: Send + Sync {
	async fn save_entry(&self, entry: &AuditEntry) -> Result<()>;
	async fn purge_older_than(&self, max_age: Duration) -> Result<u64>;
	async fn list_entries_for_realm(
		&self,
		realm_id: &RealmId,
		limit: Option<i64>,
		offset: Option<i64>,
	) -> Result<(Vec<AuditEntry>, i64)>;
}

#[derive(Clone)]
pub struct AuditRepository {
	pool: SqlitePool,
}

impl AuditRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert `entry` inside the caller's transaction so that it commits or
	/// rolls back together with the mutation it describes.
	pub async fn save_entry_in_tx(
		tx: &mut Transaction<'_, Sqlite>,
		entry: &AuditEntry,
	) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO audit_entries
				(id, actor_user_id, action, target_type, target_id, source_type, source_id, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(entry.id.to_string())
		.bind(entry.actor_user_id.to_string())
		.bind(&entry.action)
		.bind(&entry.target.resource_type)
		.bind(entry.target.resource_id.to_string())
		.bind(entry.source.as_ref().map(|s| s.resource_type.as_str()))
		.bind(entry.source.as_ref().map(|s| s.resource_id.to_string()))
		.bind(format_timestamp(&entry.created_at))
		.execute(&mut **tx)
		.await?;

		tracing::debug!(entry_id = %entry.id, action = %entry.action, "audit entry recorded in tx");
		Ok(())
	}

	/// Record an entry that has no accompanying mutation.
	#[tracing::instrument(skip(self, entry), fields(entry_id = %entry.id, action = %entry.action))]
	pub async fn save_entry(&self, entry: &AuditEntry) -> Result<()> {
		let mut tx = self.pool.begin().await?;
		Self::save_entry_in_tx(&mut tx, entry).await?;
		tx.commit().await?;
		Ok(())
	}

	/// Delete every entry created strictly before `now - |max_age|`.
	///
	/// Returns the number of rows removed. A cutoff earlier than the
	/// representable date range matches nothing and deletes nothing.
	#[tracing::instrument(skip(self), fields(max_age_secs = max_age.num_seconds()))]
	pub async fn purge_older_than(&self, max_age: Duration) -> Result<u64> {
		let Some(cutoff) = Utc::now().checked_sub_signed(max_age.abs()) else {
			tracing::debug!("purge cutoff precedes the earliest timestamp; nothing to delete");
			return Ok(0);
		};

		let result = sqlx::query("DELETE FROM audit_entries WHERE created_at < ?")
			.bind(format_timestamp(&cutoff))
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected();
		tracing::debug!(deleted, cutoff = %cutoff, "audit entries purged");
		Ok(deleted)
	}

	/// Entries whose target or source is `realm_id`, newest first, with the
	/// total match count.
	#[tracing::instrument(skip(self), fields(realm_id = %realm_id))]
	pub async fn list_entries_for_realm(
		&self,
		realm_id: &RealmId,
		limit: Option<i64>,
		offset: Option<i64>,
	) -> Result<(Vec<AuditEntry>, i64)> {
		let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(0, MAX_PAGE_LIMIT);
		let offset = offset.unwrap_or(0).max(0);
		let realm = realm_id.to_string();

		let total: i64 = sqlx::query_scalar(
			r#"
			SELECT COUNT(*) FROM audit_entries
			WHERE (target_type = 'realms' AND target_id = ?)
			   OR (source_type = 'realms' AND source_id = ?)
			"#,
		)
		.bind(&realm)
		.bind(&realm)
		.fetch_one(&self.pool)
		.await?;

		let rows = sqlx::query(
			r#"
			SELECT id, actor_user_id, action, target_type, target_id, source_type, source_id, created_at
			FROM audit_entries
			WHERE (target_type = 'realms' AND target_id = ?)
			   OR (source_type = 'realms' AND source_id = ?)
			ORDER BY created_at DESC, id
			LIMIT ? OFFSET ?
			"#,
		)
		.bind(&realm)
		.bind(&realm)
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		let entries = rows.iter().map(row_to_entry).collect::<Result<Vec<_>>>()?;
		Ok((entries, total))
	}
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<AuditEntry> {
	let id: String = row.get("id");
	let actor: String = row.get("actor_user_id");
	let target_id: String = row.get("target_id");
	let source_type: Option<String> = row.get("source_type");
	let source_id: Option<String> = row.get("source_id");
	let created_at: String = row.get("created_at");

	let source = match (source_type, source_id) {
		(Some(resource_type), Some(resource_id)) => Some(AuditRef {
			resource_type,
			resource_id: parse_uuid("source_id", &resource_id)?,
		}),
		(None, None) => None,
		_ => {
			return Err(DbError::Internal(format!(
				"audit entry {id} has half a source reference"
			)))
		}
	};

	Ok(AuditEntry {
		id: parse_uuid("audit entry id", &id)?,
		actor_user_id: UserId::new(parse_uuid("actor_user_id", &actor)?),
		action: row.get("action"),
		target: AuditRef {
			resource_type: row.get("target_type"),
			resource_id: parse_uuid("target_id", &target_id)?,
		},
		source,
		created_at: parse_timestamp("created_at", &created_at)?,
	})
}

#[async_trait]
impl AuditStore for AuditRepository {
	async fn save_entry(&self, entry: &AuditEntry) -> Result<()> {
		self.save_entry(entry).await
	}

	async fn purge_older_than(&self, max_age: Duration) -> Result<u64> {
		self.purge_older_than(max_age).await
	}

	async fn list_entries_for_realm(
		&self,
		realm_id: &RealmId,
		limit: Option<i64>,
		offset: Option<i64>,
	) -> Result<(Vec<AuditEntry>, i64)> {
		self.list_entries_for_realm(realm_id, limit, offset).await
	}
}
