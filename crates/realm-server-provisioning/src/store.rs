// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use realm_server_audit::AuditEntry;
use realm_server_auth::User;
use realm_server_db::{with_transaction, AuditRepository, DbError, UserRepository};
use sqlx::sqlite::SqlitePool;

/// Storage used by the batch importer.
#[async_trait]
pub trait ImportStore: Send + Sync {
	/// Exact, case-sensitive email lookup. Absence is `Ok(None)`.
	async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;

	/// Persist `user` (row and memberships) and `entry` atomically: either
	/// both are committed or neither is.
	async fn save_user_with_audit(&self, user: &User, entry: &AuditEntry) -> Result<(), DbError>;
}

/// [`ImportStore`] backed by the SQLite repositories.
#[derive(Clone)]
pub struct SqliteImportStore {
	pool: SqlitePool,
	users: UserRepository,
}

impl SqliteImportStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			users: UserRepository::new(pool.clone()),
			pool,
		}
	}
}

#[async_trait]
impl ImportStore for SqliteImportStore {
	async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
		self.users.get_user_by_email(email).await
	}

	#[tracing::instrument(skip(self, user, entry), fields(user_id = %user.id, entry_id = %entry.id))]
	async fn save_user_with_audit(&self, user: &User, entry: &AuditEntry) -> Result<(), DbError> {
		let user = user.clone();
		let entry = entry.clone();
		with_transaction(&self.pool, move |tx| {
			Box::pin(async move {
				UserRepository::save_user_in_tx(tx, &user).await?;
				AuditRepository::save_entry_in_tx(tx, &entry).await
			})
		})
		.await
	}
}
