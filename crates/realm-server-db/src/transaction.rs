// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use futures::future::BoxFuture;
use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, Transaction};

use crate::error::DbError;

/// Run `f` inside a single transaction.
///
/// Commits when `f` returns `Ok`, rolls back when it returns `Err`. Writes
/// made through `tx` are visible to no other connection until commit.
///
/// ```rust,ignore
/// with_transaction(&pool, move |tx| {
///     Box::pin(async move {
///         UserRepository::save_user_in_tx(tx, &user).await?;
///         AuditRepository::save_entry_in_tx(tx, &entry).await
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<T, F>(pool: &SqlitePool, f: F) -> Result<T, DbError>
where
	T: Send,
	F: for<'c> FnOnce(&'c mut Transaction<'static, Sqlite>) -> BoxFuture<'c, Result<T, DbError>>
		+ Send,
{
	let mut tx = pool.begin().await?;

	match f(&mut tx).await {
		Ok(value) => {
			tx.commit().await?;
			Ok(value)
		}
		Err(e) => {
			if let Err(rollback_err) = tx.rollback().await {
				tracing::warn!(error = %rollback_err, "transaction rollback failed");
			}
			Err(e)
		}
	}
}
