// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User repository.
//!
//! Users are stored once per email; realm membership lives in
//! `user_realms`, keyed on `(user_id, realm_id)` so re-adding a membership
//! never creates a second row.

use async_trait::async_trait;
use chrono::Utc;
use realm_server_auth::{RealmId, User, UserId};
use sqlx::{sqlite::SqlitePool, Row, Sqlite, Transaction};
use std::collections::{BTreeSet, HashMap};

use crate::error::DbError;
use crate::transaction::with_transaction;
use crate::types::{format_timestamp, parse_timestamp, parse_uuid, placeholders};

#[async_trait]
pub trait UserStore: Send + Sync {
	async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;
	async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError>;
	async fn get_users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, DbError>;
	async fn save_user(&self, user: &User) -> Result<(), DbError>;
}

#[derive(Clone)]
pub struct UserRepository {
	pool: SqlitePool,
}

impl UserRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Look up a user by exact email.
	///
	/// Absence is `Ok(None)`, not an error.
	#[tracing::instrument(skip(self, email))]
	pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
		let row = sqlx::query(
			"SELECT id, email, display_name, created_at, updated_at FROM users WHERE email = ?",
		)
		.bind(email)
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			return Ok(None);
		};

		let mut user = row_to_user(&row)?;
		user.realms = self.list_realm_ids(&user.id).await?;
		tracing::debug!(user_id = %user.id, "user found by email");
		Ok(Some(user))
	}

	#[tracing::instrument(skip(self), fields(user_id = %id))]
	pub async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError> {
		let row = sqlx::query(
			"SELECT id, email, display_name, created_at, updated_at FROM users WHERE id = ?",
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			return Ok(None);
		};

		let mut user = row_to_user(&row)?;
		user.realms = self.list_realm_ids(&user.id).await?;
		Ok(Some(user))
	}

	/// Bulk lookup with memberships. Unknown ids are skipped.
	#[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
	pub async fn get_users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, DbError> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let marks = placeholders(ids.len());

		let sql = format!(
			"SELECT id, email, display_name, created_at, updated_at FROM users WHERE id IN ({marks})"
		);
		let mut query = sqlx::query(&sql);
		for id in ids {
			query = query.bind(id.to_string());
		}
		let rows = query.fetch_all(&self.pool).await?;

		let membership_sql =
			format!("SELECT user_id, realm_id FROM user_realms WHERE user_id IN ({marks})");
		let mut membership_query = sqlx::query(&membership_sql);
		for id in ids {
			membership_query = membership_query.bind(id.to_string());
		}
		let membership_rows = membership_query.fetch_all(&self.pool).await?;

		let mut memberships: HashMap<UserId, BTreeSet<RealmId>> = HashMap::new();
		for row in &membership_rows {
			let user_id: String = row.get("user_id");
			let realm_id: String = row.get("realm_id");
			memberships
				.entry(UserId::new(parse_uuid("user_id", &user_id)?))
				.or_default()
				.insert(RealmId::new(parse_uuid("realm_id", &realm_id)?));
		}

		rows
			.iter()
			.map(|row| {
				let mut user = row_to_user(row)?;
				user.realms = memberships.remove(&user.id).unwrap_or_default();
				Ok(user)
			})
			.collect()
	}

	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn list_realm_ids(&self, user_id: &UserId) -> Result<BTreeSet<RealmId>, DbError> {
		let rows = sqlx::query("SELECT realm_id FROM user_realms WHERE user_id = ?")
			.bind(user_id.to_string())
			.fetch_all(&self.pool)
			.await?;

		rows
			.iter()
			.map(|row| {
				let realm_id: String = row.get("realm_id");
				parse_uuid("realm_id", &realm_id).map(RealmId::new)
			})
			.collect()
	}

	/// Insert or update `user` and its memberships in one transaction.
	#[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
	pub async fn save_user(&self, user: &User) -> Result<(), DbError> {
		let user = user.clone();
		with_transaction(&self.pool, move |tx| {
			Box::pin(async move { Self::save_user_in_tx(tx, &user).await })
		})
		.await
	}

	/// Insert or update `user` inside the caller's transaction.
	///
	/// The user row is upserted on id. Memberships are only ever added: every
	/// realm in `user.realms` gets a row if it does not already have one.
	pub async fn save_user_in_tx(
		tx: &mut Transaction<'_, Sqlite>,
		user: &User,
	) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			INSERT INTO users (id, email, display_name, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?)
			ON CONFLICT(id) DO UPDATE SET
				email = excluded.email,
				display_name = excluded.display_name,
				updated_at = excluded.updated_at
			"#,
		)
		.bind(user.id.to_string())
		.bind(&user.email)
		.bind(&user.display_name)
		.bind(format_timestamp(&user.created_at))
		.bind(format_timestamp(&user.updated_at))
		.execute(&mut **tx)
		.await;

		if let Err(e) = result {
			return Err(match e {
				sqlx::Error::Database(db) if db.is_unique_violation() => {
					DbError::Conflict(format!("email {} belongs to another user", user.email))
				}
				other => other.into(),
			});
		}

		let now = format_timestamp(&Utc::now());
		for realm_id in &user.realms {
			sqlx::query(
				"INSERT OR IGNORE INTO user_realms (user_id, realm_id, created_at) VALUES (?, ?, ?)",
			)
			.bind(user.id.to_string())
			.bind(realm_id.to_string())
			.bind(&now)
			.execute(&mut **tx)
			.await?;
		}

		tracing::debug!(user_id = %user.id, realms = user.realms.len(), "user saved in tx");
		Ok(())
	}
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, DbError> {
	let id: String = row.get("id");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(User {
		id: UserId::new(parse_uuid("user id", &id)?),
		email: row.get("email"),
		display_name: row.get("display_name"),
		realms: BTreeSet::new(),
		created_at: parse_timestamp("created_at", &created_at)?,
		updated_at: parse_timestamp("updated_at", &updated_at)?,
	})
}

#[async_trait]
impl UserStore for UserRepository {
	async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
		self.get_user_by_email(email).await
	}

	async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, DbError> {
		self.get_user_by_id(id).await
	}

	async fn get_users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, DbError> {
		self.get_users_by_ids(ids).await
	}

	async fn save_user(&self, user: &User) -> Result<(), DbError> {
		self.save_user(user).await
	}
}
