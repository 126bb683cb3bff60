// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Realm repository.

use async_trait::async_trait;
use realm_server_auth::{Realm, RealmId};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::types::{format_timestamp, parse_timestamp, parse_uuid, placeholders};

#[async_trait]
pub trait RealmStore: Send + Sync {
	async fn create_realm(&self, realm: &Realm) -> Result<(), DbError>;
	async fn get_realm_by_id(&self, id: &RealmId) -> Result<Option<Realm>, DbError>;
	async fn get_realms_by_ids(&self, ids: &[RealmId]) -> Result<Vec<Realm>, DbError>;
}

#[derive(Clone)]
pub struct RealmRepository {
	pool: SqlitePool,
}

impl RealmRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, realm), fields(realm_id = %realm.id))]
	pub async fn create_realm(&self, realm: &Realm) -> Result<(), DbError> {
		let result = sqlx::query("INSERT INTO realms (id, name, created_at) VALUES (?, ?, ?)")
			.bind(realm.id.to_string())
			.bind(&realm.name)
			.bind(format_timestamp(&realm.created_at))
			.execute(&self.pool)
			.await;

		match result {
			Ok(_) => {
				tracing::debug!(realm_id = %realm.id, "realm created");
				Ok(())
			}
			Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(DbError::Conflict(
				format!("realm {} already exists", realm.id),
			)),
			Err(e) => Err(e.into()),
		}
	}

	#[tracing::instrument(skip(self), fields(realm_id = %id))]
	pub async fn get_realm_by_id(&self, id: &RealmId) -> Result<Option<Realm>, DbError> {
		let row = sqlx::query("SELECT id, name, created_at FROM realms WHERE id = ?")
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| row_to_realm(&r)).transpose()
	}

	#[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
	pub async fn get_realms_by_ids(&self, ids: &[RealmId]) -> Result<Vec<Realm>, DbError> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let sql = format!(
			"SELECT id, name, created_at FROM realms WHERE id IN ({})",
			placeholders(ids.len())
		);
		let mut query = sqlx::query(&sql);
		for id in ids {
			query = query.bind(id.to_string());
		}

		let rows = query.fetch_all(&self.pool).await?;
		rows.iter().map(row_to_realm).collect()
	}
}

fn row_to_realm(row: &sqlx::sqlite::SqliteRow) -> Result<Realm, DbError> {
	let id: String = row.get("id");
	let created_at: String = row.get("created_at");
	Ok(Realm {
		id: RealmId::new(parse_uuid("realm id", &id)?),
		name: row.get("name"),
		created_at: parse_timestamp("created_at", &created_at)?,
	})
}

#[async_trait]
impl RealmStore for RealmRepository {
	async fn create_realm(&self, realm: &Realm) -> Result<(), DbError> {
		self.create_realm(realm).await
	}

	async fn get_realm_by_id(&self, id: &RealmId) -> Result<Option<Realm>, DbError> {
		self.get_realm_by_id(id).await
	}

	async fn get_realms_by_ids(&self, ids: &[RealmId]) -> Result<Vec<Realm>, DbError> {
		self.get_realms_by_ids(ids).await
	}
}
