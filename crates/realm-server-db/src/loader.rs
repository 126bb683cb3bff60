// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use realm_server_audit::{EntityLoader, LoadError};
use realm_server_auth::{Realm, RealmId, User, UserId};
use sqlx::sqlite::SqlitePool;

use crate::realm::RealmRepository;
use crate::user::UserRepository;

/// Resolves audit references against the user and realm tables.
#[derive(Clone)]
pub struct DbEntityLoader {
	users: UserRepository,
	realms: RealmRepository,
}

impl DbEntityLoader {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			users: UserRepository::new(pool.clone()),
			realms: RealmRepository::new(pool),
		}
	}
}

#[async_trait]
impl EntityLoader for DbEntityLoader {
	async fn load_realms(&self, ids: &[RealmId]) -> Result<Vec<Realm>, LoadError> {
		Ok(self.realms.get_realms_by_ids(ids).await?)
	}

	async fn load_users(&self, ids: &[UserId]) -> Result<Vec<User>, LoadError> {
		Ok(self.users.get_users_by_ids(ids).await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::audit::AuditRepository;
	use crate::testing::create_test_pool;
	use realm_server_audit::{resolve, AuditEntry, AuditError, AuditRef};

	#[tokio::test]
	async fn resolves_stored_entries() {
		let pool = create_test_pool().await;
		let realms = RealmRepository::new(pool.clone());
		let users = UserRepository::new(pool.clone());
		let audit = AuditRepository::new(pool.clone());

		let realm = Realm::new("narnia");
		realms.create_realm(&realm).await.unwrap();
		let actor = User::new("susan@example.com", "Susan");
		let mut seth = User::new("seth@example.com", "Seth");
		seth.add_realm(realm.id);
		users.save_user(&actor).await.unwrap();
		users.save_user(&seth).await.unwrap();

		audit
			.save_entry(&AuditEntry::user_added_to_realm(actor.id, seth.id, realm.id))
			.await
			.unwrap();

		let (entries, _) = audit
			.list_entries_for_realm(&realm.id, None, None)
			.await
			.unwrap();
		let list = resolve(&DbEntityLoader::new(pool), entries).await.unwrap();

		let entry = &list.entries[0];
		assert_eq!(list.target(entry).unwrap().display_name(), "Seth");
		assert_eq!(list.source(entry).unwrap().display_name(), "narnia");
		assert_eq!(list.users.len(), 1);
		assert_eq!(list.realms.len(), 1);
	}

	#[tokio::test]
	async fn unknown_stored_discriminator_fails_resolution() {
		let pool = create_test_pool().await;
		let audit = AuditRepository::new(pool.clone());
		let realm = RealmId::generate();

		let mut entry = AuditEntry::user_added_to_realm(UserId::generate(), UserId::generate(), realm);
		entry.target = AuditRef {
			resource_type: "apps".to_string(),
			resource_id: uuid::Uuid::new_v4(),
		};
		audit.save_entry(&entry).await.unwrap();

		let (entries, _) = audit
			.list_entries_for_realm(&realm, None, None)
			.await
			.unwrap();
		let err = resolve(&DbEntityLoader::new(pool), entries)
			.await
			.unwrap_err();

		assert!(matches!(err, AuditError::UnknownDiscriminator(_)));
	}
}
