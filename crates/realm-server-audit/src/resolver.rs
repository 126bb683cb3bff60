// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batch resolution of polymorphic audit references.
//!
//! Every target and source reference across a set of entries is grouped by
//! [`EntityKind`] and fetched with exactly one [`EntityLoader`] call per kind
//! present, regardless of how many entries reference it.

use async_trait::async_trait;
use realm_server_auth::{Realm, RealmId, User, UserId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

use crate::error::{AuditError, AuditResult, LoadError};
use crate::event::{AuditEntry, AuditRef, EntityKind};

/// Batched lookups for each [`EntityKind`].
///
/// Implementations receive deduplicated ids and may return fewer entities
/// than requested when some no longer exist.
#[async_trait]
pub trait EntityLoader: Send + Sync {
	async fn load_realms(&self, ids: &[RealmId]) -> Result<Vec<Realm>, LoadError>;
	async fn load_users(&self, ids: &[UserId]) -> Result<Vec<User>, LoadError>;
}

/// A referenced entity borrowed from an [`AuditList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedEntity<'a> {
	Realm(&'a Realm),
	User(&'a User),
}

impl ResolvedEntity<'_> {
	pub fn kind(&self) -> EntityKind {
		match self {
			ResolvedEntity::Realm(_) => EntityKind::Realms,
			ResolvedEntity::User(_) => EntityKind::Users,
		}
	}

	pub fn id(&self) -> Uuid {
		match self {
			ResolvedEntity::Realm(realm) => realm.id.into_inner(),
			ResolvedEntity::User(user) => user.id.into_inner(),
		}
	}

	/// Human readable label: realm name or user display name.
	pub fn display_name(&self) -> &str {
		match self {
			ResolvedEntity::Realm(realm) => &realm.name,
			ResolvedEntity::User(user) => &user.display_name,
		}
	}
}

/// Audit entries together with every entity they reference.
#[derive(Debug, Clone, Default)]
pub struct AuditList {
	pub entries: Vec<AuditEntry>,
	pub realms: HashMap<RealmId, Realm>,
	pub users: HashMap<UserId, User>,
}

impl AuditList {
	pub fn target(&self, entry: &AuditEntry) -> Option<ResolvedEntity<'_>> {
		self.lookup(&entry.target)
	}

	pub fn source(&self, entry: &AuditEntry) -> Option<ResolvedEntity<'_>> {
		entry.source.as_ref().and_then(|source| self.lookup(source))
	}

	/// Resolve any reference against the loaded maps.
	///
	/// Returns `None` for unknown discriminators and for entities the loader
	/// did not return.
	pub fn lookup(&self, reference: &AuditRef) -> Option<ResolvedEntity<'_>> {
		match reference.kind().ok()? {
			EntityKind::Realms => self
				.realms
				.get(&RealmId::new(reference.resource_id))
				.map(ResolvedEntity::Realm),
			EntityKind::Users => self
				.users
				.get(&UserId::new(reference.resource_id))
				.map(ResolvedEntity::User),
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Group every reference on `entries` by kind.
///
/// Fails on the first unrecognized discriminator.
fn group_references(entries: &[AuditEntry]) -> AuditResult<BTreeMap<EntityKind, BTreeSet<Uuid>>> {
	let mut grouped: BTreeMap<EntityKind, BTreeSet<Uuid>> = BTreeMap::new();
	for reference in entries.iter().flat_map(AuditEntry::references) {
		let kind = reference.kind()?;
		grouped.entry(kind).or_default().insert(reference.resource_id);
	}
	Ok(grouped)
}

/// Load every entity referenced by `entries`.
///
/// All discriminators are validated before any loader call is made. Each
/// kind present is loaded once; entities the loader returns that were not
/// asked for are discarded so the resulting maps hold exactly the referenced
/// ids that exist.
#[tracing::instrument(skip(loader, entries), fields(entry_count = entries.len()))]
pub async fn resolve<L>(loader: &L, entries: Vec<AuditEntry>) -> AuditResult<AuditList>
where
	L: EntityLoader + ?Sized,
{
	let grouped = group_references(&entries)?;

	let mut list = AuditList {
		entries,
		..AuditList::default()
	};

	for (kind, ids) in grouped {
		match kind {
			EntityKind::Realms => {
				let wanted: Vec<RealmId> = ids.iter().copied().map(RealmId::new).collect();
				let realms = loader
					.load_realms(&wanted)
					.await
					.map_err(|source| AuditError::Load { kind, source })?;
				list.realms = realms
					.into_iter()
					.filter(|realm| ids.contains(realm.id.as_uuid()))
					.map(|realm| (realm.id, realm))
					.collect();
			}
			EntityKind::Users => {
				let wanted: Vec<UserId> = ids.iter().copied().map(UserId::new).collect();
				let users = loader
					.load_users(&wanted)
					.await
					.map_err(|source| AuditError::Load { kind, source })?;
				list.users = users
					.into_iter()
					.filter(|user| ids.contains(user.id.as_uuid()))
					.map(|user| (user.id, user))
					.collect();
			}
		}
		tracing::debug!(%kind, requested = ids.len(), "loaded audit references");
	}

	Ok(list)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::AuditEntryBuilder;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Default)]
	struct FakeLoader {
		realms: Vec<Realm>,
		users: Vec<User>,
		realm_calls: AtomicUsize,
		user_calls: AtomicUsize,
		fail_users: bool,
	}

	#[async_trait]
	impl EntityLoader for FakeLoader {
		async fn load_realms(&self, ids: &[RealmId]) -> Result<Vec<Realm>, LoadError> {
			self.realm_calls.fetch_add(1, Ordering::SeqCst);
			Ok(self
				.realms
				.iter()
				.filter(|r| ids.contains(&r.id))
				.cloned()
				.collect())
		}

		async fn load_users(&self, ids: &[UserId]) -> Result<Vec<User>, LoadError> {
			self.user_calls.fetch_add(1, Ordering::SeqCst);
			if self.fail_users {
				return Err("users table unavailable".into());
			}
			Ok(self
				.users
				.iter()
				.filter(|u| ids.contains(&u.id))
				.cloned()
				.collect())
		}
	}

	/// Returns everything it holds, ignoring the requested ids.
	struct GreedyLoader {
		users: Vec<User>,
	}

	#[async_trait]
	impl EntityLoader for GreedyLoader {
		async fn load_realms(&self, _ids: &[RealmId]) -> Result<Vec<Realm>, LoadError> {
			Ok(Vec::new())
		}

		async fn load_users(&self, _ids: &[UserId]) -> Result<Vec<User>, LoadError> {
			Ok(self.users.clone())
		}
	}

	#[tokio::test]
	async fn resolves_targets_and_sources_with_one_load_per_kind() {
		let realm = Realm::new("narnia");
		let seth = User::new("seth@example.com", "Seth");
		let susan = User::new("susan@example.com", "Susan");
		let loader = FakeLoader {
			realms: vec![realm.clone()],
			users: vec![seth.clone(), susan.clone()],
			..Default::default()
		};

		let entries = vec![
			AuditEntry::user_added_to_realm(susan.id, seth.id, realm.id),
			AuditEntry::user_added_to_realm(seth.id, susan.id, realm.id),
			AuditEntry::user_added_to_realm(susan.id, seth.id, realm.id),
		];

		let list = resolve(&loader, entries).await.unwrap();

		assert_eq!(loader.realm_calls.load(Ordering::SeqCst), 1);
		assert_eq!(loader.user_calls.load(Ordering::SeqCst), 1);
		assert_eq!(list.len(), 3);
		assert_eq!(list.realms.len(), 1);
		assert_eq!(list.users.len(), 2);

		let first = &list.entries[0];
		assert_eq!(list.target(first), Some(ResolvedEntity::User(&seth)));
		assert_eq!(list.source(first), Some(ResolvedEntity::Realm(&realm)));
		assert_eq!(list.source(first).unwrap().display_name(), "narnia");
	}

	#[tokio::test]
	async fn entries_without_source_contribute_only_their_target() {
		let seth = User::new("seth@example.com", "Seth");
		let loader = FakeLoader {
			users: vec![seth.clone()],
			..Default::default()
		};

		let entry =
			AuditEntryBuilder::new(UserId::generate(), "deleted user", AuditRef::user(seth.id))
				.build();

		let list = resolve(&loader, vec![entry]).await.unwrap();

		assert_eq!(loader.realm_calls.load(Ordering::SeqCst), 0);
		assert_eq!(loader.user_calls.load(Ordering::SeqCst), 1);
		assert!(list.realms.is_empty());
		assert!(list.source(&list.entries[0]).is_none());
		assert_eq!(
			list.users.keys().copied().collect::<Vec<_>>(),
			vec![seth.id]
		);
	}

	#[tokio::test]
	async fn unknown_discriminator_fails_before_any_load() {
		let loader = FakeLoader::default();
		let good = AuditEntry::user_added_to_realm(
			UserId::generate(),
			UserId::generate(),
			RealmId::generate(),
		);
		let mut bad = good.clone();
		bad.source = Some(AuditRef {
			resource_type: "apps".to_string(),
			resource_id: Uuid::new_v4(),
		});

		let err = resolve(&loader, vec![good, bad]).await.unwrap_err();

		assert!(matches!(err, AuditError::UnknownDiscriminator(ref s) if s == "apps"));
		assert_eq!(err.to_string(), "unknown polymorphic association \"apps\"");
		assert_eq!(loader.realm_calls.load(Ordering::SeqCst), 0);
		assert_eq!(loader.user_calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn loader_failure_is_propagated_with_kind() {
		let loader = FakeLoader {
			fail_users: true,
			..Default::default()
		};
		let entry = AuditEntry::user_added_to_realm(
			UserId::generate(),
			UserId::generate(),
			RealmId::generate(),
		);

		let err = resolve(&loader, vec![entry]).await.unwrap_err();

		assert!(matches!(
			err,
			AuditError::Load {
				kind: EntityKind::Users,
				..
			}
		));
	}

	#[tokio::test]
	async fn missing_entities_are_absent_from_maps() {
		let loader = FakeLoader::default();
		let entry = AuditEntry::user_added_to_realm(
			UserId::generate(),
			UserId::generate(),
			RealmId::generate(),
		);

		let list = resolve(&loader, vec![entry]).await.unwrap();

		assert!(list.users.is_empty());
		assert!(list.realms.is_empty());
		assert!(list.target(&list.entries[0]).is_none());
	}

	#[tokio::test]
	async fn unrequested_entities_are_discarded() {
		let wanted = User::new("wanted@example.com", "Wanted");
		let extra = User::new("extra@example.com", "Extra");
		let loader = GreedyLoader {
			users: vec![wanted.clone(), extra.clone()],
		};
		let entry =
			AuditEntryBuilder::new(UserId::generate(), "deleted user", AuditRef::user(wanted.id))
				.build();

		let list = resolve(&loader, vec![entry]).await.unwrap();

		assert!(list.users.contains_key(&wanted.id));
		assert!(!list.users.contains_key(&extra.id));
	}

	#[tokio::test]
	async fn empty_input_makes_no_calls() {
		let loader = FakeLoader::default();
		let list = resolve(&loader, Vec::new()).await.unwrap();
		assert!(list.is_empty());
		assert_eq!(loader.realm_calls.load(Ordering::SeqCst), 0);
		assert_eq!(loader.user_calls.load(Ordering::SeqCst), 0);
	}
}
