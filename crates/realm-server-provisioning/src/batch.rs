// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batch import of users into a realm.
//!
//! Each descriptor is processed on its own: a failure is recorded against
//! that descriptor and the batch moves on. Per descriptor the steps are
//!
//! 1. find the user by email, or build a new one
//! 2. add the realm to the user's memberships
//! 3. ensure an identity provider account exists
//! 4. if the account is new, report the descriptor and send a credential reset
//! 5. save the user and an "added user" audit entry in one transaction
//!
//! A failed notification ends processing of that descriptor after step 4,
//! so the user stays reported as new even though step 5 never runs.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use realm_server_audit::AuditEntry;
use realm_server_auth::{Realm, UserId};
use serde::{Deserialize, Serialize};

use crate::error::BatchEntryError;
use crate::identity::{AccountStatus, CredentialNotifier, IdentityProvisioner};
use crate::store::ImportStore;
use crate::upsert::find_or_build;

/// One user as given in an import request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchUser {
	pub email: String,
	pub name: String,
}

impl BatchUser {
	pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			email: email.into(),
			name: name.into(),
		}
	}
}

/// A failure recorded against one descriptor.
#[derive(Debug)]
pub struct BatchFailure {
	/// Zero-based position in the request.
	pub index: usize,
	pub email: String,
	pub error: BatchEntryError,
}

impl fmt::Display for BatchFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "user #{} ({}): {}", self.index + 1, self.email, self.error)
	}
}

/// Accumulates per-descriptor failures without short-circuiting.
#[derive(Debug, Default)]
pub struct BatchErrors {
	failures: Vec<BatchFailure>,
}

impl BatchErrors {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, index: usize, email: impl Into<String>, error: BatchEntryError) {
		self.failures.push(BatchFailure {
			index,
			email: email.into(),
			error,
		});
	}

	pub fn is_empty(&self) -> bool {
		self.failures.is_empty()
	}

	pub fn len(&self) -> usize {
		self.failures.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &BatchFailure> {
		self.failures.iter()
	}

	/// One message covering every failure, or `None` when there are none.
	///
	/// ```text
	/// 2 errors occurred:
	/// 	* user #1 (a@example.com): failed to look up user: ...
	/// 	* user #3 (c@example.com): failed to save user: ...
	/// ```
	pub fn summary(&self) -> Option<String> {
		if self.failures.is_empty() {
			return None;
		}

		let header = match self.failures.len() {
			1 => "1 error occurred:".to_string(),
			n => format!("{n} errors occurred:"),
		};
		let lines = self
			.failures
			.iter()
			.map(|failure| format!("\t* {failure}"))
			.collect::<Vec<_>>()
			.join("\n");
		Some(format!("{header}\n{lines}"))
	}
}

/// Result of one batch.
#[derive(Debug, Default)]
pub struct BatchImportReport {
	/// Descriptors whose identity account was created by this batch, in
	/// request order.
	pub new_users: Vec<BatchUser>,
	pub errors: BatchErrors,
}

impl BatchImportReport {
	/// A batch fails overall only when nothing new was created and at least
	/// one descriptor failed. Partial success is success.
	pub fn is_failure(&self) -> bool {
		self.new_users.is_empty() && !self.errors.is_empty()
	}

	pub fn error_summary(&self) -> Option<String> {
		self.errors.summary()
	}
}

/// Outcome of a single descriptor.
struct EntryOutcome {
	created: bool,
	error: Option<BatchEntryError>,
}

impl EntryOutcome {
	fn failed(created: bool, error: impl Into<BatchEntryError>) -> Self {
		Self {
			created,
			error: Some(error.into()),
		}
	}
}

/// Drives batch imports against the configured collaborators.
#[derive(Clone)]
pub struct BatchImporter {
	store: Arc<dyn ImportStore>,
	identity: Arc<dyn IdentityProvisioner>,
	notifier: Arc<dyn CredentialNotifier>,
}

impl BatchImporter {
	pub fn new(
		store: Arc<dyn ImportStore>,
		identity: Arc<dyn IdentityProvisioner>,
		notifier: Arc<dyn CredentialNotifier>,
	) -> Self {
		Self {
			store,
			identity,
			notifier,
		}
	}

	/// Import `users` into `realm` on behalf of `actor`.
	///
	/// Never fails as a whole; inspect [`BatchImportReport::is_failure`].
	#[tracing::instrument(skip(self, realm, users), fields(realm_id = %realm.id, count = users.len()))]
	pub async fn import(&self, actor: UserId, realm: &Realm, users: &[BatchUser]) -> BatchImportReport {
		let mut report = BatchImportReport::default();

		for (index, descriptor) in users.iter().enumerate() {
			let outcome = self.import_one(actor, realm, descriptor).await;

			if outcome.created {
				report.new_users.push(descriptor.clone());
			}
			if let Some(error) = outcome.error {
				tracing::error!(index, email = %descriptor.email, error = %error, "batch user failed");
				report.errors.add(index, &descriptor.email, error);
			}
		}

		tracing::info!(
			new_users = report.new_users.len(),
			errors = report.errors.len(),
			"batch import completed"
		);
		report
	}

	async fn import_one(&self, actor: UserId, realm: &Realm, descriptor: &BatchUser) -> EntryOutcome {
		let (mut user, was_existing) =
			match find_or_build(self.store.as_ref(), &descriptor.email, &descriptor.name).await {
				Ok(found) => found,
				Err(e) => return EntryOutcome::failed(false, BatchEntryError::Lookup(e)),
			};

		if user.add_realm(realm.id) && was_existing {
			user.updated_at = Utc::now();
		}

		let created = match self.identity.ensure_account(&user).await {
			Ok(AccountStatus::Created) => true,
			Ok(AccountStatus::AlreadyExists) => false,
			Err(e) => return EntryOutcome::failed(false, e),
		};

		if created {
			if let Err(e) = self.notifier.send_credential_reset(&user.email).await {
				return EntryOutcome::failed(true, e);
			}
		}

		let entry = AuditEntry::user_added_to_realm(actor, user.id, realm.id);
		if let Err(e) = self.store.save_user_with_audit(&user, &entry).await {
			return EntryOutcome::failed(created, BatchEntryError::Persistence(e));
		}

		tracing::debug!(user_id = %user.id, created, was_existing, "batch user imported");
		EntryOutcome {
			created,
			error: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::{IdentityError, NotifyError};
	use crate::store::SqliteImportStore;
	use async_trait::async_trait;
	use proptest::prelude::*;
	use realm_server_auth::User;
	use realm_server_db::testing::create_test_pool;
	use realm_server_db::{DbError, RealmRepository, UserRepository};
	use std::collections::{HashMap, HashSet};
	use std::sync::Mutex;

	#[derive(Default)]
	struct MemoryStore {
		users: Mutex<HashMap<String, User>>,
		entries: Mutex<Vec<AuditEntry>>,
		fail_lookup: HashSet<String>,
		fail_save: HashSet<String>,
	}

	#[async_trait]
	impl ImportStore for MemoryStore {
		async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
			if self.fail_lookup.contains(email) {
				return Err(DbError::Internal("lookup exploded".to_string()));
			}
			Ok(self.users.lock().unwrap().get(email).cloned())
		}

		async fn save_user_with_audit(&self, user: &User, entry: &AuditEntry) -> Result<(), DbError> {
			if self.fail_save.contains(&user.email) {
				return Err(DbError::Internal("disk full".to_string()));
			}
			self
				.users
				.lock()
				.unwrap()
				.insert(user.email.clone(), user.clone());
			self.entries.lock().unwrap().push(entry.clone());
			Ok(())
		}
	}

	#[derive(Default)]
	struct FakeIdentity {
		existing: Mutex<HashSet<String>>,
		reject: HashSet<String>,
	}

	#[async_trait]
	impl IdentityProvisioner for FakeIdentity {
		async fn ensure_account(&self, user: &User) -> Result<AccountStatus, IdentityError> {
			if self.reject.contains(&user.email) {
				return Err(IdentityError::Rejected {
					email: user.email.clone(),
					message: "invalid email".to_string(),
				});
			}
			if self.existing.lock().unwrap().insert(user.email.clone()) {
				Ok(AccountStatus::Created)
			} else {
				Ok(AccountStatus::AlreadyExists)
			}
		}
	}

	#[derive(Default)]
	struct FakeNotifier {
		sent: Mutex<Vec<String>>,
		fail: HashSet<String>,
	}

	#[async_trait]
	impl CredentialNotifier for FakeNotifier {
		async fn send_credential_reset(&self, email: &str) -> Result<(), NotifyError> {
			if self.fail.contains(email) {
				return Err(NotifyError {
					email: email.to_string(),
					message: "smtp timeout".to_string(),
				});
			}
			self.sent.lock().unwrap().push(email.to_string());
			Ok(())
		}
	}

	fn set(items: &[&str]) -> HashSet<String> {
		items.iter().map(|s| s.to_string()).collect()
	}

	fn importer(
		store: Arc<MemoryStore>,
		identity: Arc<FakeIdentity>,
		notifier: Arc<FakeNotifier>,
	) -> BatchImporter {
		BatchImporter::new(store, identity, notifier)
	}

	fn three_users() -> Vec<BatchUser> {
		vec![
			BatchUser::new("a@example.com", "A"),
			BatchUser::new("b@example.com", "B"),
			BatchUser::new("c@example.com", "C"),
		]
	}

	#[tokio::test]
	async fn all_new_users_succeed() {
		let store = Arc::new(MemoryStore::default());
		let notifier = Arc::new(FakeNotifier::default());
		let importer = importer(store.clone(), Arc::default(), notifier.clone());
		let realm = Realm::new("narnia");
		let actor = UserId::generate();

		let report = importer.import(actor, &realm, &three_users()).await;

		assert_eq!(report.new_users, three_users());
		assert!(report.errors.is_empty());
		assert!(!report.is_failure());
		assert!(report.error_summary().is_none());
		assert_eq!(notifier.sent.lock().unwrap().len(), 3);

		let entries = store.entries.lock().unwrap();
		assert_eq!(entries.len(), 3);
		for entry in entries.iter() {
			assert_eq!(entry.actor_user_id, actor);
			assert_eq!(entry.action, "added user");
			assert_eq!(entry.target.resource_type, "users");
			assert_eq!(entry.source.as_ref().unwrap().resource_type, "realms");
			assert_eq!(entry.source.as_ref().unwrap().resource_id, realm.id.into_inner());
		}
	}

	#[tokio::test]
	async fn middle_identity_failure_is_partial_success() {
		let store = Arc::new(MemoryStore::default());
		let identity = Arc::new(FakeIdentity {
			reject: set(&["b@example.com"]),
			..Default::default()
		});
		let importer = importer(store.clone(), identity, Arc::default());
		let realm = Realm::new("narnia");

		let report = importer
			.import(UserId::generate(), &realm, &three_users())
			.await;

		assert_eq!(
			report.new_users,
			vec![
				BatchUser::new("a@example.com", "A"),
				BatchUser::new("c@example.com", "C"),
			]
		);
		assert_eq!(report.errors.len(), 1);
		assert!(!report.is_failure());

		let summary = report.error_summary().unwrap();
		assert!(summary.starts_with("1 error occurred:\n\t* user #2 (b@example.com): "));
		assert!(summary.contains("invalid email"));

		assert_eq!(store.entries.lock().unwrap().len(), 2);
		assert!(!store.users.lock().unwrap().contains_key("b@example.com"));
	}

	#[tokio::test]
	async fn all_failures_is_overall_failure() {
		let store = Arc::new(MemoryStore {
			fail_lookup: set(&["a@example.com", "b@example.com", "c@example.com"]),
			..Default::default()
		});
		let importer = importer(store, Arc::default(), Arc::default());

		let report = importer
			.import(UserId::generate(), &Realm::new("narnia"), &three_users())
			.await;

		assert!(report.new_users.is_empty());
		assert_eq!(report.errors.len(), 3);
		assert!(report.is_failure());
		let summary = report.error_summary().unwrap();
		assert!(summary.starts_with("3 errors occurred:\n"));
		assert!(summary.contains("user #3 (c@example.com): failed to look up user"));
	}

	#[tokio::test]
	async fn empty_batch_is_success() {
		let importer = importer(Arc::default(), Arc::default(), Arc::default());
		let report = importer
			.import(UserId::generate(), &Realm::new("narnia"), &[])
			.await;
		assert!(report.new_users.is_empty());
		assert!(!report.is_failure());
	}

	#[tokio::test]
	async fn notification_failure_keeps_user_new_but_skips_save() {
		let store = Arc::new(MemoryStore::default());
		let notifier = Arc::new(FakeNotifier {
			fail: set(&["a@example.com"]),
			..Default::default()
		});
		let importer = importer(store.clone(), Arc::default(), notifier);

		let report = importer
			.import(
				UserId::generate(),
				&Realm::new("narnia"),
				&[BatchUser::new("a@example.com", "A")],
			)
			.await;

		assert_eq!(report.new_users.len(), 1);
		assert_eq!(report.errors.len(), 1);
		assert!(!report.is_failure());
		assert!(matches!(
			report.errors.iter().next().unwrap().error,
			BatchEntryError::Notification(_)
		));
		assert!(store.entries.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn save_failure_after_creation_keeps_user_new() {
		let store = Arc::new(MemoryStore {
			fail_save: set(&["a@example.com"]),
			..Default::default()
		});
		let importer = importer(store.clone(), Arc::default(), Arc::default());

		let report = importer
			.import(
				UserId::generate(),
				&Realm::new("narnia"),
				&[BatchUser::new("a@example.com", "A")],
			)
			.await;

		assert_eq!(report.new_users.len(), 1);
		assert!(matches!(
			report.errors.iter().next().unwrap().error,
			BatchEntryError::Persistence(_)
		));
		assert!(report
			.error_summary()
			.unwrap()
			.contains("failed to save user: Internal: disk full"));
	}

	#[tokio::test]
	async fn existing_account_is_attached_but_not_reported_new() {
		let store = Arc::new(MemoryStore::default());
		let identity = Arc::new(FakeIdentity {
			existing: Mutex::new(set(&["a@example.com"])),
			..Default::default()
		});
		let notifier = Arc::new(FakeNotifier::default());
		let importer = importer(store.clone(), identity, notifier.clone());

		let report = importer
			.import(
				UserId::generate(),
				&Realm::new("narnia"),
				&[BatchUser::new("a@example.com", "A")],
			)
			.await;

		assert!(report.new_users.is_empty());
		assert!(report.errors.is_empty());
		assert!(!report.is_failure());
		assert!(notifier.sent.lock().unwrap().is_empty());
		assert_eq!(store.entries.lock().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn existing_user_in_other_realm_keeps_prior_membership() {
		let store = Arc::new(MemoryStore::default());
		let first = Realm::new("first");
		let second = Realm::new("second");
		let mut existing = User::new("a@example.com", "A");
		existing.add_realm(first.id);
		store
			.users
			.lock()
			.unwrap()
			.insert(existing.email.clone(), existing.clone());
		let identity = Arc::new(FakeIdentity {
			existing: Mutex::new(set(&["a@example.com"])),
			..Default::default()
		});
		let importer = importer(store.clone(), identity, Arc::default());

		importer
			.import(
				UserId::generate(),
				&second,
				&[BatchUser::new("a@example.com", "Renamed")],
			)
			.await;

		let users = store.users.lock().unwrap();
		let saved = users.get("a@example.com").unwrap();
		assert_eq!(saved.id, existing.id);
		assert_eq!(saved.display_name, "A");
		assert!(saved.is_member_of(&first.id));
		assert!(saved.is_member_of(&second.id));
	}

	#[tokio::test]
	async fn sqlite_batch_persists_users_entries_and_memberships() {
		let pool = create_test_pool().await;
		let realm = Realm::new("narnia");
		RealmRepository::new(pool.clone())
			.create_realm(&realm)
			.await
			.unwrap();
		let identity = Arc::new(FakeIdentity {
			reject: set(&["b@example.com"]),
			..Default::default()
		});
		let importer = BatchImporter::new(
			Arc::new(SqliteImportStore::new(pool.clone())),
			identity,
			Arc::new(FakeNotifier::default()),
		);
		let actor = UserId::generate();

		let report = importer.import(actor, &realm, &three_users()).await;
		assert_eq!(report.new_users.len(), 2);

		// Re-importing the same users must not duplicate membership rows.
		let again = importer.import(actor, &realm, &three_users()).await;
		assert!(again.new_users.is_empty());

		let memberships: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_realms")
			.fetch_one(&pool)
			.await
			.unwrap();
		let entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_entries")
			.fetch_one(&pool)
			.await
			.unwrap();
		assert_eq!(memberships, 2);
		assert_eq!(entries, 4);

		let users = UserRepository::new(pool);
		let a = users.get_user_by_email("a@example.com").await.unwrap().unwrap();
		assert!(a.is_member_of(&realm.id));
		assert!(users
			.get_user_by_email("b@example.com")
			.await
			.unwrap()
			.is_none());
	}

	#[test]
	fn summary_numbers_are_one_based() {
		let mut errors = BatchErrors::new();
		errors.add(
			0,
			"a@example.com",
			BatchEntryError::Provisioning(IdentityError::Unavailable("down".to_string())),
		);
		assert_eq!(
			errors.summary().unwrap(),
			"1 error occurred:\n\t* user #1 (a@example.com): failed to provision identity account: identity provider unavailable: down"
		);
	}

	proptest! {
		#![proptest_config(ProptestConfig::with_cases(32))]

		#[test]
		fn report_accounting_holds(outcomes in proptest::collection::vec(0u8..4, 0..12)) {
			// 0 = ok, 1 = identity rejects, 2 = notification fails, 3 = save fails
			let users: Vec<BatchUser> = outcomes
				.iter()
				.enumerate()
				.map(|(i, _)| BatchUser::new(format!("u{i}@example.com"), format!("U{i}")))
				.collect();
			let pick = |want: u8| -> HashSet<String> {
				outcomes
					.iter()
					.zip(&users)
					.filter(|(o, _)| **o == want)
					.map(|(_, u)| u.email.clone())
					.collect()
			};

			let store = Arc::new(MemoryStore { fail_save: pick(3), ..Default::default() });
			let identity = Arc::new(FakeIdentity { reject: pick(1), ..Default::default() });
			let notifier = Arc::new(FakeNotifier { fail: pick(2), ..Default::default() });
			let importer = BatchImporter::new(store.clone(), identity, notifier);

			let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
			let report = rt.block_on(importer.import(UserId::generate(), &Realm::new("r"), &users));

			let failures = outcomes.iter().filter(|o| **o != 0).count();
			let rejected = outcomes.iter().filter(|o| **o == 1).count();
			let saved = outcomes.iter().filter(|o| **o == 0).count();

			prop_assert!(report.new_users.len() <= users.len());
			prop_assert_eq!(report.new_users.len(), users.len() - rejected);
			prop_assert_eq!(report.errors.len(), failures);
			prop_assert_eq!(store.entries.lock().unwrap().len(), saved);
			prop_assert_eq!(report.is_failure(), report.new_users.is_empty() && failures > 0);
		}
	}
}
