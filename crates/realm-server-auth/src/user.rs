// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User entity and realm membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{RealmId, UserId};

/// A system-wide identity.
///
/// Users are unique by email across every realm; membership in individual
/// realms is tracked as a set so adding the same realm twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	/// Unique identifier for this user.
	pub id: UserId,

	/// Email address. Unique across the whole system.
	pub email: String,

	/// Display name shown in the UI.
	pub display_name: String,

	/// Realms this user belongs to.
	pub realms: BTreeSet<RealmId>,

	/// When the user was created.
	pub created_at: DateTime<Utc>,

	/// When the user was last updated.
	pub updated_at: DateTime<Utc>,
}

impl User {
	/// Build a new, not-yet-persisted user with no memberships.
	pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: UserId::generate(),
			email: email.into(),
			display_name: display_name.into(),
			realms: BTreeSet::new(),
			created_at: now,
			updated_at: now,
		}
	}

	/// Add membership in `realm_id`.
	///
	/// Returns `true` if the membership is new.
	pub fn add_realm(&mut self, realm_id: RealmId) -> bool {
		self.realms.insert(realm_id)
	}

	pub fn is_member_of(&self, realm_id: &RealmId) -> bool {
		self.realms.contains(realm_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn new_user_has_no_memberships() {
		let user = User::new("alice@example.com", "Alice");
		assert_eq!(user.email, "alice@example.com");
		assert_eq!(user.display_name, "Alice");
		assert!(user.realms.is_empty());
		assert_eq!(user.created_at, user.updated_at);
	}

	#[test]
	fn add_realm_is_idempotent() {
		let mut user = User::new("bob@example.com", "Bob");
		let realm = RealmId::generate();

		assert!(user.add_realm(realm));
		assert!(!user.add_realm(realm));
		assert_eq!(user.realms.len(), 1);
		assert!(user.is_member_of(&realm));
	}

	#[test]
	fn add_realm_keeps_prior_memberships() {
		let mut user = User::new("carol@example.com", "Carol");
		let first = RealmId::generate();
		let second = RealmId::generate();

		user.add_realm(first);
		user.add_realm(second);

		assert!(user.is_member_of(&first));
		assert!(user.is_member_of(&second));
	}

	proptest! {
		#[test]
		fn membership_count_equals_distinct_realms(picks in proptest::collection::vec(0usize..5, 0..40)) {
			let pool: Vec<RealmId> = (0..5).map(|_| RealmId::generate()).collect();
			let mut user = User::new("p@example.com", "P");
			let mut distinct = BTreeSet::new();
			for i in picks {
				user.add_realm(pool[i]);
				distinct.insert(pool[i]);
			}
			prop_assert_eq!(user.realms.len(), distinct.len());
		}
	}
}
