// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core audit types.
//!
//! - [`EntityKind`]: the closed set of entity kinds an audit reference may point at
//! - [`AuditRef`]: a polymorphic `(resource_type, resource_id)` reference as stored
//! - [`AuditEntry`]: an immutable "who did what to whom, via what" record
//! - [`AuditEntryBuilder`]: fluent construction of entries
//!
//! References keep the discriminator as the raw stored string. Parsing into
//! [`EntityKind`] happens at read time so that rows written by another
//! version of the server surface as [`AuditError::UnknownDiscriminator`]
//! instead of being silently dropped during decoding.

use chrono::{DateTime, Utc};
use realm_server_auth::{RealmId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AuditError, AuditResult};

/// Default retention period for audit entries in days.
pub const DEFAULT_AUDIT_RETENTION_DAYS: i64 = 90;

/// Action recorded when a user is attached to a realm.
pub const ACTION_ADDED_USER: &str = "added user";

/// Entity kinds that can appear as an audit target or source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
	Realms,
	Users,
}

impl EntityKind {
	pub fn all() -> &'static [EntityKind] {
		&[EntityKind::Realms, EntityKind::Users]
	}

	/// The discriminator string persisted in `target_type` / `source_type`.
	pub fn as_str(&self) -> &'static str {
		match self {
			EntityKind::Realms => "realms",
			EntityKind::Users => "users",
		}
	}
}

impl fmt::Display for EntityKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for EntityKind {
	type Err = AuditError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"realms" => Ok(EntityKind::Realms),
			"users" => Ok(EntityKind::Users),
			other => Err(AuditError::UnknownDiscriminator(other.to_string())),
		}
	}
}

/// A polymorphic reference to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditRef {
	pub resource_type: String,
	pub resource_id: Uuid,
}

impl AuditRef {
	pub fn new(kind: EntityKind, id: impl Into<Uuid>) -> Self {
		Self {
			resource_type: kind.as_str().to_string(),
			resource_id: id.into(),
		}
	}

	pub fn user(id: UserId) -> Self {
		Self::new(EntityKind::Users, id)
	}

	pub fn realm(id: RealmId) -> Self {
		Self::new(EntityKind::Realms, id)
	}

	/// Parse the stored discriminator.
	pub fn kind(&self) -> AuditResult<EntityKind> {
		self.resource_type.parse()
	}
}

/// An immutable audit record.
///
/// If the audit was "Susan removed Seth from Narnia", Susan is the actor,
/// Seth the target and Narnia the source. The source is absent when the
/// action has no surrounding context ("Susan deleted Seth").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
	pub id: Uuid,
	pub actor_user_id: UserId,
	pub action: String,
	pub target: AuditRef,
	pub source: Option<AuditRef>,
	pub created_at: DateTime<Utc>,
}

impl AuditEntry {
	/// The entry written when `actor` attaches `user_id` to `realm_id`.
	pub fn user_added_to_realm(actor: UserId, user_id: UserId, realm_id: RealmId) -> Self {
		AuditEntryBuilder::new(actor, ACTION_ADDED_USER, AuditRef::user(user_id))
			.source(AuditRef::realm(realm_id))
			.build()
	}

	/// All references on this entry, target first.
	pub fn references(&self) -> impl Iterator<Item = &AuditRef> {
		std::iter::once(&self.target).chain(self.source.as_ref())
	}
}

/// Builder for [`AuditEntry`].
///
/// Actor, action and target are required; source and timestamp are optional.
#[derive(Debug, Clone)]
pub struct AuditEntryBuilder {
	actor_user_id: UserId,
	action: String,
	target: AuditRef,
	source: Option<AuditRef>,
	created_at: Option<DateTime<Utc>>,
}

impl AuditEntryBuilder {
	pub fn new(actor_user_id: UserId, action: impl Into<String>, target: AuditRef) -> Self {
		Self {
			actor_user_id,
			action: action.into(),
			target,
			source: None,
			created_at: None,
		}
	}

	/// Set the entity through which the target was acted upon.
	pub fn source(mut self, source: AuditRef) -> Self {
		self.source = Some(source);
		self
	}

	/// Override the creation timestamp. Defaults to now.
	pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
		self.created_at = Some(created_at);
		self
	}

	pub fn build(self) -> AuditEntry {
		AuditEntry {
			id: Uuid::new_v4(),
			actor_user_id: self.actor_user_id,
			action: self.action,
			target: self.target,
			source: self.source,
			created_at: self.created_at.unwrap_or_else(Utc::now),
		}
	}
}
