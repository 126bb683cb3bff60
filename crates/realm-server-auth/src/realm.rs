// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RealmId;

/// A tenant container. Users join realms; audit entries reference them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Realm {
	pub id: RealmId,
	pub name: String,
	pub created_at: DateTime<Utc>,
}

impl Realm {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			id: RealmId::generate(),
			name: name.into(),
			created_at: Utc::now(),
		}
	}
}
