// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

/// One side of an audit entry (target or source).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AuditReferenceResponse {
	pub resource_type: String,
	pub resource_id: String,
	/// Realm name or user display name. Absent when the entity no longer exists.
	pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AuditEntryResponse {
	pub id: String,
	pub actor_user_id: String,
	pub action: String,
	pub target: AuditReferenceResponse,
	pub source: Option<AuditReferenceResponse>,
	pub created_at: DateTime<Utc>,
}

/// Paginated, resolved audit entries for a realm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListAuditEntriesResponse {
	pub entries: Vec<AuditEntryResponse>,
	pub total: i64,
	pub limit: i64,
	pub offset: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ListAuditEntriesParams {
	pub limit: Option<i64>,
	pub offset: Option<i64>,
}
