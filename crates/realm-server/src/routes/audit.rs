// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolved audit listing for the current realm.

use axum::{
	extract::{rejection::QueryRejection, Query, State},
	http::Extensions,
	Json,
};
use realm_server_api::{
	AuditEntryResponse, AuditReferenceResponse, ErrorResponse, ListAuditEntriesParams,
	ListAuditEntriesResponse,
};
use realm_server_audit::{resolve, AuditList, AuditRef};
use realm_server_db::audit::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

use crate::{api::AppState, context::require_context, error::ApiError};

fn reference_response(list: &AuditList, reference: &AuditRef) -> AuditReferenceResponse {
	AuditReferenceResponse {
		resource_type: reference.resource_type.clone(),
		resource_id: reference.resource_id.to_string(),
		display_name: list
			.lookup(reference)
			.map(|entity| entity.display_name().to_string()),
	}
}

fn render(list: &AuditList) -> Vec<AuditEntryResponse> {
	list.entries
		.iter()
		.map(|entry| AuditEntryResponse {
			id: entry.id.to_string(),
			actor_user_id: entry.actor_user_id.to_string(),
			action: entry.action.clone(),
			target: reference_response(list, &entry.target),
			source: entry
				.source
				.as_ref()
				.map(|source| reference_response(list, source)),
			created_at: entry.created_at,
		})
		.collect()
}

#[utoipa::path(
	get,
	path = "/api/realm/audit",
	params(ListAuditEntriesParams),
	responses(
		(status = 200, description = "Audit entries touching the current realm", body = ListAuditEntriesResponse),
		(status = 400, description = "No realm in context or malformed query", body = ErrorResponse),
		(status = 401, description = "Not authenticated", body = ErrorResponse),
		(status = 500, description = "Unknown reference type or database failure", body = ErrorResponse)
	),
	tag = "audit"
)]
/// List audit entries whose target or source is the current realm, newest
/// first, with every referenced realm and user resolved to a display name.
#[tracing::instrument(skip_all)]
pub async fn list_audit_entries(
	State(state): State<AppState>,
	extensions: Extensions,
	query: Result<Query<ListAuditEntriesParams>, QueryRejection>,
) -> Result<Json<ListAuditEntriesResponse>, ApiError> {
	let (realm, _user) = require_context(&extensions)?;
	let Query(params) = query.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;

	let limit = params
		.limit
		.unwrap_or(DEFAULT_PAGE_LIMIT)
		.clamp(0, MAX_PAGE_LIMIT);
	let offset = params.offset.unwrap_or(0).max(0);

	let (entries, total) = state
		.audit
		.list_entries_for_realm(&realm.id, Some(limit), Some(offset))
		.await?;

	let list = resolve(state.loader.as_ref(), entries).await?;

	tracing::debug!(realm_id = %realm.id, returned = list.len(), total, "Listed audit entries");

	Ok(Json(ListAuditEntriesResponse {
		entries: render(&list),
		total,
		limit,
		offset,
	}))
}
