// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI documentation for realm-server, generated from the handler
//! annotations and the `realm-server-api` types.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
	info(
		title = "Realm Server API",
		version = "1.0.0",
		description = "Batch user import into realms and resolved realm audit history.",
		license(name = "Proprietary"),
		contact(
			name = "Geoffrey Huntley",
			email = "ghuntley@ghuntley.com",
			url = "https://ghuntley.com"
		)
	),
	servers(
		(url = "/", description = "Local server")
	),
	tags(
		(name = "users", description = "Batch import of users into the current realm"),
		(name = "audit", description = "Audit history for the current realm")
	),
	paths(
		crate::routes::users::import_users,
		crate::routes::audit::list_audit_entries,
	),
	components(
		schemas(
			realm_server_api::BatchUserEntry,
			realm_server_api::UserBatchRequest,
			realm_server_api::UserBatchResponse,
			realm_server_api::AuditReferenceResponse,
			realm_server_api::AuditEntryResponse,
			realm_server_api::ListAuditEntriesResponse,
			realm_server_api::ErrorResponse,
		)
	)
)]
pub struct ApiDoc;
