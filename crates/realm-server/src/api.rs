// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router.

use std::sync::Arc;

use axum::{
	routing::{get, post},
	Router,
};
use realm_server_audit::EntityLoader;
use realm_server_db::{AuditRepository, AuditStore, DbEntityLoader};
use realm_server_provisioning::{
	BatchImporter, CredentialNotifier, IdentityProvisioner, SqliteImportStore,
};
use sqlx::sqlite::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::routes;

/// Shared collaborators for every handler.
#[derive(Clone)]
pub struct AppState {
	pub importer: BatchImporter,
	pub audit: Arc<dyn AuditStore>,
	pub loader: Arc<dyn EntityLoader>,
}

/// Wire the SQLite-backed stores to the given identity provider and notifier.
pub fn create_app_state(
	pool: SqlitePool,
	identity: Arc<dyn IdentityProvisioner>,
	notifier: Arc<dyn CredentialNotifier>,
) -> AppState {
	let store = Arc::new(SqliteImportStore::new(pool.clone()));
	AppState {
		importer: BatchImporter::new(store, identity, notifier),
		audit: Arc::new(AuditRepository::new(pool.clone())),
		loader: Arc::new(DbEntityLoader::new(pool)),
	}
}

/// Realm-scoped routes.
///
/// Expects upstream middleware to insert [`CurrentUser`](crate::CurrentUser)
/// and [`CurrentRealm`](crate::CurrentRealm) extensions.
pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/api/realm/users/import", post(routes::users::import_users))
		.route("/api/realm/audit", get(routes::audit::list_audit_entries))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
