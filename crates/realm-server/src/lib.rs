// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Realm server.
//!
//! HTTP endpoints for batch user import and resolved audit listings, plus
//! the audit retention job that purges entries past their age limit.

pub mod api;
pub mod api_docs;
pub mod context;
pub mod error;
pub mod jobs;
pub mod routes;

pub use api::{create_app_state, create_router, AppState};
pub use api_docs::ApiDoc;
pub use context::{CurrentRealm, CurrentUser};
pub use error::ApiError;
pub use jobs::AuditRetentionJob;
pub use realm_server_config::ServerConfig;
