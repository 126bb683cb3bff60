// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use realm_server_api::ErrorResponse;
use realm_server_audit::AuditError;
use realm_server_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
	#[error("no realm in request context")]
	MissingRealm,

	#[error("no authenticated user in request context")]
	MissingUser,

	#[error("invalid request: {0}")]
	InvalidRequest(String),

	#[error("database error: {0}")]
	Database(#[from] DbError),

	#[error("audit resolution failed: {0}")]
	Audit(#[from] AuditError),
}

impl ApiError {
	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::MissingRealm | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
			ApiError::MissingUser => StatusCode::UNAUTHORIZED,
			ApiError::Database(_) | ApiError::Audit(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn code(&self) -> &'static str {
		match self {
			ApiError::MissingRealm => "missing_realm",
			ApiError::MissingUser => "missing_user",
			ApiError::InvalidRequest(_) => "invalid_request",
			ApiError::Database(_) | ApiError::Audit(_) => "internal_error",
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status();
		if status.is_server_error() {
			tracing::error!(error = %self, "Request failed");
		} else {
			tracing::debug!(error = %self, "Request rejected");
		}
		(status, Json(ErrorResponse::new(self.code(), self.to_string()))).into_response()
	}
}
