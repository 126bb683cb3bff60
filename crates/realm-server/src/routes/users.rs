// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batch user import.

use axum::{
	extract::{rejection::JsonRejection, State},
	http::{Extensions, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use realm_server_api::{BatchUserEntry, ErrorResponse, UserBatchRequest, UserBatchResponse};
use realm_server_provisioning::{BatchImportReport, BatchUser};

use crate::{api::AppState, context::require_context, error::ApiError};

/// Code reported alongside the error summary of a batch.
const BATCH_ERROR_CODE: &str = "500";

fn to_response(report: &BatchImportReport) -> UserBatchResponse {
	let error = report.error_summary();
	UserBatchResponse {
		new_users: report
			.new_users
			.iter()
			.map(|u| BatchUserEntry {
				email: u.email.clone(),
				name: u.name.clone(),
			})
			.collect(),
		error_code: error.as_ref().map(|_| BATCH_ERROR_CODE.to_string()),
		error,
	}
}

#[utoipa::path(
	post,
	path = "/api/realm/users/import",
	request_body = UserBatchRequest,
	responses(
		(status = 200, description = "At least one user was created, or nothing failed", body = UserBatchResponse),
		(status = 400, description = "No realm in context or malformed body", body = ErrorResponse),
		(status = 401, description = "Not authenticated", body = ErrorResponse),
		(status = 500, description = "Every user in the batch failed", body = UserBatchResponse)
	),
	tag = "users"
)]
/// Import users into the current realm.
///
/// Each user is created if unknown (matched by exact email), attached to the
/// realm, given an identity account and, when the account is new, sent a
/// credential reset. Failures are collected per user; the request only fails
/// when no user was created and at least one failed.
#[tracing::instrument(skip_all)]
pub async fn import_users(
	State(state): State<AppState>,
	extensions: Extensions,
	body: Result<Json<UserBatchRequest>, JsonRejection>,
) -> Response {
	let (realm, actor) = match require_context(&extensions) {
		Ok(context) => context,
		Err(e) => return e.into_response(),
	};

	let Json(request) = match body {
		Ok(body) => body,
		Err(rejection) => return ApiError::InvalidRequest(rejection.body_text()).into_response(),
	};

	let users: Vec<BatchUser> = request
		.users
		.into_iter()
		.map(|u| BatchUser::new(u.email, u.name))
		.collect();

	tracing::info!(
		realm_id = %realm.id,
		actor_id = %actor.id,
		count = users.len(),
		"Importing users"
	);

	let report = state.importer.import(actor.id, &realm, &users).await;

	let status = if report.is_failure() {
		StatusCode::INTERNAL_SERVER_ERROR
	} else {
		StatusCode::OK
	};

	(status, Json(to_response(&report))).into_response()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_report_has_no_error_fields() {
		let response = to_response(&BatchImportReport::default());
		assert!(response.new_users.is_empty());
		assert!(response.error.is_none());
		assert!(response.error_code.is_none());
	}

	#[test]
	fn new_users_keep_request_order() {
		let report = BatchImportReport {
			new_users: vec![
				BatchUser::new("b@example.com", "B"),
				BatchUser::new("a@example.com", "A"),
			],
			..Default::default()
		};
		let response = to_response(&report);
		assert_eq!(response.new_users[0].email, "b@example.com");
		assert_eq!(response.new_users[1].email, "a@example.com");
	}
}
