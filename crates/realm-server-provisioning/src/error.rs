// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use realm_server_db::DbError;

/// Failure reported by an [`IdentityProvisioner`](crate::IdentityProvisioner).
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
	#[error("identity provider rejected {email}: {message}")]
	Rejected { email: String, message: String },

	#[error("identity provider unavailable: {0}")]
	Unavailable(String),
}

/// Failure reported by a [`CredentialNotifier`](crate::CredentialNotifier).
#[derive(Debug, thiserror::Error)]
#[error("failed to send credential reset to {email}: {message}")]
pub struct NotifyError {
	pub email: String,
	pub message: String,
}

/// Why a single descriptor in a batch did not complete.
///
/// None of these abort the batch; they are collected into
/// [`BatchErrors`](crate::BatchErrors).
#[derive(Debug, thiserror::Error)]
pub enum BatchEntryError {
	#[error("failed to look up user: {0}")]
	Lookup(#[source] DbError),

	#[error("failed to provision identity account: {0}")]
	Provisioning(#[from] IdentityError),

	#[error("{0}")]
	Notification(#[from] NotifyError),

	#[error("failed to save user: {0}")]
	Persistence(#[source] DbError),
}
