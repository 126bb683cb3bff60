// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use realm_server_auth::User;

use crate::error::{IdentityError, NotifyError};

/// Outcome of [`IdentityProvisioner::ensure_account`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
	/// The provider already had an account for this email.
	AlreadyExists,
	/// A new account was created by this call.
	Created,
}

/// External identity provider holding the user's login credentials.
#[async_trait]
pub trait IdentityProvisioner: Send + Sync {
	/// Ensure an account exists for `user.email`.
	async fn ensure_account(&self, user: &User) -> Result<AccountStatus, IdentityError>;
}

/// Delivers the "set your password" message to newly created accounts.
#[async_trait]
pub trait CredentialNotifier: Send + Sync {
	async fn send_credential_reset(&self, email: &str) -> Result<(), NotifyError>;
}
