// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use realm_server_auth::User;
use realm_server_db::DbError;

use crate::store::ImportStore;

/// Fetch the user with `email`, or build an unsaved one.
///
/// Returns the user and whether it already existed. Nothing is persisted.
/// Lookup failures other than absence are returned as-is.
pub async fn find_or_build<S>(store: &S, email: &str, name: &str) -> Result<(User, bool), DbError>
where
	S: ImportStore + ?Sized,
{
	match store.get_user_by_email(email).await? {
		Some(user) => Ok((user, true)),
		None => Ok((User::new(email, name), false)),
	}
}
