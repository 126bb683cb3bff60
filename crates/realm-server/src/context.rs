// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request context supplied by the surrounding authentication layer.
//!
//! Upstream middleware resolves the authenticated user and the realm the
//! request is scoped to, then inserts them as request extensions. Handlers
//! read them back from [`axum::http::Extensions`] and reject the request when
//! either is missing.

use axum::http::Extensions;
use realm_server_auth::{Realm, User};

use crate::error::ApiError;

/// The authenticated user performing the request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The realm the request is scoped to.
#[derive(Debug, Clone)]
pub struct CurrentRealm(pub Realm);

/// Pull the realm then the user out of the request extensions.
///
/// The realm is checked first so a request missing both reports the realm.
pub fn require_context(extensions: &Extensions) -> Result<(Realm, User), ApiError> {
	let realm = extensions
		.get::<CurrentRealm>()
		.map(|r| r.0.clone())
		.ok_or(ApiError::MissingRealm)?;
	let user = extensions
		.get::<CurrentUser>()
		.map(|u| u.0.clone())
		.ok_or(ApiError::MissingUser)?;
	Ok((realm, user))
}
