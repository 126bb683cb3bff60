// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core identity types shared by the realm server crates.
//!
//! - [`UserId`], [`RealmId`]: type-safe UUID wrappers
//! - [`User`]: a system-wide identity keyed by email, with a set of realm memberships
//! - [`Realm`]: a tenant container

pub mod realm;
pub mod types;
pub mod user;

pub use realm::Realm;
pub use types::{RealmId, UserId};
pub use user::User;
