// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # realm-server-db
//!
//! Persistence layer for the realm server using SQLite via sqlx.
//!
//! Each domain follows the same shape: a `*Store` trait describing the
//! operations and a `*Repository` struct holding a `SqlitePool` whose
//! inherent methods carry the implementation and `#[tracing::instrument]`.
//!
//! Writes that must commit together (a user row, its memberships and the
//! audit entry describing the change) go through [`with_transaction`] and the
//! `*_in_tx` associated functions, which take the open transaction rather
//! than the pool.
//!
//! `Result<Option<T>>` is returned for lookups where absence is normal.
//! Timestamps are fixed-width RFC 3339 strings (see [`types`]).

pub mod audit;
mod error;
pub mod loader;
pub mod pool;
pub mod realm;
pub mod transaction;
pub mod types;
pub mod user;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use audit::{AuditRepository, AuditStore};
pub use error::{DbError, Result};
pub use loader::DbEntityLoader;
pub use pool::{create_pool, run_migrations};
pub use realm::{RealmRepository, RealmStore};
pub use transaction::with_transaction;
pub use user::{UserRepository, UserStore};
