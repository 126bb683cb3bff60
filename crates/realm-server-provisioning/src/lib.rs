// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batch import of users into realms.
//!
//! [`BatchImporter`] creates or attaches each user, provisions their
//! identity account, notifies new accounts, and records the membership
//! change together with its audit entry in one transaction.

pub mod batch;
pub mod error;
pub mod identity;
pub mod store;
pub mod upsert;

pub use batch::{BatchErrors, BatchFailure, BatchImportReport, BatchImporter, BatchUser};
pub use error::{BatchEntryError, IdentityError, NotifyError};
pub use identity::{AccountStatus, CredentialNotifier, IdentityProvisioner};
pub use store::{ImportStore, SqliteImportStore};
pub use upsert::find_or_build;
