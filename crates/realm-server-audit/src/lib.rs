// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod error;
pub mod event;
pub mod resolver;

pub use error::{AuditError, AuditResult, LoadError};
pub use event::{
	AuditEntry, AuditEntryBuilder, AuditRef, EntityKind, ACTION_ADDED_USER,
	DEFAULT_AUDIT_RETENTION_DAYS,
};
pub use resolver::{resolve, AuditList, EntityLoader, ResolvedEntity};
