// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

use crate::event::EntityKind;

pub type AuditResult<T> = Result<T, AuditError>;

/// Error returned by an [`EntityLoader`](crate::EntityLoader) bulk lookup.
pub type LoadError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum AuditError {
	#[error("unknown polymorphic association {0:?}")]
	UnknownDiscriminator(String),

	#[error("failed to load {kind}: {source}")]
	Load {
		kind: EntityKind,
		#[source]
		source: LoadError,
	},
}
