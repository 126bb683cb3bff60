// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod audit;
pub mod error;
pub mod users;

pub use audit::{
	AuditEntryResponse, AuditReferenceResponse, ListAuditEntriesParams, ListAuditEntriesResponse,
};
pub use error::ErrorResponse;
pub use users::{BatchUserEntry, UserBatchRequest, UserBatchResponse};
