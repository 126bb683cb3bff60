// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background maintenance jobs.

pub mod audit_retention;

pub use audit_retention::AuditRetentionJob;
