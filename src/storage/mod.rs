// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! # Certificate Storage
//!
//! Certificate rows, mint idempotency records, notifications and the audit
//! trail live in one embedded redb file (`CERT_DB_PATH`).
//!
//! Rows are never deleted by the service. Chain projections start empty and
//! are filled as each chain reports in.

pub mod audit;
pub mod certificate_db;
pub mod records;

pub use audit::{AuditEvent, AuditEventType};
pub use certificate_db::{CertDbResult, CertificateDatabase, CertificateDbError, MintBegin};
pub use records::{
    CertificateRecord, CrestProjection, MintOutcome, MintRecord, MintState, NewCertificate,
    Notification, OriluxProjection,
};
