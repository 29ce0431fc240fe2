// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Audit trail for blockchain writes and certificate state changes.
//!
//! Events are appended to the `audit_events` table of the certificate
//! database. Audit writes are best effort: callers log and continue on error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Types of auditable events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    CertificateRegistered,

    // Destination-chain mint
    MintConfirmed,
    MintFailed,

    // Source-ledger and chain-event ingestion
    OriluxchainVerified,
    ChainEventApplied,

    OwnershipReconciled,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// User the event concerns (if known).
    pub user_id: Option<String>,
    /// Resource affected (certificate id, tx hash).
    pub resource_id: Option<String>,
    /// Resource type (`nft_certificate`, `blockchain_transaction`).
    pub resource_type: Option<String>,
    /// Additional details as JSON.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error message if operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            user_id: None,
            resource_id: None,
            resource_type: None,
            details: None,
            success: true,
            error: None,
        }
    }

    /// Set the user ID.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the resource.
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }

    /// Table key: RFC 3339 timestamp then event id, so scans run oldest first.
    pub(crate) fn storage_key(&self) -> String {
        format!(
            "{}|{}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.6fZ"),
            self.event_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_sets_fields() {
        let event = AuditEvent::new(AuditEventType::MintFailed)
            .with_user("user-1")
            .with_resource("nft_certificate", "CERT-1")
            .with_details(json!({ "network": "CRESTCHAIN" }))
            .failed("Contract 0xdead not whitelisted");

        assert_eq!(event.user_id.as_deref(), Some("user-1"));
        assert_eq!(event.resource_type.as_deref(), Some("nft_certificate"));
        assert_eq!(event.resource_id.as_deref(), Some("CERT-1"));
        assert!(!event.success);
        assert_eq!(event.details.unwrap()["network"], "CRESTCHAIN");
    }

    #[test]
    fn storage_keys_sort_by_time() {
        let mut first = AuditEvent::new(AuditEventType::MintConfirmed);
        let mut second = AuditEvent::new(AuditEventType::MintConfirmed);
        first.timestamp = Utc::now() - chrono::Duration::seconds(5);
        second.timestamp = Utc::now();
        assert!(first.storage_key() < second.storage_key());
    }

    #[test]
    fn event_type_serializes_snake_case() {
        let json = serde_json::to_value(AuditEventType::OriluxchainVerified).unwrap();
        assert_eq!(json, "oriluxchain_verified");
    }
}
