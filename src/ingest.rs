// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Applies chain notifications to stored certificates.
//!
//! Every write goes through [`CertificateDatabase::update_certificate`], which
//! skips unchanged rows, so redelivered events leave the stored state
//! (including `updated_at`) as it was.

use serde_json::json;

use crate::models::{BlockchainEvent, ChainEventUpdate};
use crate::storage::{
    AuditEvent, AuditEventType, CertDbResult, CertificateDatabase, CertificateDbError,
    CertificateRecord, Notification, OriluxProjection,
};

/// Apply a chain event to its certificate.
///
/// Returns `None` when no certificate matched; that is not an error.
pub fn apply_chain_event(
    db: &CertificateDatabase,
    update: &ChainEventUpdate,
) -> CertDbResult<Option<CertificateRecord>> {
    let certificate_id = update.certificate_id.as_str();
    if update.is_empty() {
        tracing::debug!(certificate_id, "Chain event carried no fields");
    }

    let before = db.get_certificate(certificate_id)?;
    let Some(before) = before else {
        tracing::warn!(certificate_id, "Chain event for unknown certificate");
        return Ok(None);
    };

    let updated = db.update_certificate(certificate_id, |record| update.apply(record))?;
    if let Some(after) = &updated {
        if after != &before {
            tracing::info!(
                certificate_id,
                is_verified = after.is_verified,
                block_number = ?after.block_number,
                "Chain event applied"
            );
            let event = AuditEvent::new(AuditEventType::ChainEventApplied)
                .with_resource("nft_certificate", certificate_id)
                .with_details(json!({
                    "is_verified": update.is_verified,
                    "block_number": update.block_number,
                    "transaction_hash": update.transaction_hash,
                }));
            if let Err(e) = db.append_audit(&event) {
                tracing::warn!(error = %e, "Failed to append audit event");
            }
        }
    }
    Ok(updated)
}

/// Oriluxchain projection carried by a verification webhook.
pub fn orilux_projection(blockchain: Option<&BlockchainEvent>) -> OriluxProjection {
    let data = blockchain.cloned().unwrap_or_default();
    OriluxProjection {
        status: Some("verified".to_string()),
        block_number: data
            .block_number
            .as_ref()
            .and_then(|b| b.as_text())
            .and_then(|b| b.parse().ok()),
        tx_hash: data.tx_hash.filter(|s| !s.is_empty()),
        timestamp: data.timestamp,
    }
}

/// Record an Oriluxchain verification and notify the certificate owner.
///
/// Unknown certificates are reported as [`CertificateDbError::NotFound`].
pub fn apply_oriluxchain_verification(
    db: &CertificateDatabase,
    certificate_id: &str,
    event: &str,
    blockchain: Option<&BlockchainEvent>,
) -> CertDbResult<CertificateRecord> {
    let projection = orilux_projection(blockchain);
    let before = db
        .get_certificate(certificate_id)?
        .ok_or_else(|| CertificateDbError::NotFound(format!("Certificate {certificate_id}")))?;

    let after = db
        .update_certificate(certificate_id, |record| {
            record.oriluxchain = Some(projection.clone());
        })?
        .ok_or_else(|| CertificateDbError::NotFound(format!("Certificate {certificate_id}")))?;

    if after == before {
        tracing::debug!(certificate_id, "Oriluxchain verification already recorded");
        return Ok(after);
    }

    tracing::info!(
        certificate_id,
        event,
        block_number = ?projection.block_number,
        "Certificate verified on Oriluxchain"
    );

    let mut audit = AuditEvent::new(AuditEventType::OriluxchainVerified)
        .with_resource("nft_certificate", certificate_id)
        .with_details(json!({
            "event": event,
            "block_number": projection.block_number,
            "tx_hash": projection.tx_hash,
        }));
    if let Some(user) = &after.user_id {
        audit = audit.with_user(user.clone());
    }
    if let Err(e) = db.append_audit(&audit) {
        tracing::warn!(error = %e, "Failed to append audit event");
    }

    if let Some(user) = &after.user_id {
        let notification = Notification::new(
            user.clone(),
            "certificate_verified",
            "Certificate verified",
            format!("Certificate {certificate_id} was verified on Oriluxchain"),
        )
        .with_action_url(format!("/certificate/{certificate_id}"))
        .with_data(json!({
            "certificate_id": certificate_id,
            "block_number": projection.block_number,
            "tx_hash": projection.tx_hash,
        }));
        if let Err(e) = db.insert_notification(&notification) {
            tracing::warn!(user_id = %user, error = %e, "Failed to insert notification");
        }
    }

    Ok(after)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChainEventPayload, CrestchainWebhookPayload, NumberOrText};
    use crate::storage::NewCertificate;

    fn temp_db() -> (CertificateDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = CertificateDatabase::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn register(db: &CertificateDatabase, id: &str, user: Option<&str>) {
        db.insert_certificate(NewCertificate {
            certificate_id: id.to_string(),
            user_id: user.map(str::to_string),
            ..Default::default()
        })
        .unwrap();
    }

    fn crest_payload(id: &str) -> CrestchainWebhookPayload {
        serde_json::from_value(json!({
            "event": "block_confirmed",
            "certificate_id": id,
            "blockchain": {
                "hash": "0xabc",
                "status": "verified",
                "block_number": 1234,
                "tx_hash": "0xdef",
                "timestamp": 1700000000
            }
        }))
        .unwrap()
    }

    #[test]
    fn chain_event_is_idempotent() {
        let (db, _dir) = temp_db();
        register(&db, "CERT-1", None);
        let update = ChainEventUpdate::from(&crest_payload("CERT-1"));

        let first = apply_chain_event(&db, &update).unwrap().unwrap();
        assert!(first.is_verified);
        assert_eq!(first.block_number.as_deref(), Some("1234"));
        assert_eq!(first.transaction_hash.as_deref(), Some("0xdef"));
        assert_eq!(first.orilux_blockchain_hash.as_deref(), Some("0xabc"));

        let second = apply_chain_event(&db, &update).unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(db.get_certificate("CERT-1").unwrap().unwrap(), first);

        let applied = db
            .audit_events()
            .unwrap()
            .into_iter()
            .filter(|e| e.event_type == AuditEventType::ChainEventApplied)
            .count();
        assert_eq!(applied, 1);
    }

    #[test]
    fn both_payload_shapes_write_the_same_fields() {
        let (db_a, _dir_a) = temp_db();
        let (db_b, _dir_b) = temp_db();
        register(&db_a, "CERT-1", None);
        register(&db_b, "CERT-1", None);

        let ledger: ChainEventPayload = serde_json::from_value(json!({
            "eventType": "block_confirmed",
            "assetId": "CERT-1",
            "ledgerData": {
                "hash": "0xabc",
                "status": "verified",
                "blockHeight": "1234",
                "txReference": "0xdef",
                "timestamp": 1700000000
            }
        }))
        .unwrap();

        let a = apply_chain_event(&db_a, &ChainEventUpdate::from(&crest_payload("CERT-1")))
            .unwrap()
            .unwrap();
        let b = apply_chain_event(&db_b, &ChainEventUpdate::from(&ledger))
            .unwrap()
            .unwrap();

        assert_eq!(a.is_verified, b.is_verified);
        assert_eq!(a.block_number, b.block_number);
        assert_eq!(a.transaction_hash, b.transaction_hash);
        assert_eq!(a.orilux_blockchain_hash, b.orilux_blockchain_hash);
    }

    #[test]
    fn unknown_certificate_is_not_an_error() {
        let (db, _dir) = temp_db();
        let update = ChainEventUpdate::from(&crest_payload("MISSING"));
        assert!(apply_chain_event(&db, &update).unwrap().is_none());
    }

    #[test]
    fn non_verified_status_clears_flag() {
        let (db, _dir) = temp_db();
        register(&db, "CERT-1", None);
        db.update_certificate("CERT-1", |r| r.is_verified = true).unwrap();

        let update = ChainEventUpdate {
            certificate_id: "CERT-1".to_string(),
            is_verified: Some(false),
            ..Default::default()
        };
        let row = apply_chain_event(&db, &update).unwrap().unwrap();
        assert!(!row.is_verified);
    }

    #[test]
    fn oriluxchain_verification_records_projection_and_notifies() {
        let (db, _dir) = temp_db();
        register(&db, "CERT-1", Some("user-1"));

        let blockchain = BlockchainEvent {
            hash: Some("0xabc".to_string()),
            status: Some("confirmed".to_string()),
            block_number: Some(NumberOrText::Number(77)),
            tx_hash: Some("0xdef".to_string()),
            timestamp: Some(1700000000),
        };
        let row =
            apply_oriluxchain_verification(&db, "CERT-1", "certificate_verified", Some(&blockchain))
                .unwrap();

        let orilux = row.oriluxchain.unwrap();
        assert_eq!(orilux.status.as_deref(), Some("verified"));
        assert_eq!(orilux.block_number, Some(77));
        assert_eq!(orilux.tx_hash.as_deref(), Some("0xdef"));
        assert_eq!(orilux.timestamp, Some(1700000000));

        let notes = db.notifications_for("user-1").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, "certificate_verified");
        assert_eq!(notes[0].action_url.as_deref(), Some("/certificate/CERT-1"));

        // Redelivery neither rewrites nor notifies again.
        apply_oriluxchain_verification(&db, "CERT-1", "block_mined", Some(&blockchain)).unwrap();
        assert_eq!(db.notifications_for("user-1").unwrap().len(), 1);
    }

    #[test]
    fn oriluxchain_verification_of_unknown_certificate_fails() {
        let (db, _dir) = temp_db();
        let err = apply_oriluxchain_verification(&db, "MISSING", "certificate_verified", None)
            .unwrap_err();
        assert!(matches!(err, CertificateDbError::NotFound(_)));
    }
}
