// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! # Dual Mint
//!
//! Verifies a certificate on Oriluxchain, then mints its token on the
//! destination chain and records the result.
//!
//! ## Idempotency
//!
//! Each `(certificate_id, network)` pair maps to one mint record keyed by
//! `sha256("{certificate_id}:{network_label}")`. The record is claimed before
//! submission:
//!
//! - confirmed: the stored outcome is replayed without touching the chain
//! - pending or broadcast-but-unconfirmed: the request fails with a conflict
//! - failed before broadcast: the claim is released so the caller can retry
//!
//! Submission runs on its own task once the claim is taken, so a caller that
//! disconnects mid-mint does not strand the record. A `Pending` claim that
//! still outlives the claim TTL (the process died) is taken over by the next
//! request.

use std::sync::Arc;

use alloy::primitives::Address;
use chrono::{Duration, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::blockchain::{CertificateMinter, MintCall, MintFailure, NetworkConfig};
use crate::config::DEFAULT_MINT_CLAIM_TTL_SECS;
use crate::models::{BatchMintItem, CrestchainMintSummary, DualMintResponse, OriluxchainMintSummary};
use crate::providers::{OriluxchainError, SourceLedger};
use crate::storage::{
    AuditEvent, AuditEventType, CertificateDatabase, CertificateDbError, CertificateRecord,
    CrestProjection, MintBegin, MintOutcome, Notification,
};

/// Errors of the dual-mint flow.
#[derive(Debug, thiserror::Error)]
pub enum MintError {
    #[error("Certificate not found in Oriluxchain")]
    SourceNotVerified,

    #[error(transparent)]
    Source(#[from] OriluxchainError),

    #[error("Mint for certificate {certificate_id} is already in progress")]
    InProgress {
        certificate_id: String,
        tx_hash: Option<String>,
    },

    #[error(transparent)]
    Mint(#[from] MintFailure),

    #[error(transparent)]
    Database(#[from] CertificateDbError),

    #[error("Mint task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Input for a single dual mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualMintInput {
    pub certificate_id: String,
    pub jewelry_item_id: Option<String>,
    pub user_id: Option<String>,
    pub owner_address: Option<Address>,
}

/// Completed dual mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualMintOutcome {
    pub outcome: MintOutcome,
    /// True when served from the idempotency record
    pub replayed: bool,
}

impl DualMintOutcome {
    pub fn into_response(self) -> DualMintResponse {
        let outcome = self.outcome;
        DualMintResponse {
            success: true,
            message: "Dual mint completed successfully".to_string(),
            oriluxchain: OriluxchainMintSummary {
                verified: true,
                verification_url: outcome.orilux_verification_url,
            },
            crestchain: CrestchainMintSummary {
                tx_hash: outcome.tx_hash,
                token_id: outcome.token_id,
                contract_address: outcome.contract_address,
                block_number: outcome.block_number,
                verification_url: outcome.verification_url,
            },
        }
    }
}

/// Idempotency key for one certificate on one network.
pub fn mint_idempotency_key(certificate_id: &str, network_label: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(certificate_id.as_bytes());
    hasher.update(b":");
    hasher.update(network_label.as_bytes());
    alloy::hex::encode(hasher.finalize())
}

/// Write the destination projection; a no-op when it is already recorded.
fn apply_mint(record: &mut CertificateRecord, projection: &CrestProjection) {
    if record.dual_verification && record.crestchain.as_ref() == Some(projection) {
        return;
    }
    record.crestchain = Some(projection.clone());
    record.dual_verification = true;
    record.verification_date = Some(Utc::now());
}

/// Orchestrates source verification, minting and persistence.
#[derive(Clone)]
pub struct DualMintService {
    db: Arc<CertificateDatabase>,
    source: Arc<dyn SourceLedger>,
    minter: Arc<dyn CertificateMinter>,
    network: NetworkConfig,
    metadata_uri_prefix: String,
    claim_ttl: Duration,
}

impl DualMintService {
    pub fn new(
        db: Arc<CertificateDatabase>,
        source: Arc<dyn SourceLedger>,
        minter: Arc<dyn CertificateMinter>,
        network: NetworkConfig,
        metadata_uri_prefix: impl Into<String>,
    ) -> Self {
        Self {
            db,
            source,
            minter,
            network,
            metadata_uri_prefix: metadata_uri_prefix.into(),
            claim_ttl: Duration::seconds(i64::from(DEFAULT_MINT_CLAIM_TTL_SECS)),
        }
    }

    pub fn with_claim_ttl(mut self, claim_ttl: Duration) -> Self {
        self.claim_ttl = claim_ttl;
        self
    }

    /// Verify on Oriluxchain and mint on the destination chain.
    pub async fn mint(&self, input: &DualMintInput) -> Result<DualMintOutcome, MintError> {
        let certificate_id = input.certificate_id.as_str();
        tracing::info!(certificate_id, network = self.network.label, "Starting dual mint");

        let verification = self.source.verify_certificate(certificate_id).await?;
        if !verification.verified {
            tracing::info!(certificate_id, "Certificate not verified on Oriluxchain");
            return Err(MintError::SourceNotVerified);
        }

        let key = mint_idempotency_key(certificate_id, self.network.label);
        match self
            .db
            .begin_mint(&key, certificate_id, self.network.label, self.claim_ttl)?
        {
            MintBegin::Started => {}
            MintBegin::Completed(record) => {
                if let Some(outcome) = record.outcome {
                    tracing::info!(certificate_id, tx_hash = %outcome.tx_hash, "Replaying confirmed mint");
                    self.record_projection(certificate_id, &outcome)?;
                    return Ok(DualMintOutcome {
                        outcome,
                        replayed: true,
                    });
                }
                return Err(MintError::InProgress {
                    certificate_id: certificate_id.to_string(),
                    tx_hash: record.tx_hash,
                });
            }
            MintBegin::InFlight(record) => {
                tracing::warn!(
                    certificate_id,
                    state = ?record.state,
                    tx_hash = ?record.tx_hash,
                    "Mint already claimed"
                );
                return Err(MintError::InProgress {
                    certificate_id: certificate_id.to_string(),
                    tx_hash: record.tx_hash,
                });
            }
        }

        let service = self.clone();
        let input = input.clone();
        tokio::spawn(async move {
            service
                .submit(&key, &input, verification.verification_url)
                .await
        })
        .await?
    }

    /// Mint under a held claim and settle the claim whatever the result.
    async fn submit(
        &self,
        key: &str,
        input: &DualMintInput,
        orilux_verification_url: Option<String>,
    ) -> Result<DualMintOutcome, MintError> {
        let certificate_id = input.certificate_id.as_str();
        let call = MintCall {
            certificate_id: certificate_id.to_string(),
            metadata_uri: format!("{}{}", self.metadata_uri_prefix, certificate_id),
            recipient: input.owner_address,
        };

        let minted = match self.minter.mint(&call).await {
            Ok(minted) => minted,
            Err(failure) => {
                self.release_claim(key, input, &failure);
                return Err(failure.into());
            }
        };

        let outcome = MintOutcome {
            orilux_verification_url,
            verification_url: self.network.tx_url(&minted.tx_hash),
            tx_hash: minted.tx_hash,
            token_id: minted.token_id,
            contract_address: minted.contract_address,
            block_number: minted.block_number,
        };

        // Record the broadcast durably before touching the certificate row.
        self.db.complete_mint(key, outcome.clone()).inspect_err(|e| {
            tracing::error!(
                certificate_id,
                tx_hash = %outcome.tx_hash,
                error = %e,
                "Mint confirmed but idempotency record not updated"
            );
        })?;

        self.record_projection(certificate_id, &outcome)?;
        self.notify(input, &outcome);
        self.audit(
            AuditEvent::new(AuditEventType::MintConfirmed)
                .with_resource("blockchain_transaction", outcome.tx_hash.clone())
                .with_details(json!({
                    "certificate_id": certificate_id,
                    "token_id": outcome.token_id,
                    "contract_address": outcome.contract_address,
                    "block_number": outcome.block_number,
                    "network": self.network.label,
                })),
            input.user_id.as_deref(),
        );

        tracing::info!(
            certificate_id,
            tx_hash = %outcome.tx_hash,
            token_id = %outcome.token_id,
            "Dual mint completed"
        );

        Ok(DualMintOutcome {
            outcome,
            replayed: false,
        })
    }

    /// Mint each certificate in turn; one failure does not stop the batch.
    pub async fn mint_batch(
        &self,
        certificate_ids: &[String],
        user_id: Option<&str>,
        owner_address: Option<Address>,
    ) -> Vec<BatchMintItem> {
        let mut results = Vec::with_capacity(certificate_ids.len());
        for certificate_id in certificate_ids {
            let input = DualMintInput {
                certificate_id: certificate_id.clone(),
                jewelry_item_id: None,
                user_id: user_id.map(str::to_string),
                owner_address,
            };
            let item = match self.mint(&input).await {
                Ok(done) => BatchMintItem {
                    certificate_id: certificate_id.clone(),
                    success: true,
                    tx_hash: Some(done.outcome.tx_hash),
                    token_id: Some(done.outcome.token_id),
                    error: None,
                },
                Err(e) => BatchMintItem {
                    certificate_id: certificate_id.clone(),
                    success: false,
                    tx_hash: None,
                    token_id: None,
                    error: Some(e.to_string()),
                },
            };
            results.push(item);
        }
        results
    }

    fn record_projection(&self, certificate_id: &str, outcome: &MintOutcome) -> Result<(), MintError> {
        let projection = CrestProjection {
            tx_hash: outcome.tx_hash.clone(),
            token_id: outcome.token_id.clone(),
            contract_address: outcome.contract_address.clone(),
            block_number: outcome.block_number,
            network: self.network.label.to_string(),
            verification_url: outcome.verification_url.clone(),
        };

        let updated = self
            .db
            .update_certificate(certificate_id, |record| apply_mint(record, &projection))?;
        if updated.is_none() {
            tracing::warn!(certificate_id, "No certificate row to update after mint");
        }
        Ok(())
    }

    /// Keep the claim when a transaction may be on chain, release it otherwise.
    fn release_claim(&self, key: &str, input: &DualMintInput, failure: &MintFailure) {
        let certificate_id = input.certificate_id.as_str();
        let result = match failure.broadcast_tx() {
            Some(tx_hash) => {
                tracing::error!(certificate_id, tx_hash, error = %failure, "Mint broadcast but not confirmed");
                self.db
                    .mark_mint_unconfirmed(key, tx_hash, &failure.to_string())
                    .map(|_| ())
            }
            None => {
                tracing::warn!(certificate_id, error = %failure, "Mint failed before broadcast");
                self.db.abandon_mint(key)
            }
        };
        if let Err(e) = result {
            tracing::error!(certificate_id, error = %e, "Failed to update mint record");
        }

        let mut event = AuditEvent::new(AuditEventType::MintFailed)
            .with_resource("nft_certificate", certificate_id)
            .with_details(json!({
                "network": self.network.label,
                "tx_hash": failure.broadcast_tx(),
            }))
            .failed(failure.to_string());
        if let Some(user) = &input.user_id {
            event = event.with_user(user.clone());
        }
        self.audit(event, None);
    }

    fn notify(&self, input: &DualMintInput, outcome: &MintOutcome) {
        let Some(user_id) = input.user_id.as_deref() else {
            return;
        };
        let notification = Notification::new(
            user_id,
            "dual_mint_completed",
            format!("Certificate registered on {}", self.network.name),
            format!(
                "Certificate {} is now registered on Oriluxchain and {}",
                input.certificate_id, self.network.name
            ),
        )
        .with_action_url(format!("/certificate/{}", input.certificate_id))
        .with_data(json!({
            "certificate_id": input.certificate_id,
            "jewelry_item_id": input.jewelry_item_id,
            "tx_hash": outcome.tx_hash,
            "token_id": outcome.token_id,
        }));

        if let Err(e) = self.db.insert_notification(&notification) {
            tracing::warn!(user_id, error = %e, "Failed to insert mint notification");
        }
    }

    fn audit(&self, event: AuditEvent, user_id: Option<&str>) {
        let event = match user_id {
            Some(user) => event.with_user(user),
            None => event,
        };
        if let Err(e) = self.db.append_audit(&event) {
            tracing::warn!(error = %e, "Failed to append audit event");
        }
    }
}
