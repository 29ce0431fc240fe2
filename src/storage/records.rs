// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Persisted record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Source-ledger (Oriluxchain) projection of a certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OriluxProjection {
    pub status: Option<String>,
    pub block_number: Option<u64>,
    pub tx_hash: Option<String>,
    /// Ledger timestamp as reported by the webhook
    pub timestamp: Option<i64>,
}

/// Destination-chain projection written after a confirmed mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CrestProjection {
    pub tx_hash: String,
    pub token_id: String,
    pub contract_address: String,
    pub block_number: u64,
    /// Network label (`CRESTCHAIN` or `BSC_MAINNET`)
    pub network: String,
    pub verification_url: String,
}

/// Stored certificate row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CertificateRecord {
    pub id: String,
    pub certificate_id: String,
    pub jewelry_item_id: Option<String>,
    pub user_id: Option<String>,
    pub token_id: Option<String>,
    pub contract_address: Option<String>,
    pub blockchain_network: Option<String>,
    pub metadata_uri: Option<String>,
    pub transaction_hash: Option<String>,
    pub block_number: Option<String>,
    pub is_verified: bool,
    pub blockchain_verification_url: Option<String>,
    pub orilux_blockchain_hash: Option<String>,
    pub oriluxchain: Option<OriluxProjection>,
    pub crestchain: Option<CrestProjection>,
    pub dual_verification: bool,
    pub verification_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when registering a certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct NewCertificate {
    pub certificate_id: String,
    #[serde(default)]
    pub jewelry_item_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub token_id: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub blockchain_network: Option<String>,
    #[serde(default)]
    pub metadata_uri: Option<String>,
}

impl CertificateRecord {
    pub fn new(input: NewCertificate) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            certificate_id: input.certificate_id,
            jewelry_item_id: input.jewelry_item_id,
            user_id: input.user_id,
            token_id: input.token_id,
            contract_address: input.contract_address,
            blockchain_network: input.blockchain_network,
            metadata_uri: input.metadata_uri,
            transaction_hash: None,
            block_number: None,
            is_verified: false,
            blockchain_verification_url: None,
            orilux_blockchain_hash: None,
            oriluxchain: None,
            crestchain: None,
            dual_verification: false,
            verification_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `(contract, token_id)` pairs this row answers to.
    pub fn token_refs(&self) -> Vec<(&str, &str)> {
        let mut refs = Vec::with_capacity(2);
        if let (Some(contract), Some(token)) = (&self.contract_address, &self.token_id) {
            refs.push((contract.as_str(), token.as_str()));
        }
        if let Some(crest) = &self.crestchain {
            refs.push((crest.contract_address.as_str(), crest.token_id.as_str()));
        }
        refs
    }
}

/// Lifecycle of a mint idempotency record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MintState {
    /// Persisted before submission; a request is working on it
    Pending,
    /// Receipt observed and certificate updated
    Confirmed,
    /// Broadcast, but confirmation failed; needs manual review
    Unconfirmed,
}

/// Stored outcome of a confirmed mint, replayed on retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MintOutcome {
    pub orilux_verification_url: Option<String>,
    pub tx_hash: String,
    pub token_id: String,
    pub contract_address: String,
    pub block_number: u64,
    pub verification_url: String,
}

/// Idempotency record keyed by `sha256(certificate_id ":" network)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MintRecord {
    pub key: String,
    pub certificate_id: String,
    pub network: String,
    pub state: MintState,
    pub tx_hash: Option<String>,
    pub outcome: Option<MintOutcome>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MintRecord {
    pub fn pending(key: &str, certificate_id: &str, network: &str) -> Self {
        let now = Utc::now();
        Self {
            key: key.to_string(),
            certificate_id: certificate_id.to_string(),
            network: network.to_string(),
            state: MintState::Pending,
            tx_hash: None,
            outcome: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// In-app notification for a marketplace user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub action_url: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: impl Into<String>,
        kind: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            kind: kind.into(),
            title: title.into(),
            message: message.into(),
            action_url: None,
            data: None,
            read: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
