// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! # API Data Models
//!
//! Request and response bodies of the function endpoints. Wire names follow
//! the marketplace client (camelCase for mint and ownership calls, snake_case
//! for the Crestchain and Oriluxchain webhooks).
//!
//! ## Model Categories
//!
//! - **Dual mint**: single and batch mint requests and their results
//! - **Ownership**: reconciliation requests
//! - **Webhooks**: chain-event payloads and their normalized update

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::OwnershipStatus;
use crate::storage::CertificateRecord;

// =============================================================================
// Loose scalar
// =============================================================================

/// Identifier or height sent either as a JSON number or a string.
///
/// JSON numbers are read as `u64`. A uint256 token id above `u64::MAX` has
/// no exact JSON number form here and must be sent as a decimal or `0x`
/// string; a larger bare number is rejected as a malformed body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(u64),
    Text(String),
}

impl NumberOrText {
    /// Textual value, or `None` when blank.
    pub fn as_text(&self) -> Option<String> {
        match self {
            NumberOrText::Number(n) => Some(n.to_string()),
            NumberOrText::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }

    /// Textual value, with zero and blank both treated as absent.
    pub fn non_zero_text(&self) -> Option<String> {
        match self {
            NumberOrText::Number(0) => None,
            NumberOrText::Text(s) if s.trim() == "0" => None,
            other => other.as_text(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Dual mint
// =============================================================================

/// Request body for `dual-mint`.
///
/// With `batchMode: true`, `certificateIds` is minted one by one and
/// `certificateId` is ignored.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DualMintRequest {
    #[serde(default)]
    pub certificate_id: Option<String>,
    #[serde(default)]
    pub jewelry_item_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Token recipient; defaults to the system wallet
    #[serde(default)]
    pub owner_address: Option<String>,
    #[serde(default)]
    pub batch_mode: bool,
    #[serde(default)]
    pub certificate_ids: Vec<String>,
}

/// Source-ledger half of a dual-mint result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OriluxchainMintSummary {
    pub verified: bool,
    pub verification_url: Option<String>,
}

/// Destination-chain half of a dual-mint result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrestchainMintSummary {
    pub tx_hash: String,
    pub token_id: String,
    pub contract_address: String,
    pub block_number: u64,
    pub verification_url: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DualMintResponse {
    pub success: bool,
    pub message: String,
    pub oriluxchain: OriluxchainMintSummary,
    pub crestchain: CrestchainMintSummary,
}

/// Per-certificate result of a batch mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchMintItem {
    pub certificate_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchMintSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<BatchMintItem>,
}

impl BatchMintSummary {
    pub fn from_results(results: Vec<BatchMintItem>) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            successful,
            failed: results.len() - successful,
            results,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchMintResponse {
    pub success: bool,
    pub data: BatchMintSummary,
}

// =============================================================================
// Ownership reconciliation
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipRequest {
    /// Token id as a number up to `u64::MAX`, or a decimal or `0x` string
    #[serde(default)]
    pub token_id: Option<NumberOrText>,
    /// Address whose balance is checked; defaults to the recorded owner
    #[serde(default)]
    pub owner_address: Option<String>,
    /// Write the result back to matching certificate rows
    #[serde(default)]
    pub update: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OwnershipResponse {
    pub success: bool,
    pub data: OwnershipStatus,
}

// =============================================================================
// Webhooks
// =============================================================================

/// `blockchain` block of Crestchain and Oriluxchain webhooks.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BlockchainEvent {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub block_number: Option<NumberOrText>,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Payload of `crestchain-webhook`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CrestchainWebhookPayload {
    #[serde(default)]
    pub event: Option<String>,
    pub certificate_id: String,
    #[serde(default)]
    pub blockchain: Option<BlockchainEvent>,
}

/// `ledgerData` block of `chain-events-handler` payloads.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerData {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub block_height: Option<NumberOrText>,
    #[serde(default)]
    pub tx_reference: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Payload of `chain-events-handler`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChainEventPayload {
    #[serde(default)]
    pub event_type: Option<String>,
    pub asset_id: String,
    #[serde(default)]
    pub ledger_data: Option<LedgerData>,
}

/// Field update shared by both chain-event webhooks.
///
/// Each field is set only when the payload carries a meaningful value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainEventUpdate {
    pub certificate_id: String,
    pub is_verified: Option<bool>,
    pub block_number: Option<String>,
    pub transaction_hash: Option<String>,
    pub orilux_blockchain_hash: Option<String>,
}

impl ChainEventUpdate {
    fn normalize(
        certificate_id: &str,
        status: &Option<String>,
        block: &Option<NumberOrText>,
        tx_hash: &Option<String>,
        hash: &Option<String>,
    ) -> Self {
        Self {
            certificate_id: certificate_id.to_string(),
            is_verified: non_empty(status).map(|s| s == "verified"),
            block_number: block.as_ref().and_then(NumberOrText::non_zero_text),
            transaction_hash: non_empty(tx_hash),
            orilux_blockchain_hash: non_empty(hash),
        }
    }

    /// True when the payload carried nothing to write.
    pub fn is_empty(&self) -> bool {
        self.is_verified.is_none()
            && self.block_number.is_none()
            && self.transaction_hash.is_none()
            && self.orilux_blockchain_hash.is_none()
    }

    /// Apply the present fields to a stored row.
    pub fn apply(&self, record: &mut CertificateRecord) {
        if let Some(verified) = self.is_verified {
            record.is_verified = verified;
        }
        if let Some(block) = &self.block_number {
            record.block_number = Some(block.clone());
        }
        if let Some(tx) = &self.transaction_hash {
            record.transaction_hash = Some(tx.clone());
        }
        if let Some(hash) = &self.orilux_blockchain_hash {
            record.orilux_blockchain_hash = Some(hash.clone());
        }
    }
}

impl From<&CrestchainWebhookPayload> for ChainEventUpdate {
    fn from(payload: &CrestchainWebhookPayload) -> Self {
        let data = payload.blockchain.clone().unwrap_or_default();
        Self::normalize(
            &payload.certificate_id,
            &data.status,
            &data.block_number,
            &data.tx_hash,
            &data.hash,
        )
    }
}

impl From<&ChainEventPayload> for ChainEventUpdate {
    fn from(payload: &ChainEventPayload) -> Self {
        let data = payload.ledger_data.clone().unwrap_or_default();
        Self::normalize(
            &payload.asset_id,
            &data.status,
            &data.block_height,
            &data.tx_reference,
            &data.hash,
        )
    }
}

/// Payload of `oriluxchain-webhook`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OriluxchainWebhookPayload {
    pub event: String,
    #[serde(default)]
    pub certificate_id: Option<String>,
    #[serde(default)]
    pub blockchain: Option<BlockchainEvent>,
}

/// Oriluxchain events that move a certificate to `verified`.
pub const ORILUXCHAIN_RELEVANT_EVENTS: [&str; 2] = ["certificate_verified", "block_mined"];

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookAck {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OriluxchainWebhookResponse {
    pub success: bool,
    pub message: String,
    pub certificate_id: String,
}

/// Reply for webhook events the service does not act on.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IgnoredEvent {
    pub message: String,
}

// =============================================================================
// Certificates
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CertificateResponse {
    pub success: bool,
    pub data: CertificateRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NewCertificate;

    #[test]
    fn number_or_text_accepts_both() {
        let n: NumberOrText = serde_json::from_str("42").unwrap();
        let s: NumberOrText = serde_json::from_str(r#""42""#).unwrap();
        assert_eq!(n.as_text(), s.as_text());
        assert_eq!(NumberOrText::Text("  ".into()).as_text(), None);
        assert_eq!(NumberOrText::Number(0).non_zero_text(), None);
        assert_eq!(NumberOrText::Number(0).as_text().as_deref(), Some("0"));
    }

    #[test]
    fn crestchain_payload_normalizes() {
        let payload: CrestchainWebhookPayload = serde_json::from_str(
            r#"{"event":"block_mined","certificate_id":"CERT-1",
                "blockchain":{"hash":"0xh","status":"verified","block_number":12345,"tx_hash":"0xt","timestamp":1700000000}}"#,
        )
        .unwrap();
        let update = ChainEventUpdate::from(&payload);
        assert_eq!(
            update,
            ChainEventUpdate {
                certificate_id: "CERT-1".to_string(),
                is_verified: Some(true),
                block_number: Some("12345".to_string()),
                transaction_hash: Some("0xt".to_string()),
                orilux_blockchain_hash: Some("0xh".to_string()),
            }
        );
    }

    #[test]
    fn chain_event_payload_normalizes_like_crestchain() {
        let payload: ChainEventPayload = serde_json::from_str(
            r#"{"eventType":"ledger_update","assetId":"CERT-1",
                "ledgerData":{"hash":"0xh","status":"verified","blockHeight":12345,"txReference":"0xt"}}"#,
        )
        .unwrap();
        let crest: CrestchainWebhookPayload = serde_json::from_str(
            r#"{"event":"x","certificate_id":"CERT-1",
                "blockchain":{"hash":"0xh","status":"verified","block_number":12345,"tx_hash":"0xt"}}"#,
        )
        .unwrap();
        assert_eq!(ChainEventUpdate::from(&payload), ChainEventUpdate::from(&crest));
    }

    #[test]
    fn falsy_fields_are_absent() {
        let payload: ChainEventPayload = serde_json::from_str(
            r#"{"eventType":"x","assetId":"CERT-1","ledgerData":{"hash":"","status":"","blockHeight":0}}"#,
        )
        .unwrap();
        let update = ChainEventUpdate::from(&payload);
        assert!(update.is_empty());

        let bare: ChainEventPayload =
            serde_json::from_str(r#"{"eventType":"x","assetId":"CERT-1"}"#).unwrap();
        assert!(ChainEventUpdate::from(&bare).is_empty());
    }

    #[test]
    fn non_verified_status_clears_flag() {
        let payload: CrestchainWebhookPayload = serde_json::from_str(
            r#"{"event":"x","certificate_id":"CERT-1","blockchain":{"status":"pending"}}"#,
        )
        .unwrap();
        let update = ChainEventUpdate::from(&payload);
        assert_eq!(update.is_verified, Some(false));

        let mut record = CertificateRecord::new(NewCertificate {
            certificate_id: "CERT-1".into(),
            ..Default::default()
        });
        record.is_verified = true;
        record.block_number = Some("1".into());
        update.apply(&mut record);
        assert!(!record.is_verified);
        assert_eq!(record.block_number.as_deref(), Some("1"));
    }

    #[test]
    fn dual_mint_request_reads_camel_case() {
        let req: DualMintRequest = serde_json::from_str(
            r#"{"certificateId":"CERT-1","jewelryItemId":"J-1","userId":"U-1","ownerAddress":"0xabc"}"#,
        )
        .unwrap();
        assert_eq!(req.certificate_id.as_deref(), Some("CERT-1"));
        assert_eq!(req.owner_address.as_deref(), Some("0xabc"));
        assert!(!req.batch_mode);

        let batch: DualMintRequest =
            serde_json::from_str(r#"{"batchMode":true,"certificateIds":["A","B"]}"#).unwrap();
        assert!(batch.batch_mode);
        assert_eq!(batch.certificate_ids, vec!["A", "B"]);
    }

    #[test]
    fn batch_summary_counts() {
        let ok = BatchMintItem {
            certificate_id: "A".into(),
            success: true,
            tx_hash: Some("0x1".into()),
            token_id: Some("1".into()),
            error: None,
        };
        let failed = BatchMintItem {
            certificate_id: "B".into(),
            success: false,
            tx_hash: None,
            token_id: None,
            error: Some("Certificate not found in Oriluxchain".into()),
        };
        let summary = BatchMintSummary::from_results(vec![ok, failed]);
        assert_eq!((summary.total, summary.successful, summary.failed), (2, 1, 1));

        let json = serde_json::to_value(&summary.results[1]).unwrap();
        assert!(json.get("txHash").is_none());
        assert_eq!(json["certificateId"], "B");
    }
}
