// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! On-chain ownership lookup with optional write-back to the certificate row.

use alloy::primitives::{Address, U256};
use serde_json::json;

use crate::blockchain::{CertificateLedger, ChainError, NetworkConfig, OwnershipStatus};
use crate::storage::{AuditEvent, AuditEventType, CertificateDatabase, CertificateRecord};

/// Fields written back to a certificate after an ownership check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipWrite {
    pub is_verified: bool,
    pub block_number: String,
    pub verification_url: Option<String>,
}

impl OwnershipWrite {
    pub fn new(status: &OwnershipStatus, block_number: u64, network: &NetworkConfig) -> Self {
        Self {
            is_verified: status.is_owner_holding,
            block_number: block_number.to_string(),
            verification_url: status
                .is_owner_holding
                .then(|| network.address_url(&status.contract_address)),
        }
    }

    fn apply(&self, record: &mut CertificateRecord) {
        record.is_verified = self.is_verified;
        record.block_number = Some(self.block_number.clone());
        record.blockchain_verification_url = self.verification_url.clone();
    }
}

/// Read ownership of `token_id`; with `update`, record the result.
///
/// Database failures during the write-back are logged and do not fail the
/// lookup.
pub async fn validate_ownership(
    ledger: &dyn CertificateLedger,
    db: &CertificateDatabase,
    network: &NetworkConfig,
    token_id: U256,
    owner: Option<Address>,
    update: bool,
) -> Result<OwnershipStatus, ChainError> {
    let status = ledger.read_ownership(token_id, owner).await?;
    tracing::info!(
        token_id = %status.token_id,
        owner = %status.checked_owner,
        holding = status.is_owner_holding,
        "Ownership checked"
    );

    if !update {
        return Ok(status);
    }

    let block_number = ledger.block_number().await?;
    let write = OwnershipWrite::new(&status, block_number, network);

    match db.update_by_token(&status.contract_address, &status.token_id, |record| {
        write.apply(record)
    }) {
        Ok(updated) => {
            if updated.is_empty() {
                tracing::warn!(
                    token_id = %status.token_id,
                    contract = %status.contract_address,
                    "No certificate matched token for ownership update"
                );
            }
            for record in &updated {
                let event = AuditEvent::new(AuditEventType::OwnershipReconciled)
                    .with_resource("nft_certificate", record.certificate_id.clone())
                    .with_details(json!({
                        "token_id": status.token_id,
                        "owner": status.checked_owner,
                        "is_verified": write.is_verified,
                        "block_number": write.block_number,
                    }));
                if let Err(e) = db.append_audit(&event) {
                    tracing::warn!(error = %e, "Failed to append audit event");
                }
            }
        }
        Err(e) => {
            tracing::error!(
                token_id = %status.token_id,
                error = %e,
                "Failed to record ownership verification"
            );
        }
    }

    Ok(status)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::blockchain::{ChainStatus, CRESTCHAIN};
    use crate::storage::NewCertificate;
    use async_trait::async_trait;
    use std::str::FromStr;

    pub(crate) const REGISTRY: &str = "0xf23507FD4EE6188B6e0D1b94Fb48f59F3E77e3bB";
    pub(crate) const HOLDER: &str = "0x1111111111111111111111111111111111111111";

    /// Ledger returning a fixed balance for every token.
    pub(crate) struct FakeLedger {
        pub balance: U256,
        pub block: u64,
    }

    #[async_trait]
    impl CertificateLedger for FakeLedger {
        async fn read_ownership(
            &self,
            token_id: U256,
            owner: Option<Address>,
        ) -> Result<OwnershipStatus, ChainError> {
            let registry = Address::from_str(REGISTRY).unwrap();
            let recorded = Address::from_str(HOLDER).unwrap();
            Ok(OwnershipStatus::from_reads(
                token_id,
                registry,
                recorded,
                owner.unwrap_or(recorded),
                self.balance,
                String::new(),
                format!("ipfs://metadata/{token_id}"),
            ))
        }

        async fn block_number(&self) -> Result<u64, ChainError> {
            Ok(self.block)
        }

        async fn chain_status(&self, _signer: Option<Address>) -> Result<ChainStatus, ChainError> {
            Ok(ChainStatus {
                network: CRESTCHAIN.name.to_string(),
                rpc_url: CRESTCHAIN.default_rpc_url.to_string(),
                chain_id: CRESTCHAIN.chain_id,
                block_number: self.block,
                contract_address: REGISTRY.to_string(),
                total_supply: Some("3".to_string()),
                contract_explorer_url: CRESTCHAIN.address_url(REGISTRY),
                signer: None,
            })
        }
    }

    fn temp_db() -> (CertificateDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = CertificateDatabase::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn register(db: &CertificateDatabase, id: &str, token: &str) {
        db.insert_certificate(NewCertificate {
            certificate_id: id.to_string(),
            token_id: Some(token.to_string()),
            // Index lookups are case-insensitive on the contract.
            contract_address: Some(REGISTRY.to_lowercase()),
            ..Default::default()
        })
        .unwrap();
    }

    #[tokio::test]
    async fn lookup_without_update_leaves_row_unchanged() {
        let (db, _dir) = temp_db();
        register(&db, "CERT-1", "7");
        let before = db.get_certificate("CERT-1").unwrap().unwrap();

        let ledger = FakeLedger {
            balance: U256::from(1),
            block: 900,
        };
        let status = validate_ownership(&ledger, &db, &CRESTCHAIN, U256::from(7), None, false)
            .await
            .unwrap();

        assert!(status.is_owner_holding);
        assert_eq!(db.get_certificate("CERT-1").unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn update_with_holding_owner_records_verification() {
        let (db, _dir) = temp_db();
        register(&db, "CERT-1", "7");

        let ledger = FakeLedger {
            balance: U256::from(1),
            block: 900,
        };
        validate_ownership(&ledger, &db, &CRESTCHAIN, U256::from(7), None, true)
            .await
            .unwrap();

        let row = db.get_certificate("CERT-1").unwrap().unwrap();
        assert!(row.is_verified);
        assert_eq!(row.block_number.as_deref(), Some("900"));
        assert_eq!(
            row.blockchain_verification_url.map(|u| u.to_lowercase()),
            Some(format!(
                "https://scan.crestchain.pro/address/{}",
                REGISTRY.to_lowercase()
            ))
        );
    }

    #[tokio::test]
    async fn update_with_zero_balance_clears_verification() {
        let (db, _dir) = temp_db();
        register(&db, "CERT-1", "7");
        db.update_certificate("CERT-1", |r| {
            r.is_verified = true;
            r.blockchain_verification_url = Some("https://old".to_string());
        })
        .unwrap();

        let ledger = FakeLedger {
            balance: U256::ZERO,
            block: 901,
        };
        let status = validate_ownership(&ledger, &db, &CRESTCHAIN, U256::from(7), None, true)
            .await
            .unwrap();
        assert!(!status.is_owner_holding);

        let row = db.get_certificate("CERT-1").unwrap().unwrap();
        assert!(!row.is_verified);
        assert_eq!(row.blockchain_verification_url, None);
        assert_eq!(row.block_number.as_deref(), Some("901"));
    }

    #[tokio::test]
    async fn unmatched_token_still_returns_status() {
        let (db, _dir) = temp_db();
        register(&db, "CERT-1", "7");

        let ledger = FakeLedger {
            balance: U256::from(2),
            block: 5,
        };
        let status = validate_ownership(&ledger, &db, &CRESTCHAIN, U256::from(8), None, true)
            .await
            .unwrap();
        assert_eq!(status.token_id, "8");
        assert!(!db.get_certificate("CERT-1").unwrap().unwrap().is_verified);
    }

    #[tokio::test]
    async fn equivalent_token_forms_are_updated() {
        let (db, _dir) = temp_db();
        register(&db, "HEX", "0x07");
        register(&db, "PAD", "007");

        let ledger = FakeLedger {
            balance: U256::from(1),
            block: 902,
        };
        validate_ownership(&ledger, &db, &CRESTCHAIN, U256::from(7), None, true)
            .await
            .unwrap();

        for id in ["HEX", "PAD"] {
            let row = db.get_certificate(id).unwrap().unwrap();
            assert!(row.is_verified, "{id}");
            assert_eq!(row.block_number.as_deref(), Some("902"), "{id}");
        }
    }

    #[test]
    fn write_url_only_when_holding() {
        let registry = Address::from_str(REGISTRY).unwrap();
        let owner = Address::from_str(HOLDER).unwrap();
        let status = |balance| {
            OwnershipStatus::from_reads(
                U256::from(1),
                registry,
                owner,
                owner,
                balance,
                String::new(),
                String::new(),
            )
        };

        let held = OwnershipWrite::new(&status(U256::MAX), 10, &CRESTCHAIN);
        assert!(held.is_verified);
        assert!(held.verification_url.is_some());

        let empty = OwnershipWrite::new(&status(U256::ZERO), 10, &CRESTCHAIN);
        assert!(!empty.is_verified);
        assert_eq!(empty.verification_url, None);
        assert_eq!(empty.block_number, "10");
    }
}
