// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Certificate token minting on the destination chain.

use std::str::FromStr;

use alloy::{
    primitives::Address,
    providers::{Provider, ProviderBuilder},
};
use async_trait::async_trait;

use super::error::ChainError;
use super::registry::{decode_minted_token_id, IVeralixRegistry};
use super::types::ALLOWED_FUNCTION;
use super::wallet::{SecureWallet, WalletError};
use crate::config::SignerConfig;

/// Parameters of a single `createCertificate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintCall {
    pub certificate_id: String,
    pub metadata_uri: String,
    /// Token recipient; the system wallet when absent
    pub recipient: Option<Address>,
}

/// Confirmed mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedCertificate {
    pub tx_hash: String,
    pub token_id: String,
    pub block_number: u64,
    pub contract_address: String,
}

/// Mint failures, split by whether anything reached the network.
#[derive(Debug, thiserror::Error)]
pub enum MintFailure {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl MintFailure {
    /// Hash of a broadcast transaction whose outcome is unknown or failed.
    pub fn broadcast_tx(&self) -> Option<&str> {
        match self {
            MintFailure::Chain(e) => e.broadcast_tx(),
            MintFailure::Wallet(_) => None,
        }
    }
}

/// Write access to the certificate registry.
#[async_trait]
pub trait CertificateMinter: Send + Sync {
    /// Submit `createCertificate` and wait for one confirmation.
    async fn mint(&self, call: &MintCall) -> Result<MintedCertificate, MintFailure>;
}

/// Minter backed by the system wallet.
///
/// The wallet and signing provider are rebuilt from configuration on every
/// call.
pub struct RegistryMinter {
    config: SignerConfig,
}

impl RegistryMinter {
    pub fn new(config: SignerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CertificateMinter for RegistryMinter {
    async fn mint(&self, call: &MintCall) -> Result<MintedCertificate, MintFailure> {
        let wallet = SecureWallet::load(&self.config)?;

        let registry = Address::from_str(&self.config.registry_address)
            .map_err(|e| ChainError::InvalidAddress(e.to_string()))?;
        let url: url::Url = self
            .config
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new()
            .wallet(wallet.ethereum_wallet())
            .connect_http(url)
            .erased();

        let create = IVeralixRegistry::createCertificateCall {
            to: call.recipient.unwrap_or_else(|| wallet.address()),
            certificateId: call.certificate_id.clone(),
            metadataURI: call.metadata_uri.clone(),
        };

        let pending = wallet
            .sign_transaction(&provider, registry, ALLOWED_FUNCTION, &create)
            .await?;
        let tx_hash = pending.tx_hash().to_string();

        tracing::info!(
            certificate_id = %call.certificate_id,
            tx_hash = %tx_hash,
            "Waiting for mint confirmation"
        );

        let receipt = pending
            .with_timeout(self.config.confirmation_timeout)
            .get_receipt()
            .await
            .map_err(|e| ChainError::Confirmation {
                tx_hash: tx_hash.clone(),
                reason: e.to_string(),
            })?;

        if !receipt.status() {
            return Err(ChainError::Reverted { tx_hash }.into());
        }

        let token_id = decode_minted_token_id(receipt.inner.logs(), registry)
            .ok_or_else(|| ChainError::TokenIdNotFound {
                tx_hash: tx_hash.clone(),
            })?;

        Ok(MintedCertificate {
            tx_hash: receipt.transaction_hash.to_string(),
            token_id: token_id.to_string(),
            block_number: receipt.block_number.unwrap_or_default(),
            contract_address: registry.to_checksum(None),
        })
    }
}
