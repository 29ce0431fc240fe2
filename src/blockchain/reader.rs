// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Read-only registry client.

use std::str::FromStr;

use alloy::{
    primitives::{Address, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
};
use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use super::error::ChainError;
use super::registry::IVeralixRegistry;
use super::types::{NetworkConfig, OwnershipStatus};

/// Signer account state reported by diagnostics.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignerStatus {
    pub address: String,
    /// Native balance in wei
    pub balance_wei: String,
    /// Native balance formatted with 18 decimals
    pub balance: String,
    pub nonce: u64,
    pub explorer_url: String,
}

/// RPC and registry diagnostics.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChainStatus {
    pub network: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub block_number: u64,
    pub contract_address: String,
    /// `None` when the registry does not answer `totalSupply()`
    pub total_supply: Option<String>,
    pub contract_explorer_url: String,
    pub signer: Option<SignerStatus>,
}

/// Read access to the certificate registry.
#[async_trait]
pub trait CertificateLedger: Send + Sync {
    /// Ownership snapshot for `token_id`.
    ///
    /// Checks `owner` when given, otherwise the registry's recorded owner.
    async fn read_ownership(
        &self,
        token_id: U256,
        owner: Option<Address>,
    ) -> Result<OwnershipStatus, ChainError>;

    /// Current block height.
    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Connectivity diagnostics, including the signer account when known.
    async fn chain_status(&self, signer: Option<Address>) -> Result<ChainStatus, ChainError>;
}

/// Registry reader over JSON-RPC.
pub struct RegistryReader {
    network: NetworkConfig,
    rpc_url: String,
    registry: Address,
    provider: DynProvider,
}

impl RegistryReader {
    pub fn new(
        network: NetworkConfig,
        rpc_url: &str,
        registry_address: &str,
    ) -> Result<Self, ChainError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;
        let registry = Address::from_str(registry_address)
            .map_err(|e| ChainError::InvalidAddress(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url).erased();

        Ok(Self {
            network,
            rpc_url: rpc_url.to_string(),
            registry,
            provider,
        })
    }

    pub fn registry(&self) -> Address {
        self.registry
    }

    fn contract(&self) -> IVeralixRegistry::IVeralixRegistryInstance<DynProvider> {
        IVeralixRegistry::new(self.registry, self.provider.clone())
    }
}

#[async_trait]
impl CertificateLedger for RegistryReader {
    async fn read_ownership(
        &self,
        token_id: U256,
        owner: Option<Address>,
    ) -> Result<OwnershipStatus, ChainError> {
        let contract = self.contract();

        let record = contract
            .certificates(token_id)
            .call()
            .await
            .map_err(|e| ChainError::Read(format!("certificates({token_id}): {e}")))?;
        let uri = contract
            .uri(token_id)
            .call()
            .await
            .map_err(|e| ChainError::Read(format!("uri({token_id}): {e}")))?;

        let checked_owner = owner.unwrap_or(record.currentOwner);
        let balance = contract
            .balanceOf(checked_owner, token_id)
            .call()
            .await
            .map_err(|e| ChainError::Read(format!("balanceOf({token_id}): {e}")))?;

        tracing::debug!(
            token_id = %token_id,
            owner = %checked_owner,
            balance = %balance,
            "Registry ownership read"
        );

        Ok(OwnershipStatus::from_reads(
            token_id,
            self.registry,
            record.currentOwner,
            checked_owner,
            balance,
            uri,
            record.metadataURI,
        ))
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::Read(e.to_string()))
    }

    async fn chain_status(&self, signer: Option<Address>) -> Result<ChainStatus, ChainError> {
        let block_number = self.block_number().await?;
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::Read(e.to_string()))?;

        let total_supply = match self.contract().totalSupply().call().await {
            Ok(supply) => Some(supply.to_string()),
            Err(e) => {
                tracing::debug!(error = %e, "Registry does not expose totalSupply");
                None
            }
        };

        let signer = match signer {
            Some(address) => {
                let balance = self
                    .provider
                    .get_balance(address)
                    .await
                    .map_err(|e| ChainError::Read(e.to_string()))?;
                let nonce = self
                    .provider
                    .get_transaction_count(address)
                    .await
                    .map_err(|e| ChainError::Read(e.to_string()))?;
                let address = address.to_checksum(None);
                Some(SignerStatus {
                    explorer_url: self.network.address_url(&address),
                    address,
                    balance_wei: balance.to_string(),
                    balance: format_balance(balance, 18),
                    nonce,
                })
            }
            None => None,
        };

        let contract_address = self.registry.to_checksum(None);
        Ok(ChainStatus {
            network: self.network.name.to_string(),
            rpc_url: self.rpc_url.clone(),
            chain_id,
            block_number,
            contract_explorer_url: self.network.address_url(&contract_address),
            contract_address,
            total_supply,
            signer,
        })
    }
}

/// Format a balance with the specified number of decimals.
fn format_balance(balance: U256, decimals: u8) -> String {
    if balance.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = balance / divisor;
    let remainder = balance % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        // Up to 6 decimal places
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        format!("{}.{}", whole, &trimmed[..trimmed.len().min(6)])
    }
}
