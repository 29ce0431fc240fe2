// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Network constants, contract whitelist, and chain-facing result types.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Destination network tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkId {
    Crestchain,
    BscMainnet,
}

impl NetworkId {
    /// Parse a network tag, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CRESTCHAIN" => Some(NetworkId::Crestchain),
            "BSC_MAINNET" | "BSC" => Some(NetworkId::BscMainnet),
            _ => None,
        }
    }

    pub fn config(self) -> NetworkConfig {
        match self {
            NetworkId::Crestchain => CRESTCHAIN,
            NetworkId::BscMainnet => BSC_MAINNET,
        }
    }
}

/// EVM network configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    pub id: NetworkId,
    /// Network name for display
    pub name: &'static str,
    /// Label persisted alongside chain projections
    pub label: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint used when none is configured
    pub default_rpc_url: &'static str,
    /// Registry contract used when none is configured
    pub default_registry: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

impl NetworkConfig {
    /// Explorer link for a transaction.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }

    /// Explorer link for a contract or account.
    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer_url, address)
    }

    /// Contracts the system wallet may call on this network.
    pub fn whitelist(&self) -> &'static [&'static str] {
        match self.id {
            NetworkId::Crestchain => CRESTCHAIN_WHITELIST,
            NetworkId::BscMainnet => BSC_MAINNET_WHITELIST,
        }
    }
}

/// Crestchain configuration.
pub const CRESTCHAIN: NetworkConfig = NetworkConfig {
    id: NetworkId::Crestchain,
    name: "Crestchain",
    label: "CRESTCHAIN",
    chain_id: 85523,
    default_rpc_url: "https://rpc.crestchain.pro",
    default_registry: "0xf23507FD4EE6188B6e0D1b94Fb48f59F3E77e3bB",
    explorer_url: "https://scan.crestchain.pro",
};

/// BSC Mainnet configuration.
pub const BSC_MAINNET: NetworkConfig = NetworkConfig {
    id: NetworkId::BscMainnet,
    name: "BSC Mainnet",
    label: "BSC_MAINNET",
    chain_id: 56,
    default_rpc_url: "https://bsc-dataseed.binance.org",
    default_registry: "0x5aDcEEf785FD21b65986328ca1e6DE0C973eC423",
    explorer_url: "https://bscscan.com",
};

/// Veralix Crestchain registry.
const CRESTCHAIN_WHITELIST: &[&str] = &["0xf23507FD4EE6188B6e0D1b94Fb48f59F3E77e3bB"];

/// VeralixMasterRegistry on BSC.
const BSC_MAINNET_WHITELIST: &[&str] = &["0x5aDcEEf785FD21b65986328ca1e6DE0C973eC423"];

/// The only contract function the system wallet may invoke.
pub const ALLOWED_FUNCTION: &str = "createCertificate";

/// On-chain ownership snapshot for a certificate token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipStatus {
    /// Token identifier (decimal)
    pub token_id: String,
    /// Registry contract queried
    pub contract_address: String,
    /// Current owner recorded by the registry (checksummed)
    pub owner: String,
    /// Address whose balance was checked (checksummed)
    pub checked_owner: String,
    /// Balance of `checked_owner` for this token (decimal)
    pub balance: String,
    /// True iff `balance > 0`
    pub is_owner_holding: bool,
    /// Token URI, falling back to the registry's metadata URI
    #[serde(rename = "tokenURI")]
    pub token_uri: Option<String>,
}

impl OwnershipStatus {
    /// Assemble a snapshot from raw contract reads.
    pub fn from_reads(
        token_id: U256,
        contract_address: Address,
        owner: Address,
        checked_owner: Address,
        balance: U256,
        uri: String,
        metadata_uri: String,
    ) -> Self {
        let token_uri = [uri, metadata_uri].into_iter().find(|s| !s.is_empty());
        Self {
            token_id: token_id.to_string(),
            contract_address: contract_address.to_checksum(None),
            owner: owner.to_checksum(None),
            checked_owner: checked_owner.to_checksum(None),
            balance: balance.to_string(),
            is_owner_holding: is_holding(balance),
            token_uri,
        }
    }
}

/// Ownership predicate: the holder owns at least one unit.
pub fn is_holding(balance: U256) -> bool {
    balance > U256::ZERO
}

/// Parse a decimal (or `0x` hex) token identifier.
pub fn parse_token_id(raw: &str) -> Option<U256> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).ok(),
        None => U256::from_str_radix(trimmed, 10).ok(),
    }
}
