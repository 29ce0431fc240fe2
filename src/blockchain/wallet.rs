// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Capability-restricted system wallet.
//!
//! The system key may only call `createCertificate` on the registry contracts
//! whitelisted for the configured network. Every transaction the service
//! originates goes through [`SecureWallet::sign_transaction`].

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::Address,
    providers::{DynProvider, PendingTransactionBuilder, Provider},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    sol_types::SolCall,
};

use super::types::{NetworkConfig, ALLOWED_FUNCTION};
use crate::config::SignerConfig;

/// Normalized length of a `0x`-prefixed 32-byte hex key.
const KEY_LENGTH: usize = 66;

/// Errors raised by the wallet gate.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("SYSTEM_PRIVATE_KEY not configured")]
    MissingKey,

    #[error("Invalid private key format")]
    InvalidKeyFormat,

    #[error("Contract {0} not whitelisted")]
    ContractNotWhitelisted(String),

    #[error("Function {0} not allowed")]
    FunctionNotAllowed(String),

    #[error("Failed to submit transaction: {0}")]
    Submission(String),
}

/// System wallet bound to one network's whitelist.
pub struct SecureWallet {
    network: NetworkConfig,
    signer: PrivateKeySigner,
}

impl std::fmt::Debug for SecureWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureWallet")
            .field("network", &self.network.label)
            .field("address", &self.signer.address())
            .finish()
    }
}

impl SecureWallet {
    /// Load the system key from signer configuration.
    pub fn load(config: &SignerConfig) -> Result<Self, WalletError> {
        let raw = config.private_key.as_ref().ok_or(WalletError::MissingKey)?;
        let signer = parse_key(raw.expose())?;
        Ok(Self {
            network: config.network,
            signer,
        })
    }

    /// Public address of the system key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Wallet handle for a signing provider.
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }

    /// Case-insensitive membership in the network's allow-list.
    pub fn is_contract_whitelisted(&self, address: &str) -> bool {
        self.network
            .whitelist()
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(address.trim()))
    }

    /// Submit `call` to `contract` after enforcing the whitelist.
    ///
    /// The contract check runs first, so a non-whitelisted contract is
    /// rejected regardless of the function requested. The function check
    /// covers both the declared name and the encoded call's signature.
    pub async fn sign_transaction<C: SolCall>(
        &self,
        provider: &DynProvider,
        contract: Address,
        function_name: &str,
        call: &C,
    ) -> Result<PendingTransactionBuilder<Ethereum>, WalletError> {
        let contract_str = contract.to_checksum(None);
        if !self.is_contract_whitelisted(&contract_str) {
            tracing::warn!(contract = %contract_str, network = self.network.label, "Rejected non-whitelisted contract");
            return Err(WalletError::ContractNotWhitelisted(contract_str));
        }

        if function_name != ALLOWED_FUNCTION || !is_allowed_signature(C::SIGNATURE) {
            tracing::warn!(function = function_name, "Rejected disallowed function");
            return Err(WalletError::FunctionNotAllowed(function_name.to_string()));
        }

        let tx = TransactionRequest::default()
            .from(self.address())
            .to(contract)
            .input(call.abi_encode().into());

        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(|e| WalletError::Submission(e.to_string()))?;

        tracing::info!(
            tx_hash = %pending.tx_hash(),
            contract = %contract_str,
            network = self.network.label,
            "Transaction submitted"
        );

        Ok(pending)
    }
}

fn is_allowed_signature(signature: &str) -> bool {
    signature
        .split_once('(')
        .is_some_and(|(name, _)| name == ALLOWED_FUNCTION)
}

/// Normalize to `0x` + hex and build a signer.
fn parse_key(raw: &str) -> Result<PrivateKeySigner, WalletError> {
    let trimmed = raw.trim();
    let normalized = if trimmed.starts_with("0x") {
        trimmed.to_string()
    } else {
        format!("0x{trimmed}")
    };

    if normalized.len() != KEY_LENGTH {
        return Err(WalletError::InvalidKeyFormat);
    }

    let key_bytes =
        alloy::hex::decode(&normalized[2..]).map_err(|_| WalletError::InvalidKeyFormat)?;
    PrivateKeySigner::from_slice(&key_bytes).map_err(|_| WalletError::InvalidKeyFormat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::registry::IVeralixRegistry;
    use crate::blockchain::types::{BSC_MAINNET, CRESTCHAIN};
    use crate::config::SystemKey;
    use alloy::primitives::{address, U256};
    use alloy::providers::ProviderBuilder;

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const NOT_WHITELISTED: Address = address!("ddF276c0Ab894fa7D085Ac3441471A431610A0E4");
    const CREST_REGISTRY: Address = address!("f23507FD4EE6188B6e0D1b94Fb48f59F3E77e3bB");

    fn signer_config(network: NetworkConfig, key: Option<&str>) -> SignerConfig {
        SignerConfig {
            rpc_url: network.default_rpc_url.to_string(),
            registry_address: network.default_registry.to_string(),
            network,
            private_key: key.map(SystemKey::new),
            confirmation_timeout: None,
        }
    }

    fn offline_provider() -> DynProvider {
        // Never contacted: every test below fails before submission.
        ProviderBuilder::new()
            .connect_http("http://127.0.0.1:9".parse().unwrap())
            .erased()
    }

    fn create_call() -> IVeralixRegistry::createCertificateCall {
        IVeralixRegistry::createCertificateCall {
            to: address!("742d35Cc6634C0532925a3b844Bc9e7595f4aB12"),
            certificateId: "CERT-1".to_string(),
            metadataURI: "ipfs://metadata/CERT-1".to_string(),
        }
    }

    #[test]
    fn loads_prefixed_and_bare_keys() {
        let bare = SecureWallet::load(&signer_config(CRESTCHAIN, Some(KEY))).unwrap();
        let prefixed =
            SecureWallet::load(&signer_config(CRESTCHAIN, Some(&format!("0x{KEY}")))).unwrap();
        assert_eq!(bare.address(), prefixed.address());
    }

    #[test]
    fn rejects_wrong_length_keys() {
        let too_long = format!("{KEY}00");
        for key in [&KEY[..63], &KEY[..62], "", "0x", too_long.as_str()] {
            let err = SecureWallet::load(&signer_config(CRESTCHAIN, Some(key))).unwrap_err();
            assert!(matches!(err, WalletError::InvalidKeyFormat), "key {key:?}");
        }
    }

    #[test]
    fn rejects_non_hex_key_of_correct_length() {
        let key = format!("0x{}", "z".repeat(64));
        let err = SecureWallet::load(&signer_config(CRESTCHAIN, Some(&key))).unwrap_err();
        assert!(matches!(err, WalletError::InvalidKeyFormat));
    }

    #[test]
    fn missing_key_is_reported() {
        let err = SecureWallet::load(&signer_config(CRESTCHAIN, None)).unwrap_err();
        assert!(matches!(err, WalletError::MissingKey));
        assert_eq!(err.to_string(), "SYSTEM_PRIVATE_KEY not configured");
    }

    #[test]
    fn whitelist_is_case_insensitive_and_per_network() {
        let crest = SecureWallet::load(&signer_config(CRESTCHAIN, Some(KEY))).unwrap();
        assert!(crest.is_contract_whitelisted("0xf23507fd4ee6188b6e0d1b94fb48f59f3e77e3bb"));
        assert!(crest.is_contract_whitelisted("0xF23507FD4EE6188B6E0D1B94FB48F59F3E77E3BB"));
        assert!(!crest.is_contract_whitelisted("0x5aDcEEf785FD21b65986328ca1e6DE0C973eC423"));

        let bsc = SecureWallet::load(&signer_config(BSC_MAINNET, Some(KEY))).unwrap();
        assert!(bsc.is_contract_whitelisted("0x5adceef785fd21b65986328ca1e6de0c973ec423"));
    }

    #[test]
    fn debug_does_not_leak_key() {
        let wallet = SecureWallet::load(&signer_config(CRESTCHAIN, Some(KEY))).unwrap();
        assert!(!format!("{wallet:?}").contains(&KEY[..16]));
    }

    #[tokio::test]
    async fn non_whitelisted_contract_rejected_for_any_function() {
        let wallet = SecureWallet::load(&signer_config(CRESTCHAIN, Some(KEY))).unwrap();
        let provider = offline_provider();

        for function in ["createCertificate", "transferOwnership", "burn"] {
            let err = wallet
                .sign_transaction(&provider, NOT_WHITELISTED, function, &create_call())
                .await
                .err()
                .expect("rejected before submission");
            assert!(matches!(err, WalletError::ContractNotWhitelisted(_)));
        }
    }

    #[tokio::test]
    async fn other_functions_rejected_on_whitelisted_contract() {
        let wallet = SecureWallet::load(&signer_config(CRESTCHAIN, Some(KEY))).unwrap();
        let provider = offline_provider();

        let err = wallet
            .sign_transaction(&provider, CREST_REGISTRY, "transferOwnership", &create_call())
            .await
            .err()
            .expect("rejected before submission");
        assert!(matches!(err, WalletError::FunctionNotAllowed(ref f) if f == "transferOwnership"));

        // Declared name matches but the encoded call does not.
        let owner_of = IVeralixRegistry::ownerOfCall { tokenId: U256::from(1u64) };
        let err = wallet
            .sign_transaction(&provider, CREST_REGISTRY, "createCertificate", &owner_of)
            .await
            .err()
            .expect("rejected before submission");
        assert!(matches!(err, WalletError::FunctionNotAllowed(_)));
    }

    #[test]
    fn signature_check_matches_exact_name() {
        assert!(is_allowed_signature("createCertificate(address,string,string)"));
        assert!(!is_allowed_signature("createCertificateBatch(address[])"));
        assert!(!is_allowed_signature("ownerOf(uint256)"));
    }
}
