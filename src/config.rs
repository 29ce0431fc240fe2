// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! explicit configuration structs handed to services at startup. Nothing in
//! the crate reads the environment after [`ServiceConfig::from_env`] returns.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Root directory for the certificate database | `./data` |
//! | `CERT_DB_PATH` | Certificate database file | `{DATA_DIR}/certificates.redb` |
//! | `ORILUXCHAIN_API_URL` | Oriluxchain verification API (alias `ORILUX_API`) | `http://127.0.0.1:5000` |
//! | `MINT_NETWORK` | Destination network tag (`CRESTCHAIN` or `BSC_MAINNET`) | `CRESTCHAIN` |
//! | `CRESTCHAIN_RPC_URL` | Crestchain JSON-RPC endpoint | `https://rpc.crestchain.pro` |
//! | `BSC_RPC_URL` | BSC mainnet JSON-RPC endpoint | `https://bsc-dataseed.binance.org` |
//! | `LEDGER_RPC_URL` | RPC used for ownership reads (alias `LEDGER_RPC_ENDPOINT`) | mint network RPC |
//! | `REGISTRY_CONTRACT_ADDR` | Registry contract (alias `VERALIX_CONTRACT_ADDRESS`) | network registry |
//! | `SYSTEM_PRIVATE_KEY` | System minting key (hex, optional `0x`) | none |
//! | `METADATA_URI_PREFIX` | Prefix for derived metadata URIs | `ipfs://metadata/` |
//! | `MINT_CONFIRMATION_TIMEOUT_SECS` | Receipt wait timeout | no timeout |
//! | `MINT_CLAIM_TTL_SECS` | Age after which a pending mint claim may be taken over | `900` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{env, fmt, path::PathBuf, time::Duration};

use crate::blockchain::{NetworkConfig, NetworkId};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
///
/// The certificate database lives here unless `CERT_DB_PATH` overrides it.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const CERT_DB_PATH_ENV: &str = "CERT_DB_PATH";

pub const ORILUXCHAIN_API_URL_ENV: &str = "ORILUXCHAIN_API_URL";
pub const ORILUX_API_ENV: &str = "ORILUX_API";

pub const MINT_NETWORK_ENV: &str = "MINT_NETWORK";
pub const CRESTCHAIN_RPC_URL_ENV: &str = "CRESTCHAIN_RPC_URL";
pub const BSC_RPC_URL_ENV: &str = "BSC_RPC_URL";
pub const LEDGER_RPC_URL_ENV: &str = "LEDGER_RPC_URL";
pub const LEDGER_RPC_ENDPOINT_ENV: &str = "LEDGER_RPC_ENDPOINT";
pub const REGISTRY_CONTRACT_ADDR_ENV: &str = "REGISTRY_CONTRACT_ADDR";
pub const VERALIX_CONTRACT_ADDRESS_ENV: &str = "VERALIX_CONTRACT_ADDRESS";

/// Environment variable holding the system minting key.
///
/// The value is only ever moved into [`SystemKey`], whose `Debug` output is
/// redacted.
pub const SYSTEM_PRIVATE_KEY_ENV: &str = "SYSTEM_PRIVATE_KEY";

pub const METADATA_URI_PREFIX_ENV: &str = "METADATA_URI_PREFIX";
pub const MINT_CONFIRMATION_TIMEOUT_ENV: &str = "MINT_CONFIRMATION_TIMEOUT_SECS";

/// Environment variable for the pending mint claim lifetime.
///
/// Must exceed `MINT_CONFIRMATION_TIMEOUT_SECS`, otherwise a live mint could
/// lose its claim while still waiting for the receipt.
pub const MINT_CLAIM_TTL_ENV: &str = "MINT_CLAIM_TTL_SECS";
pub const DEFAULT_MINT_CLAIM_TTL_SECS: u32 = 900;

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_ORILUXCHAIN_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_METADATA_URI_PREFIX: &str = "ipfs://metadata/";

/// Errors raised while assembling configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Raw system private key as read from the environment.
///
/// Validation happens in [`crate::blockchain::SecureWallet`]; this type only
/// keeps the secret out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SystemKey(String);

impl SystemKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SystemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SystemKey(<redacted>)")
    }
}

/// Everything the wallet gate and the minter need to originate a transaction.
#[derive(Debug, Clone)]
pub struct SignerConfig {
    pub network: NetworkConfig,
    pub rpc_url: String,
    pub registry_address: String,
    pub private_key: Option<SystemKey>,
    pub confirmation_timeout: Option<Duration>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Service-wide configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub oriluxchain_api_url: String,
    /// RPC endpoint used by the chain reader.
    pub ledger_rpc_url: String,
    pub metadata_uri_prefix: String,
    /// Age after which a `Pending` mint claim is considered abandoned.
    pub mint_claim_ttl: chrono::Duration,
    pub signer: SignerConfig,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary lookup function.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => 8080,
        };

        let db_path = match get(CERT_DB_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()))
                .join("certificates.redb"),
        };

        let oriluxchain_api_url = get(ORILUXCHAIN_API_URL_ENV)
            .or_else(|| get(ORILUX_API_ENV))
            .unwrap_or_else(|| DEFAULT_ORILUXCHAIN_API_URL.to_string());

        let network_id = match get(MINT_NETWORK_ENV) {
            Some(raw) => NetworkId::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                name: MINT_NETWORK_ENV,
                reason: format!("unknown network `{raw}`"),
            })?,
            None => NetworkId::Crestchain,
        };
        let network = network_id.config();

        let rpc_url = match network_id {
            NetworkId::Crestchain => get(CRESTCHAIN_RPC_URL_ENV),
            NetworkId::BscMainnet => get(BSC_RPC_URL_ENV),
        }
        .unwrap_or_else(|| network.default_rpc_url.to_string());

        let ledger_rpc_url = get(LEDGER_RPC_URL_ENV)
            .or_else(|| get(LEDGER_RPC_ENDPOINT_ENV))
            .unwrap_or_else(|| rpc_url.clone());

        let registry_address = get(REGISTRY_CONTRACT_ADDR_ENV)
            .or_else(|| get(VERALIX_CONTRACT_ADDRESS_ENV))
            .unwrap_or_else(|| network.default_registry.to_string());

        let confirmation_timeout = match get(MINT_CONFIRMATION_TIMEOUT_ENV) {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    name: MINT_CONFIRMATION_TIMEOUT_ENV,
                    reason: e.to_string(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let claim_ttl_secs = match get(MINT_CLAIM_TTL_ENV) {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| ConfigError::Invalid {
                name: MINT_CLAIM_TTL_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_MINT_CLAIM_TTL_SECS,
        };
        if let Some(timeout) = confirmation_timeout {
            if u64::from(claim_ttl_secs) <= timeout.as_secs() {
                return Err(ConfigError::Invalid {
                    name: MINT_CLAIM_TTL_ENV,
                    reason: format!(
                        "must exceed {MINT_CONFIRMATION_TIMEOUT_ENV} ({}s)",
                        timeout.as_secs()
                    ),
                });
            }
        }

        Ok(Self {
            host,
            port,
            db_path,
            oriluxchain_api_url,
            ledger_rpc_url,
            metadata_uri_prefix: get(METADATA_URI_PREFIX_ENV)
                .unwrap_or_else(|| DEFAULT_METADATA_URI_PREFIX.to_string()),
            mint_claim_ttl: chrono::Duration::seconds(i64::from(claim_ttl_secs)),
            signer: SignerConfig {
                network,
                rpc_url,
                registry_address,
                private_key: get(SYSTEM_PRIVATE_KEY_ENV).map(SystemKey::new),
                confirmation_timeout,
            },
            log_format: LogFormat::parse(get(LOG_FORMAT_ENV).as_deref()),
        })
    }

    /// Registry contract the reader and minter talk to.
    pub fn registry_address(&self) -> &str {
        &self.signer.registry_address
    }

    /// Destination network for mints and verification URLs.
    pub fn network(&self) -> &NetworkConfig {
        &self.signer.network
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_target_crestchain() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.network().label, "CRESTCHAIN");
        assert_eq!(config.signer.rpc_url, "https://rpc.crestchain.pro");
        assert_eq!(config.ledger_rpc_url, config.signer.rpc_url);
        assert_eq!(
            config.registry_address(),
            "0xf23507FD4EE6188B6e0D1b94Fb48f59F3E77e3bB"
        );
        assert_eq!(config.oriluxchain_api_url, DEFAULT_ORILUXCHAIN_API_URL);
        assert_eq!(config.metadata_uri_prefix, "ipfs://metadata/");
        assert!(config.signer.private_key.is_none());
        assert!(config.signer.confirmation_timeout.is_none());
        assert_eq!(config.mint_claim_ttl, chrono::Duration::seconds(900));
        assert_eq!(config.db_path, PathBuf::from("./data/certificates.redb"));
    }

    #[test]
    fn aliases_are_honoured() {
        let config = ServiceConfig::from_lookup(lookup(&[
            (ORILUX_API_ENV, "http://orilux:5000"),
            (LEDGER_RPC_ENDPOINT_ENV, "http://ledger:8545"),
            (VERALIX_CONTRACT_ADDRESS_ENV, "0x5aDcEEf785FD21b65986328ca1e6DE0C973eC423"),
        ]))
        .unwrap();
        assert_eq!(config.oriluxchain_api_url, "http://orilux:5000");
        assert_eq!(config.ledger_rpc_url, "http://ledger:8545");
        assert_eq!(
            config.registry_address(),
            "0x5aDcEEf785FD21b65986328ca1e6DE0C973eC423"
        );
    }

    #[test]
    fn bsc_network_uses_bsc_rpc() {
        let config = ServiceConfig::from_lookup(lookup(&[
            (MINT_NETWORK_ENV, "bsc_mainnet"),
            (BSC_RPC_URL_ENV, "https://bsc.example"),
            (MINT_CONFIRMATION_TIMEOUT_ENV, "90"),
        ]))
        .unwrap();
        assert_eq!(config.network().label, "BSC_MAINNET");
        assert_eq!(config.signer.rpc_url, "https://bsc.example");
        assert_eq!(
            config.registry_address(),
            "0x5aDcEEf785FD21b65986328ca1e6DE0C973eC423"
        );
        assert_eq!(config.signer.confirmation_timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn rejects_unknown_network_and_bad_port() {
        assert!(matches!(
            ServiceConfig::from_lookup(lookup(&[(MINT_NETWORK_ENV, "polygon")])),
            Err(ConfigError::Invalid { name: MINT_NETWORK_ENV, .. })
        ));
        assert!(matches!(
            ServiceConfig::from_lookup(lookup(&[(PORT_ENV, "eighty")])),
            Err(ConfigError::Invalid { name: PORT_ENV, .. })
        ));
    }

    #[test]
    fn claim_ttl_must_outlast_confirmation_timeout() {
        let config = ServiceConfig::from_lookup(lookup(&[(MINT_CLAIM_TTL_ENV, "120")])).unwrap();
        assert_eq!(config.mint_claim_ttl, chrono::Duration::seconds(120));

        assert!(matches!(
            ServiceConfig::from_lookup(lookup(&[
                (MINT_CLAIM_TTL_ENV, "60"),
                (MINT_CONFIRMATION_TIMEOUT_ENV, "60"),
            ])),
            Err(ConfigError::Invalid { name: MINT_CLAIM_TTL_ENV, .. })
        ));
    }

    #[test]
    fn system_key_debug_is_redacted() {
        let config = ServiceConfig::from_lookup(lookup(&[(
            SYSTEM_PRIVATE_KEY_ENV,
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        )]))
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("4c0883a6"));
        assert!(rendered.contains("<redacted>"));
    }
}
