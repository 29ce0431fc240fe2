// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

use std::sync::Arc;

use crate::blockchain::{CertificateLedger, CertificateMinter, RegistryMinter, RegistryReader};
use crate::config::ServiceConfig;
use crate::mint::DualMintService;
use crate::providers::{OriluxchainClient, SourceLedger};
use crate::storage::CertificateDatabase;

/// Failure to assemble the runtime clients from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Oriluxchain client: {0}")]
    Oriluxchain(#[from] crate::providers::OriluxchainError),

    #[error("ledger client: {0}")]
    Ledger(#[from] crate::blockchain::ChainError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub db: Arc<CertificateDatabase>,
    pub source: Arc<dyn SourceLedger>,
    pub ledger: Arc<dyn CertificateLedger>,
    pub minter: Arc<dyn CertificateMinter>,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        db: CertificateDatabase,
        source: Arc<dyn SourceLedger>,
        ledger: Arc<dyn CertificateLedger>,
        minter: Arc<dyn CertificateMinter>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            db: Arc::new(db),
            source,
            ledger,
            minter,
        }
    }

    /// Build the production clients described by `config`.
    pub fn from_config(config: ServiceConfig, db: CertificateDatabase) -> Result<Self, StateError> {
        let source = OriluxchainClient::new(&config.oriluxchain_api_url)?;
        let ledger = RegistryReader::new(
            *config.network(),
            &config.ledger_rpc_url,
            config.registry_address(),
        )?;
        let minter = RegistryMinter::new(config.signer.clone());

        Ok(Self::new(
            config,
            db,
            Arc::new(source),
            Arc::new(ledger),
            Arc::new(minter),
        ))
    }

    /// Dual-mint orchestrator over this state's clients.
    pub fn mint_service(&self) -> DualMintService {
        DualMintService::new(
            self.db.clone(),
            self.source.clone(),
            self.minter.clone(),
            *self.config.network(),
            self.config.metadata_uri_prefix.clone(),
        )
        .with_claim_ttl(self.config.mint_claim_ttl)
    }
}
