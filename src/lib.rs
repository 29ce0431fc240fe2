// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Veralix Certificate Service - Dual-Chain Certificate Minting
//!
//! Verifies jewelry certificates on Oriluxchain, mints the matching token on
//! Crestchain (or BSC) through a whitelisted system wallet, and keeps stored
//! certificate state in sync with chain events and on-chain ownership.
//!
//! ## Modules
//!
//! - `api` - HTTP function endpoints (Axum)
//! - `blockchain` - Registry reads, system wallet, minting
//! - `providers` - Oriluxchain verification API
//! - `mint` - Dual-mint orchestration and idempotency
//! - `ingest` - Webhook event application
//! - `reconciliation` - Ownership checks with write-back
//! - `storage` - Embedded certificate database (redb)

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod ingest;
pub mod mint;
pub mod models;
pub mod providers;
pub mod reconciliation;
pub mod state;
pub mod storage;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, DEFAULT_LOG_FILTER};

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}
