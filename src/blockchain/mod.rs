// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! EVM integration for the certificate registry on Crestchain and BSC.
//!
//! This module provides:
//! - Ownership reads against the registry (`certificates`, `uri`, `balanceOf`)
//! - The whitelisted system wallet
//! - `createCertificate` submission with typed mint-event decoding

pub mod error;
pub mod minter;
pub mod reader;
pub mod registry;
pub mod types;
pub mod wallet;

pub use error::ChainError;
pub use minter::{CertificateMinter, MintCall, MintFailure, MintedCertificate, RegistryMinter};
pub use reader::{CertificateLedger, ChainStatus, RegistryReader, SignerStatus};
pub use types::*;
pub use wallet::{SecureWallet, WalletError};
