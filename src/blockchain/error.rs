// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

/// Errors that can occur during registry reads and mint submission.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Registry read failed: {0}")]
    Read(String),

    #[error("Confirmation failed for {tx_hash}: {reason}")]
    Confirmation { tx_hash: String, reason: String },

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("No mint event found in receipt of {tx_hash}")]
    TokenIdNotFound { tx_hash: String },
}

impl ChainError {
    /// Hash of a transaction that reached the network before the failure.
    pub fn broadcast_tx(&self) -> Option<&str> {
        match self {
            ChainError::Confirmation { tx_hash, .. }
            | ChainError::Reverted { tx_hash }
            | ChainError::TokenIdNotFound { tx_hash } => Some(tx_hash),
            _ => None,
        }
    }
}
