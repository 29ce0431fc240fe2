// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Ledger connectivity diagnostics.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    blockchain::{ChainStatus, SecureWallet},
    error::ApiError,
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ChainStatusResponse {
    pub success: bool,
    pub data: ChainStatus,
}

/// Report RPC reachability, registry state and the system wallet's funding.
///
/// The signer section is omitted when no system key is configured or the
/// configured key cannot be parsed.
#[utoipa::path(
    get,
    path = "/v1/chain/status",
    tag = "Diagnostics",
    responses(
        (status = 200, description = "Ledger reachable", body = ChainStatusResponse),
        (status = 503, description = "Ledger RPC unavailable")
    )
)]
pub async fn chain_status(
    State(state): State<AppState>,
) -> Result<Json<ChainStatusResponse>, ApiError> {
    let signer = match SecureWallet::load(&state.config.signer) {
        Ok(wallet) => Some(wallet.address()),
        Err(e) => {
            tracing::debug!(error = %e, "Signer unavailable for diagnostics");
            None
        }
    };

    let status = state.ledger.chain_status(signer).await.map_err(|e| {
        tracing::warn!(error = %e, "Ledger diagnostics failed");
        ApiError::service_unavailable(format!("Failed to reach ledger RPC: {e}"))
    })?;

    Ok(Json(ChainStatusResponse {
        success: true,
        data: status,
    }))
}
