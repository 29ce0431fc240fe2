// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Ownership reconciliation endpoints (`ownership-validator`,
//! `verify-nft-status`).

use axum::{extract::State, Json};

use super::mint::parse_owner;
use crate::{
    blockchain::parse_token_id,
    error::{ApiError, ApiJson},
    models::{OwnershipRequest, OwnershipResponse},
    reconciliation,
    state::AppState,
};

/// Check on-chain ownership of a certificate token.
///
/// With `update: true` the matching certificate row records the result.
#[utoipa::path(
    post,
    path = "/functions/v1/ownership-validator",
    tag = "Ownership",
    request_body = OwnershipRequest,
    responses(
        (status = 200, description = "Ownership snapshot", body = OwnershipResponse),
        (status = 400, description = "Missing or malformed tokenId / ownerAddress"),
        (status = 500, description = "Chain read failed")
    )
)]
pub async fn validate_ownership(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<OwnershipRequest>,
) -> Result<Json<OwnershipResponse>, ApiError> {
    let raw_token = request
        .token_id
        .as_ref()
        .and_then(|t| t.as_text())
        .ok_or_else(|| ApiError::bad_request("tokenId parameter required"))?;
    let token_id =
        parse_token_id(&raw_token).ok_or_else(|| ApiError::bad_request("Invalid tokenId"))?;
    let owner = parse_owner(request.owner_address.as_deref())?;

    let status = reconciliation::validate_ownership(
        state.ledger.as_ref(),
        &state.db,
        state.config.network(),
        token_id,
        owner,
        request.update,
    )
    .await
    .map_err(|e| {
        tracing::error!(token_id = %raw_token, error = %e, "Ownership lookup failed");
        ApiError::internal(e.to_string())
    })?;

    Ok(Json(OwnershipResponse {
        success: true,
        data: status,
    }))
}

/// Alias of `ownership-validator` kept for existing clients.
#[utoipa::path(
    post,
    path = "/functions/v1/verify-nft-status",
    tag = "Ownership",
    request_body = OwnershipRequest,
    responses(
        (status = 200, description = "Ownership snapshot", body = OwnershipResponse),
        (status = 400, description = "Missing or malformed tokenId / ownerAddress"),
        (status = 500, description = "Chain read failed")
    )
)]
pub async fn verify_nft_status(
    state: State<AppState>,
    request: ApiJson<OwnershipRequest>,
) -> Result<Json<OwnershipResponse>, ApiError> {
    validate_ownership(state, request).await
}
