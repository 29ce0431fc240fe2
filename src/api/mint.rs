// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Dual-mint endpoint.

use std::str::FromStr;

use alloy::primitives::Address;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    error::{ApiError, ApiJson},
    mint::DualMintInput,
    models::{BatchMintResponse, BatchMintSummary, DualMintRequest, DualMintResponse},
    state::AppState,
};

/// Parse an optional recipient address, rejecting malformed input.
pub(crate) fn parse_owner(raw: Option<&str>) -> Result<Option<Address>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Address::from_str(raw)
            .map(Some)
            .map_err(|_| ApiError::bad_request("Invalid ownerAddress")),
        None => Ok(None),
    }
}

/// Verify a certificate on Oriluxchain and mint it on the destination chain.
///
/// Retrying a confirmed mint returns the stored result without a second
/// transaction. With `batchMode`, each id in `certificateIds` is minted in
/// turn and the per-certificate results are returned.
#[utoipa::path(
    post,
    path = "/functions/v1/dual-mint",
    tag = "Minting",
    request_body = DualMintRequest,
    responses(
        (status = 200, description = "Certificate minted (or batch processed)", body = DualMintResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "A mint for this certificate is in progress or unconfirmed"),
        (status = 500, description = "Verification or mint failed")
    )
)]
pub async fn dual_mint(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DualMintRequest>,
) -> Result<Response, ApiError> {
    let owner_address = parse_owner(request.owner_address.as_deref())?;
    let service = state.mint_service();

    if request.batch_mode {
        if request.certificate_ids.is_empty() {
            return Err(ApiError::bad_request("certificateIds required for batch mode"));
        }
        tracing::info!(count = request.certificate_ids.len(), "Starting batch mint");
        let results = service
            .mint_batch(
                &request.certificate_ids,
                request.user_id.as_deref(),
                owner_address,
            )
            .await;
        let response = BatchMintResponse {
            success: true,
            data: BatchMintSummary::from_results(results),
        };
        return Ok(Json(response).into_response());
    }

    let certificate_id = request
        .certificate_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("certificateId is required"))?;

    let outcome = service
        .mint(&DualMintInput {
            certificate_id,
            jewelry_item_id: request.jewelry_item_id,
            user_id: request.user_id,
            owner_address,
        })
        .await?;

    Ok(Json(outcome.into_response()).into_response())
}
