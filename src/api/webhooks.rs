// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Chain notification webhooks.
//!
//! Deliveries are unauthenticated and may repeat; every handler writes only
//! what changed, so a redelivered payload is harmless.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    error::{ApiError, ApiJson},
    ingest,
    models::{
        ChainEventPayload, ChainEventUpdate, CrestchainWebhookPayload, IgnoredEvent,
        OriluxchainWebhookPayload, OriluxchainWebhookResponse, WebhookAck,
        ORILUXCHAIN_RELEVANT_EVENTS,
    },
    state::AppState,
};

fn apply(state: &AppState, update: ChainEventUpdate) -> Result<Json<WebhookAck>, ApiError> {
    if update.certificate_id.trim().is_empty() {
        return Err(ApiError::bad_request("certificate_id required"));
    }
    ingest::apply_chain_event(&state.db, &update).map_err(|e| {
        tracing::error!(certificate_id = %update.certificate_id, error = %e, "Chain event not applied");
        ApiError::internal(e.to_string())
    })?;
    Ok(Json(WebhookAck { success: true }))
}

/// Crestchain block/transaction notification.
#[utoipa::path(
    post,
    path = "/functions/v1/crestchain-webhook",
    tag = "Webhooks",
    request_body = CrestchainWebhookPayload,
    responses(
        (status = 200, description = "Event applied (or no certificate matched)", body = WebhookAck),
        (status = 400, description = "Malformed payload"),
        (status = 500, description = "Database write failed")
    )
)]
pub async fn crestchain_webhook(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CrestchainWebhookPayload>,
) -> Result<Json<WebhookAck>, ApiError> {
    tracing::info!(
        certificate_id = %payload.certificate_id,
        event = ?payload.event,
        "Crestchain webhook received"
    );
    apply(&state, ChainEventUpdate::from(&payload))
}

/// Ledger event in the `eventType` / `assetId` / `ledgerData` shape.
#[utoipa::path(
    post,
    path = "/functions/v1/chain-events-handler",
    tag = "Webhooks",
    request_body = ChainEventPayload,
    responses(
        (status = 200, description = "Event applied (or no certificate matched)", body = WebhookAck),
        (status = 400, description = "Malformed payload"),
        (status = 500, description = "Database write failed")
    )
)]
pub async fn chain_events_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ChainEventPayload>,
) -> Result<Json<WebhookAck>, ApiError> {
    tracing::info!(
        asset_id = %payload.asset_id,
        event_type = ?payload.event_type,
        "Chain event received"
    );
    apply(&state, ChainEventUpdate::from(&payload))
}

/// Oriluxchain verification notification.
///
/// Only `certificate_verified` and `block_mined` are acted on; other events
/// are acknowledged with `Event not relevant`.
#[utoipa::path(
    post,
    path = "/functions/v1/oriluxchain-webhook",
    tag = "Webhooks",
    request_body = OriluxchainWebhookPayload,
    responses(
        (status = 200, description = "Verification recorded", body = OriluxchainWebhookResponse),
        (status = 400, description = "Malformed payload"),
        (status = 500, description = "Unknown certificate or database failure")
    )
)]
pub async fn oriluxchain_webhook(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<OriluxchainWebhookPayload>,
) -> Result<Response, ApiError> {
    tracing::info!(event = %payload.event, certificate_id = ?payload.certificate_id, "Oriluxchain webhook received");

    if !ORILUXCHAIN_RELEVANT_EVENTS.contains(&payload.event.as_str()) {
        return Ok(Json(IgnoredEvent {
            message: "Event not relevant".to_string(),
        })
        .into_response());
    }

    let certificate_id = payload
        .certificate_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("certificate_id required"))?;

    ingest::apply_oriluxchain_verification(
        &state.db,
        certificate_id,
        &payload.event,
        payload.blockchain.as_ref(),
    )
    .map_err(|e| {
        tracing::error!(certificate_id, error = %e, "Oriluxchain verification not recorded");
        ApiError::internal(e.to_string())
    })?;

    Ok(Json(OriluxchainWebhookResponse {
        success: true,
        message: "Certificate verified".to_string(),
        certificate_id: certificate_id.to_string(),
    })
    .into_response())
}
