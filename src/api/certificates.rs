// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Certificate registration and lookup.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::{
    blockchain::parse_token_id,
    error::{ApiError, ApiJson},
    models::CertificateResponse,
    state::AppState,
    storage::{AuditEvent, AuditEventType, NewCertificate},
};

/// Register a certificate row before it is minted.
#[utoipa::path(
    post,
    path = "/v1/certificates",
    tag = "Certificates",
    request_body = NewCertificate,
    responses(
        (status = 201, description = "Certificate registered", body = CertificateResponse),
        (status = 400, description = "Missing certificate_id or malformed token_id"),
        (status = 409, description = "Certificate already registered")
    )
)]
pub async fn register_certificate(
    State(state): State<AppState>,
    ApiJson(mut input): ApiJson<NewCertificate>,
) -> Result<(StatusCode, Json<CertificateResponse>), ApiError> {
    input.certificate_id = input.certificate_id.trim().to_string();
    if input.certificate_id.is_empty() {
        return Err(ApiError::bad_request("certificate_id required"));
    }
    // Stored in decimal so ownership write-back finds the row.
    if let Some(raw) = input.token_id.take() {
        if !raw.trim().is_empty() {
            let token_id =
                parse_token_id(&raw).ok_or_else(|| ApiError::bad_request("Invalid token_id"))?;
            input.token_id = Some(token_id.to_string());
        }
    }

    let record = state.db.insert_certificate(input)?;
    tracing::info!(certificate_id = %record.certificate_id, "Certificate registered");

    let mut event = AuditEvent::new(AuditEventType::CertificateRegistered)
        .with_resource("nft_certificate", record.certificate_id.clone())
        .with_details(json!({
            "token_id": record.token_id,
            "contract_address": record.contract_address,
            "blockchain_network": record.blockchain_network,
        }));
    if let Some(user) = &record.user_id {
        event = event.with_user(user.clone());
    }
    if let Err(e) = state.db.append_audit(&event) {
        tracing::warn!(error = %e, "Failed to append audit event");
    }

    Ok((
        StatusCode::CREATED,
        Json(CertificateResponse {
            success: true,
            data: record,
        }),
    ))
}

/// Fetch a certificate with both chain projections.
#[utoipa::path(
    get,
    path = "/v1/certificates/{certificate_id}",
    tag = "Certificates",
    params(("certificate_id" = String, Path, description = "Certificate identifier")),
    responses(
        (status = 200, description = "Certificate found", body = CertificateResponse),
        (status = 404, description = "Certificate not found")
    )
)]
pub async fn get_certificate(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
) -> Result<Json<CertificateResponse>, ApiError> {
    let record = state
        .db
        .get_certificate(&certificate_id)?
        .ok_or_else(|| ApiError::not_found("Certificate not found"))?;

    Ok(Json(CertificateResponse {
        success: true,
        data: record,
    }))
}
