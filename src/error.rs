// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::mint::MintError;
use crate::storage::CertificateDbError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<CertificateDbError> for ApiError {
    fn from(err: CertificateDbError) -> Self {
        match err {
            CertificateDbError::Conflict(what) => Self::conflict(format!("{what} already exists")),
            CertificateDbError::NotFound(what) => Self::not_found(format!("{what} not found")),
            other => {
                tracing::error!(error = %other, "Certificate database error");
                Self::internal(other.to_string())
            }
        }
    }
}

impl From<MintError> for ApiError {
    fn from(err: MintError) -> Self {
        match err {
            busy @ MintError::InProgress { .. } => Self::conflict(busy.to_string()),
            MintError::Database(db) => db.into(),
            other => {
                tracing::error!(error = %other, "Dual mint failed");
                Self::internal(other.to_string())
            }
        }
    }
}

/// JSON body extractor that reports any unreadable body as
/// `400 Invalid request format`.
///
/// The body is parsed whatever the `Content-Type`, since webhook senders do
/// not reliably set it.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "Failed to read request body");
            ApiError::bad_request("Invalid request format")
        })?;

        serde_json::from_slice(&bytes).map(ApiJson).map_err(|e| {
            tracing::debug!(error = %e, "Rejected malformed JSON body");
            ApiError::bad_request("Invalid request format")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use serde::Deserialize;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let conflict = ApiError::conflict("busy");
        assert_eq!(conflict.status, StatusCode::CONFLICT);

        let internal = ApiError::internal("boom");
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);

        let down = ApiError::service_unavailable("rpc down");
        assert_eq!(down.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"success":false,"error":"bad data"}"#);
    }

    #[test]
    fn database_conflict_maps_to_409() {
        let err: ApiError = CertificateDbError::Conflict("Certificate CERT-1".into()).into();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[test]
    fn mint_errors_map_to_status() {
        let unverified: ApiError = MintError::SourceNotVerified.into();
        assert_eq!(unverified.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(unverified.message, "Certificate not found in Oriluxchain");

        let busy: ApiError = MintError::InProgress {
            certificate_id: "CERT-1".into(),
            tx_hash: None,
        }
        .into();
        assert_eq!(busy.status, StatusCode::CONFLICT);
    }

    #[derive(Debug, Deserialize)]
    struct Probe {
        value: u32,
    }

    #[tokio::test]
    async fn api_json_accepts_body_without_content_type() {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(r#"{"value":7}"#))
            .unwrap();
        let ApiJson(probe) = ApiJson::<Probe>::from_request(req, &()).await.unwrap();
        assert_eq!(probe.value, 7);
    }

    #[tokio::test]
    async fn api_json_rejects_malformed_body() {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let err = ApiJson::<Probe>::from_request(req, &())
            .await
            .err()
            .expect("malformed body is rejected");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid request format");
    }
}
