// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

use axum::{
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, CONTENT_TYPE,
        },
        HeaderName, StatusCode,
    },
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blockchain::{ChainStatus, OwnershipStatus, SignerStatus},
    models::{
        BatchMintItem, BatchMintResponse, BatchMintSummary, BlockchainEvent, CertificateResponse,
        ChainEventPayload, CrestchainMintSummary, CrestchainWebhookPayload, DualMintRequest,
        DualMintResponse, IgnoredEvent, LedgerData, NumberOrText, OriluxchainMintSummary,
        OriluxchainWebhookPayload, OriluxchainWebhookResponse, OwnershipRequest,
        OwnershipResponse, WebhookAck,
    },
    state::AppState,
    storage::{CertificateRecord, CrestProjection, NewCertificate, OriluxProjection},
};

pub mod certificates;
pub mod diagnostics;
pub mod health;
pub mod mint;
pub mod ownership;
pub mod webhooks;

/// Headers browsers may send to the function endpoints.
const FUNCTION_ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// Bare `OPTIONS` answer for the function endpoints.
async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_HEADERS, FUNCTION_ALLOWED_HEADERS),
        ],
    )
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
        ])
}

pub fn router(state: AppState) -> Router {
    let function_routes = Router::new()
        .route(
            "/dual-mint",
            post(mint::dual_mint).options(preflight),
        )
        .route(
            "/dual-mint-orilux-crestchain",
            post(mint::dual_mint).options(preflight),
        )
        .route(
            "/ownership-validator",
            post(ownership::validate_ownership).options(preflight),
        )
        .route(
            "/verify-nft-status",
            post(ownership::verify_nft_status).options(preflight),
        )
        .route(
            "/crestchain-webhook",
            post(webhooks::crestchain_webhook).options(preflight),
        )
        .route(
            "/chain-events-handler",
            post(webhooks::chain_events_handler).options(preflight),
        )
        .route(
            "/oriluxchain-webhook",
            post(webhooks::oriluxchain_webhook).options(preflight),
        );

    let v1_routes = Router::new()
        .route("/certificates", post(certificates::register_certificate))
        .route(
            "/certificates/{certificate_id}",
            get(certificates::get_certificate),
        )
        .route("/chain/status", get(diagnostics::chain_status));

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .nest("/functions/v1", function_routes)
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        mint::dual_mint,
        ownership::validate_ownership,
        ownership::verify_nft_status,
        webhooks::crestchain_webhook,
        webhooks::chain_events_handler,
        webhooks::oriluxchain_webhook,
        certificates::register_certificate,
        certificates::get_certificate,
        diagnostics::chain_status,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            DualMintRequest,
            DualMintResponse,
            OriluxchainMintSummary,
            CrestchainMintSummary,
            BatchMintItem,
            BatchMintSummary,
            BatchMintResponse,
            OwnershipRequest,
            OwnershipResponse,
            OwnershipStatus,
            NumberOrText,
            BlockchainEvent,
            CrestchainWebhookPayload,
            LedgerData,
            ChainEventPayload,
            OriluxchainWebhookPayload,
            OriluxchainWebhookResponse,
            WebhookAck,
            IgnoredEvent,
            NewCertificate,
            CertificateRecord,
            CertificateResponse,
            OriluxProjection,
            CrestProjection,
            ChainStatus,
            SignerStatus,
            diagnostics::ChainStatusResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Minting", description = "Oriluxchain verification and destination-chain minting"),
        (name = "Ownership", description = "On-chain ownership reconciliation"),
        (name = "Webhooks", description = "Chain event ingestion"),
        (name = "Certificates", description = "Certificate records"),
        (name = "Diagnostics", description = "Ledger connectivity"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
