// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Oriluxchain verification API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum OriluxchainError {
    #[error("Oriluxchain configuration invalid: {0}")]
    InvalidConfig(String),

    #[error("Oriluxchain request failed: {0}")]
    Request(String),

    #[error("Oriluxchain response was invalid: {0}")]
    InvalidResponse(String),
}

/// Outcome of a source-ledger verification lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceVerification {
    pub verified: bool,
    pub verification_url: Option<String>,
}

/// Source-of-truth ledger for certificate existence.
#[async_trait]
pub trait SourceLedger: Send + Sync {
    async fn verify_certificate(
        &self,
        certificate_id: &str,
    ) -> Result<SourceVerification, OriluxchainError>;
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    verified: Option<bool>,
    #[serde(default)]
    valid: Option<bool>,
    #[serde(default)]
    verification_url: Option<String>,
}

impl From<VerifyResponse> for SourceVerification {
    fn from(body: VerifyResponse) -> Self {
        Self {
            verified: body.verified.or(body.valid).unwrap_or(false),
            verification_url: body.verification_url.filter(|u| !u.is_empty()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OriluxchainClient {
    base_url: Url,
    http: Client,
}

impl OriluxchainClient {
    pub fn new(base_url: &str) -> Result<Self, OriluxchainError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| OriluxchainError::InvalidConfig(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(OriluxchainError::InvalidConfig(format!(
                "{base_url} cannot be a base URL"
            )));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| OriluxchainError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { base_url, http })
    }

    /// `{base}/api/jewelry/verify/{certificate_id}` with the id percent-encoded.
    fn verify_url(&self, certificate_id: &str) -> Result<Url, OriluxchainError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| OriluxchainError::InvalidConfig("base URL has no path".to_string()))?
            .pop_if_empty()
            .extend(["api", "jewelry", "verify", certificate_id]);
        Ok(url)
    }
}

#[async_trait]
impl SourceLedger for OriluxchainClient {
    async fn verify_certificate(
        &self,
        certificate_id: &str,
    ) -> Result<SourceVerification, OriluxchainError> {
        let url = self.verify_url(certificate_id)?;
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| OriluxchainError::Request(format!("GET {url} failed: {e}")))?;

        // Not-found answers still carry a JSON body with `verified: false`.
        let status = response.status();
        let body: VerifyResponse = response.json().await.map_err(|e| {
            OriluxchainError::InvalidResponse(format!("GET {url} returned {status}: {e}"))
        })?;

        let verification = SourceVerification::from(body);
        tracing::debug!(
            certificate_id,
            status = %status,
            verified = verification.verified,
            "Oriluxchain verification lookup"
        );
        Ok(verification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> SourceVerification {
        serde_json::from_str::<VerifyResponse>(json).unwrap().into()
    }

    #[test]
    fn verified_flag_mapping() {
        assert!(parse(r#"{"verified":true}"#).verified);
        assert!(parse(r#"{"valid":true,"verification_url":"https://x"}"#).verified);
        assert!(!parse(r#"{"verified":false,"valid":true}"#).verified);
        assert!(!parse(r#"{"error":"not found"}"#).verified);
    }

    #[test]
    fn keeps_verification_url() {
        let v = parse(r#"{"verified":true,"verification_url":"https://orilux/verify/C-1"}"#);
        assert_eq!(v.verification_url.as_deref(), Some("https://orilux/verify/C-1"));
        assert_eq!(parse(r#"{"verified":true,"verification_url":""}"#).verification_url, None);
    }

    #[test]
    fn verify_url_encodes_certificate_id() {
        let client = OriluxchainClient::new("http://127.0.0.1:5000/").unwrap();
        assert_eq!(
            client.verify_url("CERT-1").unwrap().as_str(),
            "http://127.0.0.1:5000/api/jewelry/verify/CERT-1"
        );
        assert_eq!(
            client.verify_url("a/b c").unwrap().as_str(),
            "http://127.0.0.1:5000/api/jewelry/verify/a%2Fb%20c"
        );

        let nested = OriluxchainClient::new("https://orilux.example/ledger").unwrap();
        assert_eq!(
            nested.verify_url("X").unwrap().as_str(),
            "https://orilux.example/ledger/api/jewelry/verify/X"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            OriluxchainClient::new("not a url"),
            Err(OriluxchainError::InvalidConfig(_))
        ));
        assert!(matches!(
            OriluxchainClient::new("mailto:ops@veralix.com"),
            Err(OriluxchainError::InvalidConfig(_))
        ));
    }
}
