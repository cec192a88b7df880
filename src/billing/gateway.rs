use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

/// Transport-level or gateway-side submission failure. Business declines are
/// not errors at this layer; they arrive as a `failed` result status.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("gateway rejected request: {code} {message}")]
    Rejected { code: u16, message: String },
    #[error("malformed gateway response: {0}")]
    Decode(String),
}

/// key: billing-gateway -> charge submission contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// Unique per attempt.
    pub merchant_uid: String,
    pub customer_uid: String,
    pub name: String,
    pub amount: i64,
    pub cancelable_amount: i64,
    pub vat: i64,
    /// Opaque metadata blob, echoed verbatim with the confirmation.
    pub custom_data: String,
}

/// The gateway's result shape, shared by the synchronous return and the
/// out-of-band confirmation callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResult {
    pub status: String,
    pub tx_id: String,
    pub currency: String,
    pub pay_method: Option<String>,
    pub receipt_url: Option<String>,
    /// Epoch seconds of the paid/failed timestamp.
    pub paid_at: i64,
    pub custom_data: String,
    pub fail_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayStatus {
    Paid,
    Failed,
    Cancelled,
    Unrecognized(String),
}

impl GatewayResult {
    pub fn outcome(&self) -> GatewayStatus {
        match self.status.as_str() {
            "paid" => GatewayStatus::Paid,
            "failed" => GatewayStatus::Failed,
            "cancelled" => GatewayStatus::Cancelled,
            other => GatewayStatus::Unrecognized(other.to_string()),
        }
    }

    pub fn settled_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.paid_at, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<GatewayResult, GatewayError>;
}

/// key: billing-gateway-rest -> HTTP client implementation
pub struct RestGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_secret: Option<String>,
}

impl RestGateway {
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config::GATEWAY_BASE_URL.clone(),
            api_key: config::GATEWAY_API_KEY.clone(),
            api_secret: config::GATEWAY_API_SECRET.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RestGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<GatewayResult, GatewayError> {
        let url = format!("{}/charges", self.base_url.trim_end_matches('/'));
        let mut builder = self.client.post(url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }
        if let Some(secret) = &self.api_secret {
            builder = builder.header("x-api-secret", secret);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                code: status.as_u16(),
                message,
            });
        }

        response
            .json::<GatewayResult>()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))
    }
}
