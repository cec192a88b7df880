use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::billing::api::ApiResponse;
use crate::billing::gateway::GatewayError;
use crate::billing::models::ChargeMetadata;
use crate::billing::store::StoreError;

/// key: billing-errors -> operation failure taxonomy
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unknown billing plan `{0}`")]
    InvalidPlan(String),
    #[error("no default payment method registered")]
    NoDefaultMethod,
    #[error("no pending or failed schedule entry")]
    NoActiveSchedule,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("charge declined: {reason}")]
    Declined {
        reason: String,
        metadata: Box<ChargeMetadata>,
    },
    #[error("gateway charge failed for {merchant_uid} ({amount}): {source}")]
    Gateway {
        merchant_uid: String,
        amount: i64,
        #[source]
        source: GatewayError,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("confirmation metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

impl BillingError {
    /// Stable error code carried in the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            BillingError::Validation(_) => "validation_error",
            BillingError::InvalidPlan(_) => "invalid_plan",
            BillingError::NoDefaultMethod => "no_default_method",
            BillingError::NoActiveSchedule => "no_active_schedule",
            BillingError::NotFound(_) => "not_found",
            BillingError::Declined { .. } => "payment_declined",
            BillingError::Gateway { .. } => "gateway_error",
            BillingError::Store(_) => "store_error",
            BillingError::Metadata(_) => "metadata_error",
            BillingError::NotImplemented(_) => "not_implemented",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            BillingError::Validation(_) | BillingError::InvalidPlan(_) => StatusCode::BAD_REQUEST,
            BillingError::NoDefaultMethod
            | BillingError::NoActiveSchedule
            | BillingError::NotFound(_) => StatusCode::NOT_FOUND,
            BillingError::Declined { .. } => StatusCode::PAYMENT_REQUIRED,
            BillingError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            BillingError::Store(_) | BillingError::Metadata(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            BillingError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        tracing::error!(code = self.code(), error = %self, "billing operation failed");
        (self.status(), Json(ApiResponse::<()>::failure(&self))).into_response()
    }
}

pub type BillingResult<T> = Result<T, BillingError>;
