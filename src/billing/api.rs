use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::BillingError;

use super::models::{BillingScheduleEntry, PaymentMethod, PaymentTransaction, Receipt};
use super::service::BillingService;

/// key: billing-api -> response envelope for every business operation
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(err: &BillingError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            data: None,
            error: Some(ErrorBody {
                code: err.code(),
                message: err.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterMethodRequest {
    pub customer_uid: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub billing_plan: String,
    pub amount: i64,
    #[serde(default)]
    pub vat: i64,
    #[serde(default)]
    pub charge_seq: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChangeSubscriptionRequest {
    pub billing_plan: String,
    pub amount: i64,
}

/// key: billing-api -> rest handlers
pub async fn list_methods(
    Extension(service): Extension<Arc<BillingService>>,
    Path(business_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<PaymentMethod>>>, BillingError> {
    let methods = service.list_methods(&business_id).await?;
    Ok(Json(ApiResponse::ok("payment methods", methods)))
}

pub async fn register_method(
    Extension(service): Extension<Arc<BillingService>>,
    Path(business_id): Path<String>,
    Json(payload): Json<RegisterMethodRequest>,
) -> Result<Json<ApiResponse<PaymentMethod>>, BillingError> {
    let method = service
        .register_method(&business_id, &payload.customer_uid)
        .await?;
    Ok(Json(ApiResponse::ok("payment method registered", method)))
}

pub async fn delete_method(
    Extension(service): Extension<Arc<BillingService>>,
    Path((business_id, customer_uid)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>, BillingError> {
    service.delete_method(&business_id, &customer_uid).await?;
    Ok(Json(ApiResponse::ok("payment method deleted", ())))
}

pub async fn set_default_method(
    Extension(service): Extension<Arc<BillingService>>,
    Path((business_id, customer_uid)): Path<(String, String)>,
) -> Result<Json<ApiResponse<PaymentMethod>>, BillingError> {
    let method = service
        .set_default_method(&business_id, &customer_uid)
        .await?;
    Ok(Json(ApiResponse::ok("default payment method set", method)))
}

pub async fn subscribe(
    Extension(service): Extension<Arc<BillingService>>,
    Path(business_id): Path<String>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<Json<ApiResponse<Receipt>>, BillingError> {
    let receipt = service
        .subscribe(
            &business_id,
            &payload.billing_plan,
            payload.amount,
            payload.vat,
            payload.charge_seq,
        )
        .await?;
    Ok(Json(ApiResponse::ok("subscription created", receipt)))
}

pub async fn change_subscription(
    Extension(service): Extension<Arc<BillingService>>,
    Path(business_id): Path<String>,
    Json(payload): Json<ChangeSubscriptionRequest>,
) -> Result<Json<ApiResponse<BillingScheduleEntry>>, BillingError> {
    let entry = service
        .change_subscription(&business_id, &payload.billing_plan, payload.amount)
        .await?;
    Ok(Json(ApiResponse::ok("subscription changed", entry)))
}

pub async fn pause_subscription(
    Extension(service): Extension<Arc<BillingService>>,
    Path(business_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, BillingError> {
    service.pause_subscription(&business_id).await?;
    Ok(Json(ApiResponse::ok("subscription paused", ())))
}

pub async fn resume_subscription(
    Extension(service): Extension<Arc<BillingService>>,
    Path(business_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, BillingError> {
    service.resume_subscription(&business_id).await?;
    Ok(Json(ApiResponse::ok("subscription resumed", ())))
}

pub async fn refund_subscription(
    Extension(service): Extension<Arc<BillingService>>,
    Path(business_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, BillingError> {
    service.refund_subscription(&business_id).await?;
    Ok(Json(ApiResponse::ok("subscription refunded", ())))
}

pub async fn transaction_history(
    Extension(service): Extension<Arc<BillingService>>,
    Path(business_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<PaymentTransaction>>>, BillingError> {
    let history = service.transaction_history(&business_id).await?;
    Ok(Json(ApiResponse::ok("transaction history", history)))
}
