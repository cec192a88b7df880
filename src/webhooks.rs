use axum::{extract::Extension, http::StatusCode, Json};

use crate::billing::{GatewayResult, ReconciliationHandle, ReconciliationJob};

/// key: webhooks-payments -> asynchronous confirmation entrypoint
///
/// The gateway delivers the same result shape here as on the synchronous
/// submission return; both paths feed the reconciliation queue identically.
pub async fn payment_webhook(
    Extension(reconciliation): Extension<ReconciliationHandle>,
    Json(payload): Json<GatewayResult>,
) -> Result<StatusCode, StatusCode> {
    reconciliation
        .dispatch(ReconciliationJob::Confirmation { result: payload })
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(StatusCode::ACCEPTED)
}
