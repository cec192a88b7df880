use std::sync::Arc;

use tracing::{error, info};

use crate::config;
use crate::error::{BillingError, BillingResult};

use super::gateway::{ChargeRequest, GatewayStatus, PaymentGateway};
use super::models::{ChargeMetadata, PaymentIntent, Receipt};
use super::reconciliation::{ReconciliationHandle, ReconciliationJob};
use super::store::PaymentMethodStore;

/// key: billing-submitter -> charge submission protocol
///
/// Resolves the business's default credential, embeds the full billing
/// context as roundtripped metadata, and submits the charge. Every
/// transport-successful response is handed to the reconciliation queue
/// exactly once, whether the immediate status was paid or declined, so
/// persistence has a single source of truth even when the gateway's
/// synchronous and asynchronous channels disagree.
pub struct PaymentSubmitter {
    methods: Arc<dyn PaymentMethodStore>,
    gateway: Arc<dyn PaymentGateway>,
    reconciliation: ReconciliationHandle,
}

impl PaymentSubmitter {
    pub fn new(
        methods: Arc<dyn PaymentMethodStore>,
        gateway: Arc<dyn PaymentGateway>,
        reconciliation: ReconciliationHandle,
    ) -> Self {
        Self {
            methods,
            gateway,
            reconciliation,
        }
    }

    pub async fn pay(&self, intent: &PaymentIntent) -> BillingResult<Receipt> {
        let method = self
            .methods
            .find_default(&intent.business_id)
            .await?
            .ok_or(BillingError::NoDefaultMethod)?;

        let metadata =
            ChargeMetadata::for_intent(intent, &method.customer_uid, &config::BILLING_PRODUCT_NAME);
        let request = ChargeRequest {
            merchant_uid: intent.merchant_uid.clone(),
            customer_uid: method.customer_uid.clone(),
            name: metadata.name.clone(),
            amount: intent.amount,
            cancelable_amount: intent.amount,
            vat: intent.vat,
            custom_data: metadata.encode()?,
        };

        let result = self.gateway.charge(&request).await.map_err(|source| {
            BillingError::Gateway {
                merchant_uid: intent.merchant_uid.clone(),
                amount: intent.amount,
                source,
            }
        })?;

        // One reconciliation handoff per transport-successful charge; the
        // caller's continuation never blocks on confirmation processing.
        if let Err(err) = self
            .reconciliation
            .dispatch(ReconciliationJob::Confirmation {
                result: result.clone(),
            })
            .await
        {
            error!(
                ?err,
                merchant_uid = %intent.merchant_uid,
                tx_id = %result.tx_id,
                "failed to enqueue confirmation for reconciliation"
            );
        }

        match result.outcome() {
            GatewayStatus::Failed => {
                let metadata = ChargeMetadata::decode(&result.custom_data)?;
                Err(BillingError::Declined {
                    reason: result
                        .fail_reason
                        .clone()
                        .unwrap_or_else(|| "gateway reported no decline reason".to_string()),
                    metadata: Box::new(metadata),
                })
            }
            _ => {
                info!(
                    business_id = %intent.business_id,
                    merchant_uid = %intent.merchant_uid,
                    tx_id = %result.tx_id,
                    amount = intent.amount,
                    "charge accepted by gateway"
                );
                Ok(Receipt {
                    merchant_uid: intent.merchant_uid.clone(),
                    tx_id: result.tx_id.clone(),
                    amount: intent.amount,
                    receipt_url: result.receipt_url.clone(),
                    paid_at: result.settled_at(),
                })
            }
        }
    }
}
