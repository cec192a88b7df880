use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use tokio::sync::mpsc::{channel, Sender};
use tracing::{error, info, warn};

use crate::config;
use crate::error::BillingResult;

use super::gateway::{GatewayResult, GatewayStatus};
use super::models::{
    next_merchant_uid, BillingScheduleEntry, ChargeMetadata, FailureRecord, PaymentIntentType,
    PaymentStatus, PaymentTransaction,
};
use super::scheduler::local_midnight;
use super::store::{ScheduleStore, TransactionStore};

/// key: billing-reconciliation -> background worker for gateway confirmations
#[derive(Debug)]
pub enum ReconciliationJob {
    Confirmation { result: GatewayResult },
}

/// key: billing-reconciliation-handle -> enqueue interface
#[derive(Clone)]
pub struct ReconciliationHandle {
    sender: Sender<ReconciliationJob>,
}

impl ReconciliationHandle {
    pub async fn dispatch(&self, job: ReconciliationJob) -> Result<()> {
        self.sender
            .send(job)
            .await
            .map_err(|err| anyhow!("failed to enqueue reconciliation job: {err}"))
    }
}

/// The outcome state machine. Each invocation is independent and keyed by the
/// confirmation's status field; re-delivery of the same confirmation is
/// detected through the transaction store's gateway-tx-id key.
pub struct Reconciler {
    schedules: Arc<dyn ScheduleStore>,
    transactions: Arc<dyn TransactionStore>,
}

impl Reconciler {
    pub fn new(schedules: Arc<dyn ScheduleStore>, transactions: Arc<dyn TransactionStore>) -> Self {
        Self {
            schedules,
            transactions,
        }
    }

    pub async fn reconcile(&self, result: &GatewayResult) -> BillingResult<()> {
        match result.outcome() {
            GatewayStatus::Paid => self.apply_paid(result).await,
            GatewayStatus::Failed => self.apply_failed(result).await,
            GatewayStatus::Cancelled => {
                info!(tx_id = %result.tx_id, "cancelled confirmation acknowledged without reconciliation");
                Ok(())
            }
            GatewayStatus::Unrecognized(status) => {
                warn!(tx_id = %result.tx_id, %status, "unrecognized confirmation status, no state mutated");
                Ok(())
            }
        }
    }

    async fn apply_paid(&self, result: &GatewayResult) -> BillingResult<()> {
        let metadata = ChargeMetadata::decode(&result.custom_data)?;

        let transaction = PaymentTransaction {
            business_id: metadata.business_id.clone(),
            tx_id: result.tx_id.clone(),
            merchant_uid: metadata.merchant_uid.clone(),
            intent_type: metadata.intent_type,
            name: metadata.name.clone(),
            currency: result.currency.clone(),
            amount: metadata.amount,
            vat: metadata.vat,
            customer_uid: metadata.customer_uid.clone(),
            status: PaymentStatus::Paid,
            receipt_url: result.receipt_url.clone(),
            intended_pay_date: metadata.intended_pay_date,
            paid_at: result.settled_at(),
        };
        if !self.transactions.insert(transaction).await? {
            warn!(
                tx_id = %result.tx_id,
                merchant_uid = %metadata.merchant_uid,
                "duplicate confirmation delivery ignored"
            );
            return Ok(());
        }

        match metadata.intent_type {
            PaymentIntentType::Scheduled => {
                if !self.schedules.mark_paid(&metadata.merchant_uid).await? {
                    warn!(
                        merchant_uid = %metadata.merchant_uid,
                        "paid confirmation matched no schedule entry"
                    );
                }
            }
            PaymentIntentType::Initial => {
                if !self.schedules.mark_paid(&metadata.merchant_uid).await? {
                    warn!(
                        merchant_uid = %metadata.merchant_uid,
                        "initial confirmation matched no schedule entry"
                    );
                }
                // Activation itself belongs to the subscription collaborator.
                info!(
                    business_id = %metadata.business_id,
                    merchant_uid = %metadata.merchant_uid,
                    "initial charge confirmed, subscription activated"
                );
            }
            PaymentIntentType::Refund => {
                warn!(
                    merchant_uid = %metadata.merchant_uid,
                    "refund confirmation recorded without schedule reconciliation"
                );
                return Ok(());
            }
        }

        let next_date = local_midnight(
            metadata.intended_pay_date
                + Duration::weeks(metadata.billing_plan.cadence_weeks()),
        );
        let next_uid = next_merchant_uid(&metadata.merchant_uid)?;
        let next_entry = BillingScheduleEntry {
            merchant_uid: next_uid.clone(),
            business_id: metadata.business_id.clone(),
            schedule: next_date,
            amount: metadata.amount,
            vat: metadata.vat,
            billing_plan: metadata.billing_plan,
            status: PaymentStatus::Pending,
            failures: Vec::new(),
            created_at: Utc::now(),
        };
        // Not retried automatically; the gap surfaces in the log stream.
        if let Err(err) = self.schedules.insert(next_entry).await {
            error!(
                ?err,
                merchant_uid = %next_uid,
                schedule = %next_date,
                "failed to insert next billing cycle"
            );
        } else {
            info!(
                business_id = %metadata.business_id,
                merchant_uid = %next_uid,
                schedule = %next_date,
                "next billing cycle scheduled"
            );
        }
        Ok(())
    }

    async fn apply_failed(&self, result: &GatewayResult) -> BillingResult<()> {
        let metadata = ChargeMetadata::decode(&result.custom_data)?;
        if metadata.intent_type != PaymentIntentType::Scheduled {
            info!(
                merchant_uid = %metadata.merchant_uid,
                intent_type = ?metadata.intent_type,
                "non-recurring decline leaves the schedule untouched"
            );
            return Ok(());
        }

        let failure = FailureRecord {
            tx_id: result.tx_id.clone(),
            params: serde_json::to_value(&metadata)?,
            reason: result
                .fail_reason
                .clone()
                .unwrap_or_else(|| "gateway reported no decline reason".to_string()),
            failed_at: result.settled_at(),
        };
        if self
            .schedules
            .mark_failed(&metadata.merchant_uid, failure)
            .await?
        {
            info!(
                business_id = %metadata.business_id,
                merchant_uid = %metadata.merchant_uid,
                "declined charge recorded on schedule entry"
            );
        } else {
            warn!(
                merchant_uid = %metadata.merchant_uid,
                "failed confirmation matched no schedule entry"
            );
        }
        Ok(())
    }
}

pub fn start_reconciliation_worker(reconciler: Reconciler) -> ReconciliationHandle {
    let (tx, mut rx) = channel(*config::RECONCILIATION_QUEUE_DEPTH);
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            match job {
                ReconciliationJob::Confirmation { result } => {
                    if let Err(err) = reconciler.reconcile(&result).await {
                        error!(
                            ?err,
                            tx_id = %result.tx_id,
                            "failed to reconcile payment confirmation"
                        );
                    }
                }
            }
        }
    });

    ReconciliationHandle { sender: tx }
}
