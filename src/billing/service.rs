use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{BillingError, BillingResult};

use super::models::{
    self, BillingPlan, BillingScheduleEntry, PaymentIntent, PaymentIntentType, PaymentMethod,
    PaymentStatus, PaymentTransaction, Receipt,
};
use super::scheduler::local_midnight;
use super::store::{PaymentMethodStore, ScheduleStore, TransactionStore};
use super::submitter::PaymentSubmitter;

/// key: billing-service -> subscription lifecycle and method management
pub struct BillingService {
    methods: Arc<dyn PaymentMethodStore>,
    schedules: Arc<dyn ScheduleStore>,
    transactions: Arc<dyn TransactionStore>,
    submitter: Arc<PaymentSubmitter>,
}

impl BillingService {
    pub fn new(
        methods: Arc<dyn PaymentMethodStore>,
        schedules: Arc<dyn ScheduleStore>,
        transactions: Arc<dyn TransactionStore>,
        submitter: Arc<PaymentSubmitter>,
    ) -> Self {
        Self {
            methods,
            schedules,
            transactions,
            submitter,
        }
    }

    /// Creates the first billing cycle and submits its initial charge with
    /// today's date. The reconciler settles the entry and schedules the next
    /// cycle once the confirmation arrives.
    pub async fn subscribe(
        &self,
        business_id: &str,
        plan_code: &str,
        amount: i64,
        vat: i64,
        charge_seq: u32,
    ) -> BillingResult<Receipt> {
        let plan = BillingPlan::from_code(plan_code)?;
        if amount <= 0 {
            return Err(BillingError::Validation(format!(
                "charge amount must be positive, got {amount}"
            )));
        }
        let merchant_uid = models::merchant_uid(business_id, charge_seq);
        let now = Utc::now();

        self.schedules
            .insert(BillingScheduleEntry {
                merchant_uid: merchant_uid.clone(),
                business_id: business_id.to_string(),
                schedule: local_midnight(now),
                amount,
                vat,
                billing_plan: plan,
                status: PaymentStatus::Pending,
                failures: Vec::new(),
                created_at: now,
            })
            .await?;

        let intent = PaymentIntent {
            business_id: business_id.to_string(),
            merchant_uid,
            intent_type: PaymentIntentType::Initial,
            billing_plan: plan,
            intended_pay_date: now,
            amount,
            vat,
        };
        self.submitter.pay(&intent).await
    }

    /// Rewrites plan and amount on the in-flight cycle; future cycles inherit
    /// the new terms through the reconciler. The due date is untouched.
    pub async fn change_subscription(
        &self,
        business_id: &str,
        plan_code: &str,
        amount: i64,
    ) -> BillingResult<BillingScheduleEntry> {
        let plan = BillingPlan::from_code(plan_code)?;
        let entry = self
            .schedules
            .find_active(business_id)
            .await?
            .ok_or(BillingError::NoActiveSchedule)?;
        if !self
            .schedules
            .update_terms(&entry.merchant_uid, plan, amount)
            .await?
        {
            return Err(BillingError::NoActiveSchedule);
        }
        info!(
            %business_id,
            merchant_uid = %entry.merchant_uid,
            plan = plan.code(),
            amount,
            "subscription terms changed"
        );
        self.schedules
            .find_by_merchant_uid(&entry.merchant_uid)
            .await?
            .ok_or(BillingError::NotFound("schedule entry"))
    }

    pub async fn pause_subscription(&self, _business_id: &str) -> BillingResult<()> {
        Err(BillingError::NotImplemented("subscription pause"))
    }

    pub async fn resume_subscription(&self, _business_id: &str) -> BillingResult<()> {
        Err(BillingError::NotImplemented("subscription resume"))
    }

    pub async fn refund_subscription(&self, _business_id: &str) -> BillingResult<()> {
        Err(BillingError::NotImplemented("subscription refund"))
    }

    /// Stores a gateway-issued credential token. The business's first method
    /// becomes its default.
    pub async fn register_method(
        &self,
        business_id: &str,
        customer_uid: &str,
    ) -> BillingResult<PaymentMethod> {
        validate_customer_uid(customer_uid)?;
        let default_method = self.methods.find_default(business_id).await?.is_none();
        let method = PaymentMethod {
            business_id: business_id.to_string(),
            customer_uid: customer_uid.to_string(),
            default_method,
            created_at: Utc::now(),
        };
        self.methods.insert(method.clone()).await?;
        info!(%business_id, %customer_uid, default_method, "payment method registered");
        Ok(method)
    }

    pub async fn list_methods(&self, business_id: &str) -> BillingResult<Vec<PaymentMethod>> {
        Ok(self.methods.list(business_id).await?)
    }

    pub async fn delete_method(&self, business_id: &str, customer_uid: &str) -> BillingResult<()> {
        if !self.methods.delete(business_id, customer_uid).await? {
            return Err(BillingError::NotFound("payment method"));
        }
        info!(%business_id, %customer_uid, "payment method deleted");
        Ok(())
    }

    /// Swaps the default credential and, when the business carries a failed
    /// cycle, immediately resubmits it dated today. This resubmission is the
    /// only retry path for declined recurring charges; its outcome is not
    /// surfaced to the caller.
    pub async fn set_default_method(
        &self,
        business_id: &str,
        customer_uid: &str,
    ) -> BillingResult<PaymentMethod> {
        let method = self
            .methods
            .set_default(business_id, customer_uid)
            .await?
            .ok_or(BillingError::NotFound("payment method"))?;
        info!(%business_id, %customer_uid, "default payment method changed");

        if let Some(failed) = self.schedules.find_failed(business_id).await? {
            let submitter = self.submitter.clone();
            let intent = PaymentIntent {
                business_id: failed.business_id.clone(),
                merchant_uid: failed.merchant_uid.clone(),
                intent_type: PaymentIntentType::Scheduled,
                billing_plan: failed.billing_plan,
                intended_pay_date: Utc::now(),
                amount: failed.amount,
                vat: failed.vat,
            };
            tokio::spawn(async move {
                match submitter.pay(&intent).await {
                    Ok(receipt) => info!(
                        merchant_uid = %intent.merchant_uid,
                        tx_id = %receipt.tx_id,
                        "failed cycle resubmitted after default method change"
                    ),
                    Err(err) => warn!(
                        merchant_uid = %intent.merchant_uid,
                        error = %err,
                        "resubmission after default method change declined"
                    ),
                }
            });
        }

        Ok(method)
    }

    pub async fn transaction_history(
        &self,
        business_id: &str,
    ) -> BillingResult<Vec<PaymentTransaction>> {
        Ok(self.transactions.history(business_id).await?)
    }
}

/// The credential token is derived from the card number by the gateway; a
/// malformed one is rejected before any external call.
fn validate_customer_uid(customer_uid: &str) -> BillingResult<()> {
    if customer_uid.is_empty() || customer_uid.len() > 80 {
        return Err(BillingError::Validation(
            "customer uid must be between 1 and 80 characters".to_string(),
        ));
    }
    if !customer_uid
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(BillingError::Validation(format!(
            "customer uid `{customer_uid}` contains invalid characters"
        )));
    }
    Ok(())
}
