use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::{
    BillingPlan, BillingScheduleEntry, FailureRecord, PaymentMethod, PaymentTransaction,
};

/// Document-store failures. Fatal to the individual operation, never to the
/// process; callers log and translate.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document conflict: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// key: billing-store -> payment-methods collection
#[async_trait]
pub trait PaymentMethodStore: Send + Sync {
    /// Rejects with `Conflict` when the business already holds this token.
    async fn insert(&self, method: PaymentMethod) -> StoreResult<()>;
    async fn list(&self, business_id: &str) -> StoreResult<Vec<PaymentMethod>>;
    async fn find(&self, business_id: &str, customer_uid: &str)
        -> StoreResult<Option<PaymentMethod>>;
    async fn find_default(&self, business_id: &str) -> StoreResult<Option<PaymentMethod>>;
    /// Returns whether a document was removed.
    async fn delete(&self, business_id: &str, customer_uid: &str) -> StoreResult<bool>;
    /// Atomically moves the default flag to the given method, in one swap.
    /// Returns the promoted method, or `None` when the business holds no such
    /// method. No interleaving can observe a business with zero defaults.
    async fn set_default(
        &self,
        business_id: &str,
        customer_uid: &str,
    ) -> StoreResult<Option<PaymentMethod>>;
}

/// key: billing-store -> payment-schedule collection
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Rejects with `Conflict` when the merchant uid is already scheduled.
    async fn insert(&self, entry: BillingScheduleEntry) -> StoreResult<()>;
    async fn find_by_merchant_uid(
        &self,
        merchant_uid: &str,
    ) -> StoreResult<Option<BillingScheduleEntry>>;
    /// Pending entries due at or before `cutoff`, ordered by due date.
    async fn find_due(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<BillingScheduleEntry>>;
    /// The business's latest entry still awaiting an outcome (pending or
    /// failed).
    async fn find_active(&self, business_id: &str) -> StoreResult<Option<BillingScheduleEntry>>;
    /// The business's latest failed entry, if any.
    async fn find_failed(&self, business_id: &str) -> StoreResult<Option<BillingScheduleEntry>>;
    /// Returns whether a matching entry was updated.
    async fn mark_paid(&self, merchant_uid: &str) -> StoreResult<bool>;
    /// Marks the entry failed and prepends the record, most-recent-first.
    async fn mark_failed(&self, merchant_uid: &str, failure: FailureRecord) -> StoreResult<bool>;
    /// Rewrites plan and amount for a future cycle; the due date is untouched.
    async fn update_terms(
        &self,
        merchant_uid: &str,
        plan: BillingPlan,
        amount: i64,
    ) -> StoreResult<bool>;
}

/// key: billing-store -> payment-transactions collection
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Insert keyed by the gateway transaction id. Returns `false` when a
    /// record with the same id already exists, making redelivered
    /// confirmations detectable.
    async fn insert(&self, tx: PaymentTransaction) -> StoreResult<bool>;
    /// Chronological history for a business, newest first.
    async fn history(&self, business_id: &str) -> StoreResult<Vec<PaymentTransaction>>;
}
