use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::models::{
    BillingPlan, BillingScheduleEntry, FailureRecord, PaymentMethod, PaymentStatus,
    PaymentTransaction,
};
use super::store::{
    PaymentMethodStore, ScheduleStore, StoreError, StoreResult, TransactionStore,
};

/// key: billing-store-memory -> default engine behind the collection ports
///
/// Thread-safe in-memory collections guarded by `Arc<RwLock<..>>`. Every
/// multi-step mutation (the default-method swap, failure prepending) runs
/// under a single write guard, so readers never observe intermediate states.
#[derive(Default, Clone)]
pub struct InMemoryPaymentMethodStore {
    methods: Arc<RwLock<Vec<PaymentMethod>>>,
}

impl InMemoryPaymentMethodStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentMethodStore for InMemoryPaymentMethodStore {
    async fn insert(&self, method: PaymentMethod) -> StoreResult<()> {
        let mut methods = self.methods.write().await;
        if methods
            .iter()
            .any(|m| m.business_id == method.business_id && m.customer_uid == method.customer_uid)
        {
            return Err(StoreError::Conflict(format!(
                "payment method {} already registered for {}",
                method.customer_uid, method.business_id
            )));
        }
        methods.push(method);
        Ok(())
    }

    async fn list(&self, business_id: &str) -> StoreResult<Vec<PaymentMethod>> {
        let methods = self.methods.read().await;
        Ok(methods
            .iter()
            .filter(|m| m.business_id == business_id)
            .cloned()
            .collect())
    }

    async fn find(
        &self,
        business_id: &str,
        customer_uid: &str,
    ) -> StoreResult<Option<PaymentMethod>> {
        let methods = self.methods.read().await;
        Ok(methods
            .iter()
            .find(|m| m.business_id == business_id && m.customer_uid == customer_uid)
            .cloned())
    }

    async fn find_default(&self, business_id: &str) -> StoreResult<Option<PaymentMethod>> {
        let methods = self.methods.read().await;
        Ok(methods
            .iter()
            .find(|m| m.business_id == business_id && m.default_method)
            .cloned())
    }

    async fn delete(&self, business_id: &str, customer_uid: &str) -> StoreResult<bool> {
        let mut methods = self.methods.write().await;
        let before = methods.len();
        methods.retain(|m| !(m.business_id == business_id && m.customer_uid == customer_uid));
        Ok(methods.len() < before)
    }

    async fn set_default(
        &self,
        business_id: &str,
        customer_uid: &str,
    ) -> StoreResult<Option<PaymentMethod>> {
        let mut methods = self.methods.write().await;
        if !methods
            .iter()
            .any(|m| m.business_id == business_id && m.customer_uid == customer_uid)
        {
            return Ok(None);
        }
        let mut promoted = None;
        for method in methods.iter_mut().filter(|m| m.business_id == business_id) {
            method.default_method = method.customer_uid == customer_uid;
            if method.default_method {
                promoted = Some(method.clone());
            }
        }
        Ok(promoted)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryScheduleStore {
    entries: Arc<RwLock<HashMap<String, BillingScheduleEntry>>>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn insert(&self, entry: BillingScheduleEntry) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&entry.merchant_uid) {
            return Err(StoreError::Conflict(format!(
                "schedule entry {} already exists",
                entry.merchant_uid
            )));
        }
        entries.insert(entry.merchant_uid.clone(), entry);
        Ok(())
    }

    async fn find_by_merchant_uid(
        &self,
        merchant_uid: &str,
    ) -> StoreResult<Option<BillingScheduleEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(merchant_uid).cloned())
    }

    async fn find_due(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<BillingScheduleEntry>> {
        let entries = self.entries.read().await;
        let mut due: Vec<_> = entries
            .values()
            .filter(|e| e.status == PaymentStatus::Pending && e.schedule <= cutoff)
            .cloned()
            .collect();
        due.sort_by_key(|e| e.schedule);
        Ok(due)
    }

    async fn find_active(&self, business_id: &str) -> StoreResult<Option<BillingScheduleEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .filter(|e| {
                e.business_id == business_id
                    && matches!(e.status, PaymentStatus::Pending | PaymentStatus::Failed)
            })
            .max_by_key(|e| e.schedule)
            .cloned())
    }

    async fn find_failed(&self, business_id: &str) -> StoreResult<Option<BillingScheduleEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .filter(|e| e.business_id == business_id && e.status == PaymentStatus::Failed)
            .max_by_key(|e| e.schedule)
            .cloned())
    }

    async fn mark_paid(&self, merchant_uid: &str) -> StoreResult<bool> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(merchant_uid) {
            Some(entry) => {
                entry.status = PaymentStatus::Paid;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_failed(&self, merchant_uid: &str, failure: FailureRecord) -> StoreResult<bool> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(merchant_uid) {
            Some(entry) => {
                entry.status = PaymentStatus::Failed;
                entry.failures.insert(0, failure);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_terms(
        &self,
        merchant_uid: &str,
        plan: BillingPlan,
        amount: i64,
    ) -> StoreResult<bool> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(merchant_uid) {
            Some(entry) => {
                entry.billing_plan = plan;
                entry.amount = amount;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<String, PaymentTransaction>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, tx: PaymentTransaction) -> StoreResult<bool> {
        let mut transactions = self.transactions.write().await;
        if transactions.contains_key(&tx.tx_id) {
            return Ok(false);
        }
        transactions.insert(tx.tx_id.clone(), tx);
        Ok(true)
    }

    async fn history(&self, business_id: &str) -> StoreResult<Vec<PaymentTransaction>> {
        let transactions = self.transactions.read().await;
        let mut history: Vec<_> = transactions
            .values()
            .filter(|t| t.business_id == business_id)
            .cloned()
            .collect();
        // paid_at has second resolution; the intended date breaks ties
        history.sort_by(|a, b| {
            (b.paid_at, b.intended_pay_date).cmp(&(a.paid_at, a.intended_pay_date))
        });
        Ok(history)
    }
}
