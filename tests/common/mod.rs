#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use paycycle::billing::models::METADATA_VERSION;
use paycycle::billing::{
    start_reconciliation_worker, BillingPlan, BillingScheduleEntry, BillingService,
    ChargeMetadata, ChargeRequest, GatewayError, GatewayResult, InMemoryPaymentMethodStore,
    InMemoryScheduleStore, InMemoryTransactionStore, PaymentGateway, PaymentIntentType,
    PaymentMethodStore, PaymentStatus, PaymentSubmitter, ReconciliationHandle, Reconciler,
    ScheduleStore, TransactionStore,
};

/// Gateway double scripted per merchant uid: paid by default, declined or
/// transport-failed when told so. Every request is recorded.
pub struct ScriptedGateway {
    calls: Mutex<Vec<ChargeRequest>>,
    declines: Mutex<HashMap<String, String>>,
    transport_failures: Mutex<HashMap<String, String>>,
    counter: AtomicU64,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            declines: Mutex::new(HashMap::new()),
            transport_failures: Mutex::new(HashMap::new()),
            counter: AtomicU64::new(1),
        }
    }

    pub fn decline(&self, merchant_uid: &str, reason: &str) {
        self.declines
            .lock()
            .unwrap()
            .insert(merchant_uid.to_string(), reason.to_string());
    }

    pub fn fail_transport(&self, merchant_uid: &str, reason: &str) {
        self.transport_failures
            .lock()
            .unwrap()
            .insert(merchant_uid.to_string(), reason.to_string());
    }

    pub fn calls(&self) -> Vec<ChargeRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn wait_for_call(&self, merchant_uid: &str) -> ChargeRequest {
        for _ in 0..200 {
            let found = {
                let calls = self.calls.lock().unwrap();
                calls.iter().find(|c| c.merchant_uid == merchant_uid).cloned()
            };
            if let Some(call) = found {
                return call;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("gateway never received a charge for {merchant_uid}");
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<GatewayResult, GatewayError> {
        self.calls.lock().unwrap().push(request.clone());
        if let Some(reason) = self
            .transport_failures
            .lock()
            .unwrap()
            .get(&request.merchant_uid)
        {
            return Err(GatewayError::Transport(reason.clone()));
        }
        let tx_id = format!("gw_tx_{}", self.counter.fetch_add(1, Ordering::SeqCst));
        if let Some(reason) = self.declines.lock().unwrap().get(&request.merchant_uid) {
            return Ok(GatewayResult {
                status: "failed".into(),
                tx_id,
                currency: "KRW".into(),
                pay_method: None,
                receipt_url: None,
                paid_at: Utc::now().timestamp(),
                custom_data: request.custom_data.clone(),
                fail_reason: Some(reason.clone()),
            });
        }
        Ok(GatewayResult {
            status: "paid".into(),
            receipt_url: Some(format!("https://receipts.example/{tx_id}")),
            tx_id,
            currency: "KRW".into(),
            pay_method: Some("card".into()),
            paid_at: Utc::now().timestamp(),
            custom_data: request.custom_data.clone(),
            fail_reason: None,
        })
    }
}

/// A fully wired core with the reconciliation worker running.
pub struct Harness {
    pub methods: Arc<dyn PaymentMethodStore>,
    pub schedules: Arc<dyn ScheduleStore>,
    pub transactions: Arc<dyn TransactionStore>,
    pub gateway: Arc<ScriptedGateway>,
    pub submitter: Arc<PaymentSubmitter>,
    pub service: Arc<BillingService>,
    pub reconciliation: ReconciliationHandle,
}

pub fn harness() -> Harness {
    let methods: Arc<dyn PaymentMethodStore> = Arc::new(InMemoryPaymentMethodStore::new());
    let schedules: Arc<dyn ScheduleStore> = Arc::new(InMemoryScheduleStore::new());
    let transactions: Arc<dyn TransactionStore> = Arc::new(InMemoryTransactionStore::new());
    let gateway = Arc::new(ScriptedGateway::new());
    let gateway_port: Arc<dyn PaymentGateway> = gateway.clone();

    let reconciliation =
        start_reconciliation_worker(Reconciler::new(schedules.clone(), transactions.clone()));
    let submitter = Arc::new(PaymentSubmitter::new(
        methods.clone(),
        gateway_port,
        reconciliation.clone(),
    ));
    let service = Arc::new(BillingService::new(
        methods.clone(),
        schedules.clone(),
        transactions.clone(),
        submitter.clone(),
    ));

    Harness {
        methods,
        schedules,
        transactions,
        gateway,
        submitter,
        service,
        reconciliation,
    }
}

pub fn pending_entry(
    business_id: &str,
    merchant_uid: &str,
    schedule: DateTime<Utc>,
    amount: i64,
    vat: i64,
) -> BillingScheduleEntry {
    BillingScheduleEntry {
        merchant_uid: merchant_uid.into(),
        business_id: business_id.into(),
        schedule,
        amount,
        vat,
        billing_plan: BillingPlan::FourWeek,
        status: PaymentStatus::Pending,
        failures: Vec::new(),
        created_at: Utc::now(),
    }
}

pub fn scheduled_metadata(
    business_id: &str,
    merchant_uid: &str,
    intended_pay_date: DateTime<Utc>,
    amount: i64,
    vat: i64,
) -> ChargeMetadata {
    ChargeMetadata {
        version: METADATA_VERSION,
        business_id: business_id.into(),
        merchant_uid: merchant_uid.into(),
        customer_uid: format!("cuid_{business_id}"),
        name: "recurring subscription".into(),
        intent_type: PaymentIntentType::Scheduled,
        billing_plan: BillingPlan::FourWeek,
        intended_pay_date,
        amount,
        vat,
    }
}

pub fn paid_result(
    metadata: &ChargeMetadata,
    tx_id: &str,
    settled_at: DateTime<Utc>,
) -> GatewayResult {
    GatewayResult {
        status: "paid".into(),
        tx_id: tx_id.into(),
        currency: "KRW".into(),
        pay_method: Some("card".into()),
        receipt_url: Some(format!("https://receipts.example/{tx_id}")),
        paid_at: settled_at.timestamp(),
        custom_data: metadata.encode().unwrap(),
        fail_reason: None,
    }
}

pub fn failed_result(
    metadata: &ChargeMetadata,
    tx_id: &str,
    reason: &str,
    settled_at: DateTime<Utc>,
) -> GatewayResult {
    GatewayResult {
        status: "failed".into(),
        tx_id: tx_id.into(),
        currency: "KRW".into(),
        pay_method: None,
        receipt_url: None,
        paid_at: settled_at.timestamp(),
        custom_data: metadata.encode().unwrap(),
        fail_reason: Some(reason.into()),
    }
}

pub async fn wait_for_entry(
    schedules: &Arc<dyn ScheduleStore>,
    merchant_uid: &str,
) -> BillingScheduleEntry {
    for _ in 0..200 {
        if let Some(entry) = schedules.find_by_merchant_uid(merchant_uid).await.unwrap() {
            return entry;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("schedule entry {merchant_uid} never appeared");
}

pub async fn wait_for_status(
    schedules: &Arc<dyn ScheduleStore>,
    merchant_uid: &str,
    status: PaymentStatus,
) -> BillingScheduleEntry {
    for _ in 0..200 {
        if let Some(entry) = schedules.find_by_merchant_uid(merchant_uid).await.unwrap() {
            if entry.status == status {
                return entry;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("schedule entry {merchant_uid} never reached {status:?}");
}

pub async fn wait_for_history_len(
    transactions: &Arc<dyn TransactionStore>,
    business_id: &str,
    len: usize,
) -> Vec<paycycle::billing::PaymentTransaction> {
    for _ in 0..200 {
        let history = transactions.history(business_id).await.unwrap();
        if history.len() >= len {
            return history;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("transaction history for {business_id} never reached {len} records");
}
