pub mod api;
pub mod gateway;
pub mod memory;
pub mod models;
pub mod reconciliation;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod submitter;

pub use gateway::{
    ChargeRequest, GatewayError, GatewayResult, GatewayStatus, PaymentGateway, RestGateway,
};
pub use memory::{InMemoryPaymentMethodStore, InMemoryScheduleStore, InMemoryTransactionStore};
pub use models::{
    merchant_uid, next_merchant_uid, BillingPlan, BillingScheduleEntry, ChargeMetadata,
    FailureRecord, PaymentIntent, PaymentIntentType, PaymentMethod, PaymentStatus,
    PaymentTransaction, Receipt,
};
pub use reconciliation::{
    start_reconciliation_worker, ReconciliationHandle, ReconciliationJob, Reconciler,
};
pub use scheduler::{
    scan_and_process, spawn as spawn_billing_scheduler, ScanSummary,
};
pub use service::BillingService;
pub use store::{PaymentMethodStore, ScheduleStore, StoreError, TransactionStore};
pub use submitter::PaymentSubmitter;
