use std::net::SocketAddr;
use std::sync::Arc;

use axum::Extension;
use tracing_subscriber::{fmt, EnvFilter};

use paycycle::billing::{
    scheduler, start_reconciliation_worker, BillingService, InMemoryPaymentMethodStore,
    InMemoryScheduleStore, InMemoryTransactionStore, PaymentGateway, PaymentMethodStore,
    PaymentSubmitter, Reconciler, RestGateway, ScheduleStore, TransactionStore,
};
use paycycle::{config, routes};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    dotenvy::dotenv().ok();

    // Collaborators are built here and injected; nothing holds a process-wide
    // singleton.
    let methods: Arc<dyn PaymentMethodStore> = Arc::new(InMemoryPaymentMethodStore::new());
    let schedules: Arc<dyn ScheduleStore> = Arc::new(InMemoryScheduleStore::new());
    let transactions: Arc<dyn TransactionStore> = Arc::new(InMemoryTransactionStore::new());
    let gateway: Arc<dyn PaymentGateway> = Arc::new(RestGateway::from_env());

    let reconciliation =
        start_reconciliation_worker(Reconciler::new(schedules.clone(), transactions.clone()));
    let submitter = Arc::new(PaymentSubmitter::new(
        methods.clone(),
        gateway,
        reconciliation.clone(),
    ));
    scheduler::spawn(schedules.clone(), submitter.clone());

    let service = Arc::new(BillingService::new(
        methods,
        schedules,
        transactions,
        submitter,
    ));

    let app = routes::api_routes()
        .layer(Extension(service))
        .layer(Extension(reconciliation));

    let addr: SocketAddr =
        format!("{}:{}", config::BIND_ADDRESS.as_str(), *config::BIND_PORT).parse()?;
    tracing::info!(%addr, "listening for incoming connections");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
