use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::billing::api;
use crate::webhooks;

pub fn api_routes() -> Router {
    Router::new()
        .route(
            "/api/businesses/:business_id/payment-methods",
            get(api::list_methods).post(api::register_method),
        )
        .route(
            "/api/businesses/:business_id/payment-methods/:customer_uid",
            delete(api::delete_method),
        )
        .route(
            "/api/businesses/:business_id/payment-methods/:customer_uid/default",
            post(api::set_default_method),
        )
        .route(
            "/api/businesses/:business_id/subscription",
            post(api::subscribe).patch(api::change_subscription),
        )
        .route(
            "/api/businesses/:business_id/subscription/pause",
            post(api::pause_subscription),
        )
        .route(
            "/api/businesses/:business_id/subscription/resume",
            post(api::resume_subscription),
        )
        .route(
            "/api/businesses/:business_id/subscription/refund",
            post(api::refund_subscription),
        )
        .route(
            "/api/businesses/:business_id/transactions",
            get(api::transaction_history),
        )
        .route("/api/webhooks/payments", post(webhooks::payment_webhook))
}
