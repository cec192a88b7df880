use once_cell::sync::Lazy;

/// Address the HTTP server should bind to. Defaults to `0.0.0.0`.
pub static BIND_ADDRESS: Lazy<String> =
    Lazy::new(|| std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string()));

/// Port the HTTP server should listen on. Defaults to `3000`.
pub static BIND_PORT: Lazy<u16> = Lazy::new(|| {
    std::env::var("BIND_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3000)
});

/// key: billing-config -> local hour of the daily due-charge scan
pub static BILLING_SCAN_HOUR: Lazy<u32> = Lazy::new(|| {
    std::env::var("BILLING_SCAN_HOUR")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value < 24)
        .unwrap_or(6)
});

/// key: billing-config -> business timezone as a fixed UTC offset
pub static BILLING_UTC_OFFSET_HOURS: Lazy<i32> = Lazy::new(|| {
    std::env::var("BILLING_UTC_OFFSET_HOURS")
        .ok()
        .and_then(|value| value.parse::<i32>().ok())
        .filter(|value| (-12..=14).contains(value))
        .unwrap_or(9)
});

/// Display name stamped on charge requests and transaction records.
pub static BILLING_PRODUCT_NAME: Lazy<String> = Lazy::new(|| {
    std::env::var("BILLING_PRODUCT_NAME").unwrap_or_else(|_| "recurring subscription".to_string())
});

/// Depth of the confirmation reconciliation queue.
pub static RECONCILIATION_QUEUE_DEPTH: Lazy<usize> = Lazy::new(|| {
    std::env::var("RECONCILIATION_QUEUE_DEPTH")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(64)
});

/// Base URL of the payment gateway's REST API.
pub static GATEWAY_BASE_URL: Lazy<String> = Lazy::new(|| {
    std::env::var("GATEWAY_BASE_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "http://127.0.0.1:8808".to_string())
});

/// Optional API key presented to the gateway.
pub static GATEWAY_API_KEY: Lazy<Option<String>> = Lazy::new(|| read_optional_env("GATEWAY_API_KEY"));

/// Optional API secret presented to the gateway.
pub static GATEWAY_API_SECRET: Lazy<Option<String>> =
    Lazy::new(|| read_optional_env("GATEWAY_API_SECRET"));

fn read_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
