//! Application configuration loaded from environment variables.

use std::time::Duration;

use common::ItemId;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON log lines (default: human-readable)
/// - `DATABASE_URL`: PostgreSQL URL; unset keeps everything in memory
/// - `INVENTORY_SERVICE_URL`, `ORDERS_SERVICE_URL`, `EMAIL_SERVICE_URL`:
///   where the consume loop reaches its collaborators (default: this server)
/// - `CLIENT_TIMEOUT_MS`: per-request timeout of those calls (default: `10000`)
/// - `ORDER_TOPIC`: topic order-created events go to (default: `"order.created"`)
/// - `CONSUMER_GROUP`: consumer group of the saga (default: `"notification-worker"`)
/// - `EMAIL_LATENCY_MS`: simulated delivery time of `/send` (default: `50`)
/// - `SEED_STOCK`: `ITEM:QTY` pairs separated by commas, provisioned at
///   start-up when missing
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_json: bool,
    pub database_url: Option<String>,
    pub inventory_service_url: String,
    pub orders_service_url: String,
    pub email_service_url: String,
    pub client_timeout: Duration,
    pub order_topic: String,
    pub consumer_group: String,
    pub email_latency: Duration,
    pub seed_stock: Vec<(ItemId, i64)>,
}

const DEFAULT_SEED_STOCK: &str = "ITEM-001:100,ITEM-002:50,ITEM-003:25";

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let millis = |key: &str, default: u64| {
            Duration::from_millis(
                lookup(key)
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(default),
            )
        };

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);
        let self_url = format!("http://127.0.0.1:{port}");

        Self {
            host: var("HOST", "0.0.0.0"),
            port,
            log_level: var("RUST_LOG", "info"),
            log_json: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            inventory_service_url: var("INVENTORY_SERVICE_URL", &self_url),
            orders_service_url: var("ORDERS_SERVICE_URL", &self_url),
            email_service_url: var("EMAIL_SERVICE_URL", &self_url),
            client_timeout: millis("CLIENT_TIMEOUT_MS", 10_000),
            order_topic: var("ORDER_TOPIC", "order.created"),
            consumer_group: var("CONSUMER_GROUP", "notification-worker"),
            email_latency: millis("EMAIL_LATENCY_MS", 50),
            seed_stock: parse_seed_stock(&var("SEED_STOCK", DEFAULT_SEED_STOCK)),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Parses `ITEM:QTY,ITEM:QTY`; malformed entries are skipped.
pub fn parse_seed_stock(value: &str) -> Vec<(ItemId, i64)> {
    value
        .split(',')
        .filter_map(|entry| {
            let (item, quantity) = entry.trim().split_once(':')?;
            let item = item.trim();
            let quantity: i64 = quantity.trim().parse().ok()?;
            (!item.is_empty() && quantity >= 0).then(|| (ItemId::new(item), quantity))
        })
        .collect()
}
