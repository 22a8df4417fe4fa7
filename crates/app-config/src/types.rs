use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the Kite Connect API.
    pub kite: KiteSettings,
    /// Settings for the HTTP server.
    pub server: ServerSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub instruments: InstrumentSettings,
    #[serde(default)]
    pub webhooks: WebhookSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct KiteSettings {
    /// The API key of the Kite Connect app.
    pub api_key: String,
    /// The API secret of the Kite Connect app.
    pub api_secret: String,
    /// The REST API base URL (e.g., "https://api.kite.trade").
    #[serde(default = "default_rest_base_url")]
    pub rest_base_url: String,
    /// The browser login base URL.
    #[serde(default = "default_login_base_url")]
    pub login_base_url: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Shared secret that protected endpoints expect in the `x-api-key` header.
    pub internal_api_key: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SessionSettings {
    /// Hour of day (local time) at which broker sessions lapse.
    #[serde(default = "default_expiry_cutoff_hour")]
    pub expiry_cutoff_hour: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            expiry_cutoff_hour: default_expiry_cutoff_hour(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct InstrumentSettings {
    /// How long a fetched instrument catalog stays fresh.
    #[serde(default = "default_refresh_interval_hours")]
    pub refresh_interval_hours: i64,
    /// Bare symbols that route to the INDICES pseudo-exchange.
    #[serde(default = "default_index_symbols")]
    pub index_symbols: Vec<String>,
}

impl Default for InstrumentSettings {
    fn default() -> Self {
        Self {
            refresh_interval_hours: default_refresh_interval_hours(),
            index_symbols: default_index_symbols(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct WebhookSettings {
    /// Hard per-delivery timeout for webhook notifications.
    #[serde(default = "default_delivery_timeout_secs")]
    pub delivery_timeout_secs: u64,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            delivery_timeout_secs: default_delivery_timeout_secs(),
        }
    }
}

// Helper functions for serde defaults.
fn default_rest_base_url() -> String {
    "https://api.kite.trade".to_string()
}
fn default_login_base_url() -> String {
    "https://kite.zerodha.com/connect/login".to_string()
}
fn default_expiry_cutoff_hour() -> u32 {
    6
}
fn default_refresh_interval_hours() -> i64 {
    24
}
fn default_index_symbols() -> Vec<String> {
    vec![
        "NIFTY 50".to_string(),
        "NIFTY BANK".to_string(),
        "SENSEX".to_string(),
    ]
}
fn default_delivery_timeout_secs() -> u64 {
    5
}
