use std::env;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Delivery days used when no zone matches an address.
    pub default_delivery_days: i64,
    /// Delivery cost used when no zone matches an address.
    pub default_delivery_cost: f64,
    /// Hours that must pass since the newest tracking event before
    /// auto-update advances an order to the next stage.
    pub auto_update_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://delivery_tracking.db".to_string()),
            default_delivery_days: env::var("DEFAULT_DELIVERY_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .unwrap_or(7),
            default_delivery_cost: env::var("DEFAULT_DELIVERY_COST")
                .unwrap_or_else(|_| "9.99".to_string())
                .parse()
                .unwrap_or(9.99),
            auto_update_hours: env::var("AUTO_UPDATE_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .unwrap_or(24),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: "sqlite://delivery_tracking.db".to_string(),
            default_delivery_days: 7,
            default_delivery_cost: 9.99,
            auto_update_hours: 24,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,
}
