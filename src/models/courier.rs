use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Raw courier row as stored; `settings` is a JSON TEXT column parsed
/// through `Courier::from_row`.
#[derive(Debug, Clone, FromRow)]
pub struct CourierRow {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub url_pattern: String,
    pub tracking_format: String,
    pub settings: String,
    pub is_active: bool,
}

/// Carrier definition used for auto-detection and tracking-link
/// generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Courier {
    pub id: i64,
    pub slug: String,
    pub name: String,
    /// URL template containing a literal `{tracking_id}` placeholder.
    pub url_pattern: String,
    /// Regex a tracking id must match for auto-detection.
    pub tracking_format: String,
    pub settings: BTreeMap<String, String>,
    pub is_active: bool,
}

impl Courier {
    pub fn from_row(row: CourierRow) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            url_pattern: row.url_pattern,
            tracking_format: row.tracking_format,
            settings: serde_json::from_str(&row.settings)?,
            is_active: row.is_active,
        })
    }
}

/// Input for creating or updating a courier
#[derive(Debug, Clone, Deserialize)]
pub struct NewCourier {
    pub slug: String,
    pub name: String,
    pub url_pattern: String,
    pub tracking_format: String,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl NewCourier {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.slug.trim().is_empty() {
            errors.push("slug must not be empty".to_string());
        }
        if self.name.trim().is_empty() {
            errors.push("name must not be empty".to_string());
        }
        if !self.url_pattern.contains("{tracking_id}") {
            errors.push("url_pattern must contain a {tracking_id} placeholder".to_string());
        }
        if regex::Regex::new(&self.tracking_format).is_err() {
            errors.push("tracking_format is not a valid regular expression".to_string());
        }
        errors
    }
}

/// JSON representation of a courier for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierDto {
    pub slug: String,
    pub name: String,
    pub url_pattern: String,
    pub tracking_format: String,
    pub settings: BTreeMap<String, String>,
    pub is_active: bool,
}

impl From<Courier> for CourierDto {
    fn from(courier: Courier) -> Self {
        Self {
            slug: courier.slug,
            name: courier.name,
            url_pattern: courier.url_pattern,
            tracking_format: courier.tracking_format,
            settings: courier.settings,
            is_active: courier.is_active,
        }
    }
}
