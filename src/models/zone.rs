use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Whether a zone is keyed on whole countries or on states/provinces
/// within them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    Country,
    State,
}

impl ZoneType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "country" => Some(ZoneType::Country),
            "state" => Some(ZoneType::State),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::Country => "country",
            ZoneType::State => "state",
        }
    }
}

/// Inclusive delivery-day range for a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDays {
    pub min: i64,
    pub max: i64,
}

/// Raw zone row as stored. Location lists live in JSON TEXT columns and
/// are only parsed into typed fields through `Zone::from_row`.
#[derive(Debug, Clone, FromRow)]
pub struct ZoneRow {
    pub id: i64,
    pub name: String,
    pub zone_type: String,
    pub countries: String,
    pub states: String,
    pub cities: String,
    pub delivery_min: i64,
    pub delivery_max: i64,
    pub processing_days: i64,
    pub delivery_cost: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Typed zone model used everywhere outside the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    pub zone_type: ZoneType,
    pub countries: Vec<String>,
    pub states: Vec<String>,
    pub cities: Vec<String>,
    pub delivery_days: DeliveryDays,
    pub processing_days: i64,
    pub delivery_cost: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Zone {
    pub fn from_row(row: ZoneRow) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            zone_type: ZoneType::parse(&row.zone_type).unwrap_or(ZoneType::Country),
            countries: serde_json::from_str(&row.countries)?,
            states: serde_json::from_str(&row.states)?,
            cities: serde_json::from_str(&row.cities)?,
            delivery_days: DeliveryDays {
                min: row.delivery_min,
                max: row.delivery_max,
            },
            processing_days: row.processing_days,
            delivery_cost: row.delivery_cost,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

/// Input for creating or updating a zone
#[derive(Debug, Clone, Deserialize)]
pub struct NewZone {
    pub name: String,
    pub zone_type: ZoneType,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub cities: Vec<String>,
    pub delivery_days: DeliveryDays,
    #[serde(default = "default_processing_days")]
    pub processing_days: i64,
    #[serde(default)]
    pub delivery_cost: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_processing_days() -> i64 {
    1
}

fn default_true() -> bool {
    true
}

fn default_zone_type() -> ZoneType {
    ZoneType::Country
}

impl NewZone {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("name must not be empty".to_string());
        }
        if self.delivery_days.min < 1 || self.delivery_days.max < 1 {
            errors.push("delivery_days must be at least 1".to_string());
        }
        if self.delivery_days.min > self.delivery_days.max {
            errors.push("delivery_days min must not exceed max".to_string());
        }
        if self.zone_type == ZoneType::State && self.states.is_empty() {
            errors.push("states must not be empty for a state zone".to_string());
        }
        errors
    }
}

/// Portable zone record used by export and import. Carries every field
/// except the internal row id; import matches records to existing zones
/// by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub name: String,
    #[serde(default = "default_zone_type")]
    pub zone_type: ZoneType,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub cities: Vec<String>,
    pub delivery_days: DeliveryDays,
    #[serde(default = "default_processing_days")]
    pub processing_days: i64,
    #[serde(default)]
    pub delivery_cost: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl From<Zone> for ZoneRecord {
    fn from(zone: Zone) -> Self {
        Self {
            name: zone.name,
            zone_type: zone.zone_type,
            countries: zone.countries,
            states: zone.states,
            cities: zone.cities,
            delivery_days: zone.delivery_days,
            processing_days: zone.processing_days,
            delivery_cost: zone.delivery_cost,
            is_active: zone.is_active,
        }
    }
}

impl From<ZoneRecord> for NewZone {
    fn from(record: ZoneRecord) -> Self {
        Self {
            name: record.name,
            zone_type: record.zone_type,
            countries: record.countries,
            states: record.states,
            cities: record.cities,
            delivery_days: record.delivery_days,
            processing_days: record.processing_days,
            delivery_cost: record.delivery_cost,
            is_active: record.is_active,
        }
    }
}

/// Result of installing the canonical default zones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallReport {
    pub installed: u32,
    pub skipped: u32,
}

/// Result of a zone import. `imported` counts newly created zones,
/// `skipped` counts name-matched zones updated in place; a bad record
/// lands in `errors` without failing the whole import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: u32,
    pub skipped: u32,
    pub errors: Vec<String>,
}
