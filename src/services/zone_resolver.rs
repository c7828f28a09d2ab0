use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::zone::{DeliveryDays, Zone};

/// Delivery terms resolved for an address: either the first matching
/// zone or the configured system-wide default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedDelivery {
    pub zone_id: Option<i64>,
    pub zone_name: Option<String>,
    pub delivery_days: DeliveryDays,
    pub delivery_cost: f64,
    pub estimated_delivery: NaiveDate,
}

/// Resolves free-text addresses against the zone list.
///
/// Matching is deliberately permissive: case-insensitive substring
/// containment of each zone's country/state/city strings in the
/// address, first zone wins in store iteration order (ascending zone
/// id). Overlapping zones and short country codes can therefore
/// produce false positives; that is the documented policy, not a bug
/// to paper over here.
pub struct ZoneResolver {
    default_days: i64,
    default_cost: f64,
}

impl ZoneResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            default_days: config.default_delivery_days,
            default_cost: config.default_delivery_cost,
        }
    }

    /// Find the governing zone for an address, falling back to the
    /// configured default delivery terms when nothing matches.
    pub fn resolve(&self, address: &str, zones: &[Zone]) -> ResolvedDelivery {
        let needle = address.to_lowercase();

        for zone in zones.iter().filter(|z| z.is_active) {
            let lists = [&zone.countries, &zone.states, &zone.cities];
            let matched = lists
                .iter()
                .any(|list| list.iter().any(|loc| contains_location(&needle, loc)));
            if matched {
                return ResolvedDelivery {
                    zone_id: Some(zone.id),
                    zone_name: Some(zone.name.clone()),
                    delivery_days: zone.delivery_days,
                    delivery_cost: zone.delivery_cost,
                    estimated_delivery: calculate_estimated_delivery(zone.delivery_days.max),
                };
            }
        }

        ResolvedDelivery {
            zone_id: None,
            zone_name: None,
            delivery_days: DeliveryDays {
                min: self.default_days,
                max: self.default_days,
            },
            delivery_cost: self.default_cost,
            estimated_delivery: calculate_estimated_delivery(self.default_days),
        }
    }
}

fn contains_location(address_lower: &str, location: &str) -> bool {
    let location = location.trim().to_lowercase();
    !location.is_empty() && address_lower.contains(&location)
}

/// Today plus `days` calendar days; weekends and holidays count.
pub fn calculate_estimated_delivery(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}
