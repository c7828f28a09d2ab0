use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One timestamped milestone in an order's delivery history. Events are
/// append-only and owned by exactly one order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrackingEvent {
    pub id: String,
    pub tracking_id: String,
    pub event_status: String,
    pub location: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TrackingEvent {
    pub fn new(
        tracking_id: &str,
        event_status: &str,
        location: &str,
        description: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tracking_id: tracking_id.to_string(),
            event_status: event_status.to_string(),
            location: location.to_string(),
            description: description.to_string(),
            timestamp,
            latitude: None,
            longitude: None,
        }
    }
}

/// JSON representation of a tracking event for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEventDto {
    pub event_status: String,
    pub location: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl From<TrackingEvent> for TrackingEventDto {
    fn from(event: TrackingEvent) -> Self {
        Self {
            event_status: event.event_status,
            location: event.location,
            description: event.description,
            timestamp: event.timestamp,
            latitude: event.latitude,
            longitude: event.longitude,
        }
    }
}
