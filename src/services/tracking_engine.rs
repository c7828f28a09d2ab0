use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{order::OrderStatus, tracking_event::TrackingEvent};

/// Canned checkpoint locations, one slot per pipeline position. The
/// final delivery stage shares the last slot; anything outside the
/// pipeline reads "Unknown".
const STAGE_LOCATIONS: [&str; 6] = [
    "Processing Center",
    "Distribution Hub",
    "Regional Facility",
    "Local Depot",
    "Delivery Station",
    "Customer Address",
];

/// Display metadata for a status, served to admin UIs.
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub status: OrderStatus,
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub step: u8,
    pub progress: u8,
}

/// Display metadata for a status. Unknown status strings resolve to
/// `Processing` and therefore get its metadata.
pub fn status_info(status: OrderStatus) -> StatusInfo {
    let (label, color, icon) = match status {
        OrderStatus::Processing => ("Processing", "#f0ad4e", "hourglass"),
        OrderStatus::Confirmed => ("Confirmed", "#5bc0de", "check-circle"),
        OrderStatus::Packed => ("Packed", "#5bc0de", "box"),
        OrderStatus::Shipped => ("Shipped", "#0275d8", "truck-loading"),
        OrderStatus::InTransit => ("In Transit", "#0275d8", "truck"),
        OrderStatus::OutForDelivery => ("Out for Delivery", "#5cb85c", "shipping-fast"),
        OrderStatus::Delivered => ("Delivered", "#5cb85c", "check-double"),
        OrderStatus::Failed => ("Delivery Failed", "#d9534f", "exclamation-triangle"),
        OrderStatus::Returned => ("Returned", "#d9534f", "undo"),
    };
    StatusInfo {
        status,
        label,
        color,
        icon,
        step: status.step().unwrap_or(0),
        progress: status.progress(),
    }
}

fn stage_location(status: OrderStatus) -> &'static str {
    match status.step() {
        Some(7) => "Customer Address",
        Some(step) => STAGE_LOCATIONS
            .get(step as usize - 1)
            .copied()
            .unwrap_or("Unknown"),
        None => "Unknown",
    }
}

fn stage_description(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Processing => "Order received and is being processed",
        OrderStatus::Confirmed => "Order confirmed and queued for packing",
        OrderStatus::Packed => "Package packed and ready for dispatch",
        OrderStatus::Shipped => "Package shipped from origin facility",
        OrderStatus::InTransit => "Package in transit to destination region",
        OrderStatus::OutForDelivery => "Package out for delivery",
        OrderStatus::Delivered => "Package delivered to recipient",
        OrderStatus::Failed => "Delivery attempt failed",
        OrderStatus::Returned => "Package returned to sender",
    }
}

/// Synthesize the historical event timeline for an order at `status`.
///
/// Pipeline statuses get one event per stage from `processing` up to
/// and including the current stage, spaced one day apart walking
/// backward from `now`, oldest first. The failure states get exactly
/// one event at their own stage.
pub fn generate_events(
    tracking_id: &str,
    status: OrderStatus,
    now: DateTime<Utc>,
) -> Vec<TrackingEvent> {
    let Some(current_step) = status.step() else {
        return vec![TrackingEvent::new(
            tracking_id,
            status.as_str(),
            stage_location(status),
            stage_description(status),
            now,
        )];
    };

    OrderStatus::PIPELINE[..current_step as usize]
        .iter()
        .map(|stage| {
            let age = i64::from(current_step - stage.step().unwrap_or(current_step));
            TrackingEvent::new(
                tracking_id,
                stage.as_str(),
                stage_location(*stage),
                stage_description(*stage),
                now - Duration::days(age),
            )
        })
        .collect()
}

/// Events for the stages strictly after `from` up to and including
/// `to`, anchored at `now`. Used when an admin edit jumps an order
/// forward past intermediate stages.
///
/// `after` is the timestamp of the order's newest existing event; the
/// filled stages must extend the history, so they use one-day spacing
/// only when the gap since `after` allows it and are otherwise
/// squeezed evenly into that gap.
pub fn generate_events_between(
    tracking_id: &str,
    from: OrderStatus,
    to: OrderStatus,
    after: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<TrackingEvent> {
    let (Some(from_step), Some(to_step)) = (from.step(), to.step()) else {
        return vec![TrackingEvent::new(
            tracking_id,
            to.as_str(),
            stage_location(to),
            stage_description(to),
            now,
        )];
    };
    if to_step <= from_step {
        return Vec::new();
    }

    let count = i32::from(to_step - from_step);
    let day = Duration::days(1);
    let gap = now - after;
    let step = if gap >= day * count {
        day
    } else {
        // Keep the steps non-zero so the filled stages stay distinct
        // and ordered even when the jump happens moments after the
        // last event.
        (gap / (count + 1)).max(Duration::microseconds(1))
    };

    OrderStatus::PIPELINE[from_step as usize..to_step as usize]
        .iter()
        .map(|stage| {
            let age = i32::from(to_step - stage.step().unwrap_or(to_step));
            TrackingEvent::new(
                tracking_id,
                stage.as_str(),
                stage_location(*stage),
                stage_description(*stage),
                now - step * age,
            )
        })
        .collect()
}

/// Pipeline-based delivery estimate: one day per remaining stage after
/// the next one, never less than one day. `days_from_now` only applies
/// to the failure states, which have no pipeline position.
pub fn estimated_delivery(status: OrderStatus, days_from_now: i64) -> NaiveDate {
    let days = match status.step() {
        Some(step) => (7 - i64::from(step) - 1).max(1),
        None => days_from_now,
    };
    Utc::now().date_naive() + Duration::days(days)
}

#[cfg(test)]
mod tracking_engine_tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_generate_events_for_packed_returns_three_oldest_first() {
        let now = Utc::now();
        let events = generate_events("DT0000000001", OrderStatus::Packed, now);

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_status, "processing");
        assert_eq!(events[1].event_status, "confirmed");
        assert_eq!(events[2].event_status, "packed");
        assert!(events[0].timestamp < events[1].timestamp);
        assert!(events[1].timestamp < events[2].timestamp);
        assert_eq!(events[2].timestamp, now);
        assert_eq!(events[0].timestamp, now - Duration::days(2));
    }

    #[test]
    fn test_generate_events_for_failed_is_a_single_event() {
        let now = Utc::now();
        let events = generate_events("DT0000000001", OrderStatus::Failed, now);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_status, "failed");
        assert_eq!(events[0].location, "Unknown");
        assert_eq!(OrderStatus::parse(&events[0].event_status).progress(), 0);
    }

    #[test]
    fn test_generate_events_for_delivered_covers_whole_pipeline() {
        let events = generate_events("DT0000000001", OrderStatus::Delivered, Utc::now());

        assert_eq!(events.len(), 7);
        assert_eq!(events[6].event_status, "delivered");
        assert_eq!(events[6].location, "Customer Address");
        assert_eq!(events[0].location, "Processing Center");
    }

    #[test]
    fn test_generate_events_between_fills_skipped_stages() {
        let now = Utc::now();
        let after = now - Duration::days(10);
        let events = generate_events_between(
            "DT0000000001",
            OrderStatus::Confirmed,
            OrderStatus::InTransit,
            after,
            now,
        );

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_status, "packed");
        assert_eq!(events[1].event_status, "shipped");
        assert_eq!(events[2].event_status, "in_transit");
        assert_eq!(events[2].timestamp, now);
        assert_eq!(events[0].timestamp, now - Duration::days(2));
    }

    #[test]
    fn test_generate_events_between_stays_after_existing_history() {
        // The newest existing event is two hours old; a one-day-per-
        // stage backdate would land the filled stages before it, so
        // they get squeezed into the two-hour gap instead.
        let now = Utc::now();
        let after = now - Duration::hours(2);
        let events = generate_events_between(
            "DT0000000001",
            OrderStatus::Confirmed,
            OrderStatus::InTransit,
            after,
            now,
        );

        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.timestamp > after));
        assert!(events[0].timestamp < events[1].timestamp);
        assert!(events[1].timestamp < events[2].timestamp);
        assert_eq!(events[2].timestamp, now);
    }

    #[test]
    fn test_generate_events_between_is_empty_when_not_moving_forward() {
        let now = Utc::now();
        let after = now - Duration::days(1);
        assert!(
            generate_events_between("DT1", OrderStatus::Shipped, OrderStatus::Shipped, after, now)
                .is_empty()
        );
        assert!(
            generate_events_between("DT1", OrderStatus::Shipped, OrderStatus::Packed, after, now)
                .is_empty()
        );
    }

    #[test]
    fn test_estimated_delivery_follows_remaining_stages() {
        let today = Utc::now().date_naive();
        assert_eq!(
            estimated_delivery(OrderStatus::Processing, 3),
            today + Duration::days(5)
        );
        assert_eq!(
            estimated_delivery(OrderStatus::InTransit, 3),
            today + Duration::days(1)
        );
        // Out-for-delivery and delivered both floor at one day.
        assert_eq!(
            estimated_delivery(OrderStatus::OutForDelivery, 3),
            today + Duration::days(1)
        );
        assert_eq!(
            estimated_delivery(OrderStatus::Delivered, 3),
            today + Duration::days(1)
        );
        // Failure states have no pipeline position, the caller default applies.
        assert_eq!(
            estimated_delivery(OrderStatus::Failed, 3),
            today + Duration::days(3)
        );
    }

    #[test]
    fn test_status_info_unknown_string_gets_processing_metadata() {
        let info = status_info(OrderStatus::parse("definitely-not-a-status"));
        assert_eq!(info.label, "Processing");
        assert_eq!(info.step, 1);
        assert_eq!(info.progress, 10);
    }
}
