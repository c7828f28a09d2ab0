use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Order status pipeline. Seven ordered stages plus two absorbing
/// failure states reachable from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Processing,
    Confirmed,
    Packed,
    Shipped,
    InTransit,
    OutForDelivery,
    Delivered,
    Failed,
    Returned,
}

impl OrderStatus {
    /// The seven pipeline stages in order, oldest first.
    pub const PIPELINE: [OrderStatus; 7] = [
        OrderStatus::Processing,
        OrderStatus::Confirmed,
        OrderStatus::Packed,
        OrderStatus::Shipped,
        OrderStatus::InTransit,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    /// Parse a status string. Unknown strings fall back to `Processing`
    /// rather than failing; callers that need strict validation check
    /// the input against `as_str` round trips themselves.
    pub fn parse(s: &str) -> Self {
        match s {
            "processing" => OrderStatus::Processing,
            "confirmed" => OrderStatus::Confirmed,
            "packed" => OrderStatus::Packed,
            "shipped" => OrderStatus::Shipped,
            "in_transit" => OrderStatus::InTransit,
            "out_for_delivery" => OrderStatus::OutForDelivery,
            "delivered" => OrderStatus::Delivered,
            "failed" => OrderStatus::Failed,
            "returned" => OrderStatus::Returned,
            _ => OrderStatus::Processing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "processing",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Packed => "packed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Failed => "failed",
            OrderStatus::Returned => "returned",
        }
    }

    /// 1-based position in the pipeline, `None` for the failure states.
    pub fn step(&self) -> Option<u8> {
        match self {
            OrderStatus::Processing => Some(1),
            OrderStatus::Confirmed => Some(2),
            OrderStatus::Packed => Some(3),
            OrderStatus::Shipped => Some(4),
            OrderStatus::InTransit => Some(5),
            OrderStatus::OutForDelivery => Some(6),
            OrderStatus::Delivered => Some(7),
            OrderStatus::Failed | OrderStatus::Returned => None,
        }
    }

    /// Fixed progress percentage for each stage.
    pub fn progress(&self) -> u8 {
        match self {
            OrderStatus::Processing => 10,
            OrderStatus::Confirmed => 20,
            OrderStatus::Packed => 35,
            OrderStatus::Shipped => 50,
            OrderStatus::InTransit => 70,
            OrderStatus::OutForDelivery => 90,
            OrderStatus::Delivered => 100,
            OrderStatus::Failed | OrderStatus::Returned => 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Failed | OrderStatus::Returned
        )
    }

    /// Next pipeline stage, `None` once delivered or in a failure state.
    pub fn next(&self) -> Option<OrderStatus> {
        let step = self.step()?;
        OrderStatus::PIPELINE.get(step as usize).copied()
    }
}

/// Database order model
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub tracking_id: String,
    pub order_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub location: String,
    pub status: String,
    pub carrier: String,
    pub real_tracking_id: Option<String>,
    pub estimated_delivery: NaiveDate,
    pub progress: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn order_status(&self) -> OrderStatus {
        OrderStatus::parse(&self.status)
    }
}

/// Input for creating an order
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub order_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub location: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub real_tracking_id: Option<String>,
}

impl NewOrder {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.order_id.trim().is_empty() {
            errors.push("order_id must not be empty".to_string());
        }
        if self.customer_name.trim().is_empty() {
            errors.push("customer_name must not be empty".to_string());
        }
        if self.customer_email.trim().is_empty() {
            errors.push("customer_email must not be empty".to_string());
        }
        if self.location.trim().is_empty() {
            errors.push("location must not be empty".to_string());
        }
        errors
    }
}

/// JSON representation of an order for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDto {
    pub tracking_id: String,
    pub order_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub location: String,
    pub status: OrderStatus,
    pub carrier: String,
    pub real_tracking_id: Option<String>,
    pub estimated_delivery: NaiveDate,
    pub progress: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        let status = order.order_status();
        Self {
            tracking_id: order.tracking_id,
            order_id: order.order_id,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            location: order.location,
            status,
            carrier: order.carrier,
            real_tracking_id: order.real_tracking_id,
            estimated_delivery: order.estimated_delivery,
            progress: order.progress,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
