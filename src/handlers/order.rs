use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    handlers::AppState,
    models::{
        order::{NewOrder, OrderDto},
        tracking_event::TrackingEventDto,
    },
    services::{
        courier_registry::tracking_url,
        tracking_engine::{self, StatusInfo},
    },
};

/// Get all orders handler
pub async fn get_all_orders(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let orders = state.orders.get_all_orders().await?;
    let dtos: Vec<OrderDto> = orders.into_iter().map(OrderDto::from).collect();
    Ok((StatusCode::OK, Json(dtos)))
}

/// Create order handler
pub async fn create_order(
    State(state): State<AppState>,
    Json(order): Json<NewOrder>,
) -> Result<impl IntoResponse> {
    let created = state.orders.create_order(order).await?;
    Ok((StatusCode::CREATED, Json(OrderDto::from(created))))
}

#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    pub order: OrderDto,
    pub events: Vec<TrackingEventDto>,
    pub status_info: StatusInfo,
    pub tracking_url: Option<String>,
}

/// Get one order with its event timeline, status metadata and, when
/// its carrier is known, an external tracking link
pub async fn get_order(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> Result<impl IntoResponse> {
    let order = state.orders.get_order_by_tracking_id(&tracking_id).await?;
    let events = state.orders.get_events(&tracking_id).await?;
    let status = order.order_status();

    let link = match state.couriers.get_courier_by_slug(&order.carrier).await {
        Ok(courier) => {
            let id = order.real_tracking_id.as_deref().unwrap_or(&order.tracking_id);
            Some(tracking_url(&courier, id))
        }
        Err(AppError::CourierNotFound) => None,
        Err(e) => return Err(e),
    };

    let response = OrderDetailResponse {
        order: OrderDto::from(order),
        events: events.into_iter().map(TrackingEventDto::from).collect(),
        status_info: tracking_engine::status_info(status),
        tracking_url: link,
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Get an order's tracking events, oldest first
pub async fn get_order_events(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> Result<impl IntoResponse> {
    // 404 for unknown orders rather than an empty list.
    state.orders.get_order_by_tracking_id(&tracking_id).await?;
    let events = state.orders.get_events(&tracking_id).await?;
    let dtos: Vec<TrackingEventDto> = events.into_iter().map(TrackingEventDto::from).collect();
    Ok((StatusCode::OK, Json(dtos)))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Set an order's status handler
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse> {
    let updated = state
        .orders
        .update_status(&tracking_id, &request.status)
        .await?;
    Ok((StatusCode::OK, Json(OrderDto::from(updated))))
}

/// Advance an order by at most one stage if it is due
pub async fn auto_update_order(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> Result<impl IntoResponse> {
    let updated = state
        .orders
        .auto_update_status(&tracking_id, state.config.auto_update_hours)
        .await?;
    Ok((StatusCode::OK, Json(OrderDto::from(updated))))
}

/// Delete order handler
pub async fn delete_order(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> Result<impl IntoResponse> {
    state.orders.delete_order(&tracking_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
