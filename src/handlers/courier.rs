use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

use crate::{
    error::Result,
    handlers::AppState,
    models::courier::{CourierDto, NewCourier},
    services::courier_registry::{tracking_url, Confidence, CourierRegistry},
};

/// Get all couriers handler
pub async fn get_all_couriers(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let couriers = state.couriers.get_all_couriers().await?;
    let dtos: Vec<CourierDto> = couriers.into_iter().map(CourierDto::from).collect();
    Ok((StatusCode::OK, Json(dtos)))
}

/// Create courier handler
pub async fn create_courier(
    State(state): State<AppState>,
    Json(courier): Json<NewCourier>,
) -> Result<impl IntoResponse> {
    let created = state.couriers.create_courier(courier).await?;
    Ok((StatusCode::CREATED, Json(CourierDto::from(created))))
}

/// Update courier handler
pub async fn update_courier(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(courier): Json<NewCourier>,
) -> Result<impl IntoResponse> {
    let updated = state.couriers.update_courier(&slug, courier).await?;
    Ok((StatusCode::OK, Json(CourierDto::from(updated))))
}

/// Delete courier handler
pub async fn delete_courier(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    state.couriers.delete_courier(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub courier: Option<CourierDto>,
    pub confidence: Option<Confidence>,
    pub tracking_url: Option<String>,
}

/// Auto-detect the courier for a tracking id. A fallback-confidence
/// result is a best guess, not a confirmed carrier.
pub async fn detect_courier(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> Result<impl IntoResponse> {
    let couriers = state.couriers.get_active_couriers().await?;
    let registry = CourierRegistry::from_couriers(&couriers);

    let response = match registry.detect(&tracking_id, &couriers) {
        Some(found) => DetectResponse {
            tracking_url: Some(tracking_url(found.courier, &tracking_id)),
            confidence: Some(found.confidence),
            courier: Some(CourierDto::from(found.courier.clone())),
        },
        None => DetectResponse {
            courier: None,
            confidence: None,
            tracking_url: None,
        },
    };
    Ok((StatusCode::OK, Json(response)))
}
