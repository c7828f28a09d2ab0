use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    error::{AppError, Result},
    handlers::AppState,
    models::zone::NewZone,
    services::zone_resolver::ZoneResolver,
};

/// Get all zones handler
pub async fn get_all_zones(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let zones = state.zones.get_all_zones().await?;
    Ok((StatusCode::OK, Json(zones)))
}

/// Create zone handler
pub async fn create_zone(
    State(state): State<AppState>,
    Json(zone): Json<NewZone>,
) -> Result<impl IntoResponse> {
    let created = state.zones.create_zone(zone).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update zone handler
pub async fn update_zone(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(zone): Json<NewZone>,
) -> Result<impl IntoResponse> {
    let updated = state.zones.update_zone(id, zone).await?;
    Ok((StatusCode::OK, Json(updated)))
}

/// Delete zone handler
pub async fn delete_zone(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.zones.delete_zone(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub address: String,
}

/// Resolve the governing zone for a free-text address
pub async fn resolve_zone(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<impl IntoResponse> {
    if request.address.trim().is_empty() {
        return Err(AppError::BadRequest("address must not be empty".into()));
    }

    let zones = state.zones.get_active_zones().await?;
    let resolved = ZoneResolver::new(&state.config).resolve(&request.address, &zones);
    Ok((StatusCode::OK, Json(resolved)))
}

/// Install the canonical default zones
pub async fn install_default_zones(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let report = state.zones.install_default_zones().await?;
    Ok((StatusCode::OK, Json(report)))
}

/// Export all zones as a JSON array
pub async fn export_zones(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let records = state.zones.export_zones().await?;
    Ok((StatusCode::OK, Json(records)))
}

/// Import zones from a JSON array, upserting by name
pub async fn import_zones(
    State(state): State<AppState>,
    Json(records): Json<Vec<serde_json::Value>>,
) -> Result<impl IntoResponse> {
    let report = state.zones.import_zones(records).await?;
    Ok((StatusCode::OK, Json(report)))
}
