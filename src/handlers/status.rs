use axum::{
    extract::{Json, Path},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::Result,
    models::order::OrderStatus,
    services::tracking_engine,
};

/// Status metadata handler. Unknown status strings get the processing
/// stage's metadata rather than an error.
pub async fn get_status_info(Path(status): Path<String>) -> Result<impl IntoResponse> {
    let info = tracking_engine::status_info(OrderStatus::parse(&status));
    Ok((StatusCode::OK, Json(info)))
}
