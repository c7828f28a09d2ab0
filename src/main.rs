use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;
#[cfg(test)]
mod test;

use config::Config;
use db::{courier_store::CourierStore, order_store::OrderStore, zone_store::ZoneStore};
use handlers::AppState;

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/zones", get(handlers::zone::get_all_zones))
        .route("/api/zones", post(handlers::zone::create_zone))
        .route("/api/zones/{id}", put(handlers::zone::update_zone))
        .route("/api/zones/{id}", delete(handlers::zone::delete_zone))
        .route("/api/zones/resolve", post(handlers::zone::resolve_zone))
        .route(
            "/api/zones/defaults",
            post(handlers::zone::install_default_zones),
        )
        .route("/api/zones/export", get(handlers::zone::export_zones))
        .route("/api/zones/import", post(handlers::zone::import_zones))
        .route("/api/couriers", get(handlers::courier::get_all_couriers))
        .route("/api/couriers", post(handlers::courier::create_courier))
        .route(
            "/api/couriers/{slug}",
            put(handlers::courier::update_courier),
        )
        .route(
            "/api/couriers/{slug}",
            delete(handlers::courier::delete_courier),
        )
        .route(
            "/api/couriers/detect/{tracking_id}",
            get(handlers::courier::detect_courier),
        )
        .route("/api/orders", get(handlers::order::get_all_orders))
        .route("/api/orders", post(handlers::order::create_order))
        .route("/api/orders/{tracking_id}", get(handlers::order::get_order))
        .route(
            "/api/orders/{tracking_id}",
            delete(handlers::order::delete_order),
        )
        .route(
            "/api/orders/{tracking_id}/events",
            get(handlers::order::get_order_events),
        )
        .route(
            "/api/orders/{tracking_id}/status",
            put(handlers::order::update_order_status),
        )
        .route(
            "/api/orders/{tracking_id}/auto-update",
            post(handlers::order::auto_update_order),
        )
        .route("/api/status/{status}", get(handlers::status::get_status_info))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "Delivery Tracking Server is running."
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let pool = db::init_db_pool(&config.database_url).await?;

    let state = AppState {
        orders: OrderStore::new(pool.clone()),
        zones: ZoneStore::new(pool.clone()),
        couriers: CourierStore::new(pool),
        config: config.clone(),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting delivery tracking server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
