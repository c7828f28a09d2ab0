use crate::{
    config::Config,
    db::{courier_store::CourierStore, order_store::OrderStore, zone_store::ZoneStore},
};

pub mod courier;
pub mod order;
pub mod status;
pub mod zone;

/// Shared state for all request handlers
#[derive(Clone)]
pub struct AppState {
    pub orders: OrderStore,
    pub zones: ZoneStore,
    pub couriers: CourierStore,
    pub config: Config,
}
