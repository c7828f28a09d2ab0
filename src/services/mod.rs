pub mod courier_registry;
pub mod tracking_engine;
pub mod zone_resolver;
