pub mod courier;
pub mod order;
pub mod tracking_event;
pub mod zone;
