pub mod forwarder;

pub use forwarder::{DeliveryHandle, Forwarder};
