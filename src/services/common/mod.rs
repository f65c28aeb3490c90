//! Common utilities shared by services

/// Watchable property for coarse-grained state such as the connection state
pub mod property;

pub use property::Property;
