//! MPRIS2 client: launch a player, wait for it on the session bus, bind its
//! four interfaces and forward property changes.

/// Interface binding and introspection checks
pub mod binder;
/// Static MPRIS interface contracts
pub mod contract;
/// Waiting for a player's bus name
pub mod discovery;
/// MPRIS error types
pub mod error;
/// Typed local views of the remote interfaces
pub mod facet;
/// Player process profiles and spawning
pub mod launcher;
/// `PropertiesChanged` forwarding
pub mod monitoring;
/// D-Bus proxy trait definitions
pub mod proxy;
/// Client and session lifecycle
pub mod session;
/// Shared value and event types
pub mod types;
/// Conversion helpers
pub mod utils;

pub use contract::{MPRIS_BUS_PREFIX, MPRIS_PATH, MprisInterface, bus_name_for};
pub use error::{ConnectError, MprisError};
pub use facet::{BaseFacet, Facet, FacetState, PlayerFacet, PlaylistsFacet, TrackListFacet};
pub use launcher::{LaunchCommand, PlayerProcess, PlayerProfile};
pub use monitoring::{FacetStates, PropertyWatch};
pub use session::{MprisClient, PlayerSession};
pub use types::{
    ConnectionState, FacetEvent, LoopStatus, PlaybackState, PropertyChange, PropertyValue,
    SessionEvent,
};
