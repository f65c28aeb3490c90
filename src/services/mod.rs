/// Helpers shared by services
pub mod common;
/// MPRIS media player control
pub mod mpris;

pub use mpris::{MprisClient, MprisError, PlayerSession};
