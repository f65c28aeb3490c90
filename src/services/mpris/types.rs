use std::{fmt, sync::Arc};

use zbus::zvariant::OwnedValue;

use super::contract::MprisInterface;

/// A cached or forwarded property value.
///
/// `OwnedValue` is not `Clone`, so values are shared behind an `Arc`.
pub type PropertyValue = Arc<OwnedValue>;

/// One normalised `PropertiesChanged` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    /// D-Bus interface the property belongs to
    pub interface: String,
    /// Property name, e.g. `PlaybackStatus`
    pub property: String,
    /// New value, or `None` when the player only announced that the
    /// property changed (e.g. TrackList `Tracks`)
    pub value: Option<PropertyValue>,
}

impl PropertyChange {
    /// Change carrying a new value.
    pub fn updated(interface: &str, property: &str, value: OwnedValue) -> Self {
        Self {
            interface: interface.to_string(),
            property: property.to_string(),
            value: Some(Arc::new(value)),
        }
    }

    /// Change announced without a value.
    pub fn invalidated(interface: &str, property: &str) -> Self {
        Self {
            interface: interface.to_string(),
            property: property.to_string(),
            value: None,
        }
    }
}

/// Event published by a facet
#[derive(Debug, Clone, PartialEq)]
pub enum FacetEvent {
    /// `<Property>Changed(new, old)`
    PropertyChanged {
        /// Property name
        property: String,
        /// Value carried by the notification
        new: PropertyValue,
        /// Value cached before the notification, if any
        old: Option<PropertyValue>,
    },

    /// `<Property>Changed` without a payload; re-fetch the property
    PropertyInvalidated {
        /// Property name
        property: String,
    },

    /// A remote signal, re-emitted verbatim
    Signal {
        /// Signal name, e.g. `Seeked`
        name: String,
        /// Positional signal arguments
        args: Vec<PropertyValue>,
    },
}

impl FacetEvent {
    /// Event name as published: `VolumeChanged`, `TracksChanged`, `Seeked`, ...
    pub fn name(&self) -> String {
        match self {
            Self::PropertyChanged { property, .. } | Self::PropertyInvalidated { property } => {
                format!("{property}Changed")
            }
            Self::Signal { name, .. } => name.clone(),
        }
    }
}

/// Process and session lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The player process exited with this code (`None` when killed)
    Exit(Option<i32>),
    /// The player process is gone and its stdio is closed
    Close {
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Terminating signal, if any
        signal: Option<i32>,
    },
    /// The player process could not be observed or started
    Error(String),
    /// The session was stopped
    Stop,
}

/// Steps of the connection sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Nothing started
    #[default]
    Idle,
    /// Waiting for the service name to be registered
    AwaitingService,
    /// Binding `org.mpris.MediaPlayer2`
    BindingBase,
    /// Binding `org.mpris.MediaPlayer2.Player`
    BindingPlayer,
    /// Binding `org.mpris.MediaPlayer2.TrackList`
    BindingTrackList,
    /// Binding `org.mpris.MediaPlayer2.Playlists`
    BindingPlaylists,
    /// Subscribing to `PropertiesChanged`
    WatchingProperties,
    /// Every step succeeded
    Ready,
    /// A step failed
    Failed,
}

impl ConnectionState {
    /// State entered while binding `interface`.
    pub fn binding(interface: MprisInterface) -> Self {
        match interface {
            MprisInterface::Base => Self::BindingBase,
            MprisInterface::Player => Self::BindingPlayer,
            MprisInterface::TrackList => Self::BindingTrackList,
            MprisInterface::Playlists => Self::BindingPlaylists,
        }
    }

    /// Whether a connection sequence is currently running.
    pub fn is_in_flight(self) -> bool {
        !matches!(self, Self::Idle | Self::Ready | Self::Failed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Current playback state of a media player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Player is currently playing
    Playing,

    /// Player is paused
    Paused,

    /// Player is stopped
    Stopped,
}

impl From<&str> for PlaybackState {
    fn from(status: &str) -> Self {
        match status {
            "Playing" => Self::Playing,
            "Paused" => Self::Paused,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Loop mode for track or playlist repetition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    /// No looping
    None,

    /// Repeat the current track
    Track,

    /// Repeat the whole playlist
    Playlist,
}

impl LoopStatus {
    /// Wire representation used by the `LoopStatus` property.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Track => "Track",
            Self::Playlist => "Playlist",
        }
    }
}

impl From<&str> for LoopStatus {
    fn from(status: &str) -> Self {
        match status {
            "Track" => Self::Track,
            "Playlist" => Self::Playlist,
            _ => Self::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_follow_property_changed_convention() {
        let changed = FacetEvent::PropertyChanged {
            property: "Volume".into(),
            new: Arc::new(zbus::zvariant::Value::from(0.5f64).try_to_owned().unwrap()),
            old: None,
        };
        assert_eq!(changed.name(), "VolumeChanged");

        let invalidated = FacetEvent::PropertyInvalidated {
            property: "Tracks".into(),
        };
        assert_eq!(invalidated.name(), "TracksChanged");

        let signal = FacetEvent::Signal {
            name: "Seeked".into(),
            args: vec![],
        };
        assert_eq!(signal.name(), "Seeked");
    }

    #[test]
    fn in_flight_covers_intermediate_states_only() {
        assert!(!ConnectionState::Idle.is_in_flight());
        assert!(ConnectionState::AwaitingService.is_in_flight());
        assert!(ConnectionState::binding(MprisInterface::TrackList).is_in_flight());
        assert!(ConnectionState::WatchingProperties.is_in_flight());
        assert!(!ConnectionState::Ready.is_in_flight());
        assert!(!ConnectionState::Failed.is_in_flight());
    }

    #[test]
    fn loop_status_parses_wire_values() {
        assert_eq!(LoopStatus::from("Track"), LoopStatus::Track);
        assert_eq!(LoopStatus::from("Playlist").as_str(), "Playlist");
        assert_eq!(LoopStatus::from("bogus"), LoopStatus::None);
        assert_eq!(PlaybackState::from("Paused"), PlaybackState::Paused);
    }
}
