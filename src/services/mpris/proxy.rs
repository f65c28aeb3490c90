#![allow(missing_docs)]

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use zbus::{
    Result, proxy,
    zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Type},
};

/// Playlist entry as exchanged by the Playlists interface: `(oss)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct Playlist {
    /// Unique playlist identifier
    pub id: OwnedObjectPath,
    /// Display name
    pub name: String,
    /// Icon URI, empty when there is none
    pub icon: String,
}

/// Track metadata map as used by Player and TrackList: `a{sv}`.
pub type MetadataMap = HashMap<String, OwnedValue>;

/// MPRIS MediaPlayer2 interface proxy
///
/// Provides access to the base MPRIS interface for media player control
#[proxy(
    interface = "org.mpris.MediaPlayer2",
    default_service = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
pub trait MediaPlayer2 {
    /// Quit the media player application
    fn quit(&self) -> Result<()>;

    /// Raise the media player window to the foreground
    fn raise(&self) -> Result<()>;

    /// Whether the player can be quit
    #[zbus(property)]
    fn can_quit(&self) -> Result<bool>;

    /// Whether the player window can be raised
    #[zbus(property)]
    fn can_raise(&self) -> Result<bool>;

    /// Human-readable name of the player
    #[zbus(property)]
    fn identity(&self) -> Result<String>;

    /// Desktop entry name for the player
    #[zbus(property)]
    fn desktop_entry(&self) -> Result<String>;

    /// MIME types supported by the player
    #[zbus(property)]
    fn supported_mime_types(&self) -> Result<Vec<String>>;

    /// URI schemes supported by the player
    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Result<Vec<String>>;

    /// Whether the player has a track list
    #[zbus(property)]
    fn has_track_list(&self) -> Result<bool>;

    /// Whether the player is in fullscreen mode
    #[zbus(property)]
    fn fullscreen(&self) -> Result<bool>;

    /// Set the player's fullscreen mode
    #[zbus(property)]
    fn set_fullscreen(&self, fullscreen: bool) -> Result<()>;

    /// Whether the player can change fullscreen mode
    #[zbus(property)]
    fn can_set_fullscreen(&self) -> Result<bool>;
}

/// MPRIS MediaPlayer2.Player interface proxy
///
/// Provides access to the playback control interface for media players
#[proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_service = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
pub trait MediaPlayer2Player {
    /// Start playback
    fn play(&self) -> Result<()>;

    /// Pause playback
    fn pause(&self) -> Result<()>;

    /// Toggle play/pause state
    fn play_pause(&self) -> Result<()>;

    /// Stop playback
    fn stop(&self) -> Result<()>;

    /// Skip to next track
    fn next(&self) -> Result<()>;

    /// Skip to previous track
    fn previous(&self) -> Result<()>;

    /// Seek by a relative offset in microseconds
    fn seek(&self, offset: i64) -> Result<()>;

    /// Set absolute playback position in microseconds
    fn set_position(&self, track_id: &ObjectPath<'_>, position: i64) -> Result<()>;

    /// Open and play a URI
    fn open_uri(&self, uri: &str) -> Result<()>;

    /// Signal emitted when playback position jumps
    #[zbus(signal)]
    fn seeked(&self, position: i64) -> Result<()>;

    /// Current playback status (Playing, Paused, Stopped)
    #[zbus(property)]
    fn playback_status(&self) -> Result<String>;

    /// Current loop status (None, Track, Playlist)
    #[zbus(property)]
    fn loop_status(&self) -> Result<String>;

    /// Set the loop status
    #[zbus(property)]
    fn set_loop_status(&self, status: &str) -> Result<()>;

    /// Current playback rate (1.0 is normal speed)
    #[zbus(property)]
    fn rate(&self) -> Result<f64>;

    /// Set the playback rate
    #[zbus(property)]
    fn set_rate(&self, rate: f64) -> Result<()>;

    /// Whether shuffle mode is enabled
    #[zbus(property)]
    fn shuffle(&self) -> Result<bool>;

    /// Set shuffle mode
    #[zbus(property)]
    fn set_shuffle(&self, shuffle: bool) -> Result<()>;

    /// Current track metadata
    #[zbus(property)]
    fn metadata(&self) -> Result<MetadataMap>;

    /// Current volume level (0.0 to 1.0)
    #[zbus(property)]
    fn volume(&self) -> Result<f64>;

    /// Set volume level
    #[zbus(property)]
    fn set_volume(&self, volume: f64) -> Result<()>;

    /// Current playback position in microseconds
    #[zbus(property)]
    fn position(&self) -> Result<i64>;

    /// Minimum supported playback rate
    #[zbus(property)]
    fn minimum_rate(&self) -> Result<f64>;

    /// Maximum supported playback rate
    #[zbus(property)]
    fn maximum_rate(&self) -> Result<f64>;

    /// Whether the player can skip to next track
    #[zbus(property)]
    fn can_go_next(&self) -> Result<bool>;

    /// Whether the player can skip to previous track
    #[zbus(property)]
    fn can_go_previous(&self) -> Result<bool>;

    /// Whether the player can start playback
    #[zbus(property)]
    fn can_play(&self) -> Result<bool>;

    /// Whether the player can pause playback
    #[zbus(property)]
    fn can_pause(&self) -> Result<bool>;

    /// Whether the player supports seeking
    #[zbus(property)]
    fn can_seek(&self) -> Result<bool>;

    /// Whether the player can be controlled
    #[zbus(property)]
    fn can_control(&self) -> Result<bool>;
}

/// MPRIS MediaPlayer2.TrackList interface proxy
#[proxy(
    interface = "org.mpris.MediaPlayer2.TrackList",
    default_service = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
pub trait MediaPlayer2TrackList {
    /// Metadata for each of the given tracks
    fn get_tracks_metadata(&self, track_ids: &[ObjectPath<'_>]) -> Result<Vec<MetadataMap>>;

    /// Insert a URI after the given track
    fn add_track(&self, uri: &str, after_track: &ObjectPath<'_>, set_as_current: bool)
    -> Result<()>;

    /// Remove a track from the list
    fn remove_track(&self, track_id: &ObjectPath<'_>) -> Result<()>;

    /// Skip to the given track
    fn go_to(&self, track_id: &ObjectPath<'_>) -> Result<()>;

    /// The whole list was replaced
    #[zbus(signal)]
    fn track_list_replaced(
        &self,
        tracks: Vec<OwnedObjectPath>,
        current_track: OwnedObjectPath,
    ) -> Result<()>;

    /// A track was inserted
    #[zbus(signal)]
    fn track_added(&self, metadata: MetadataMap, after_track: OwnedObjectPath) -> Result<()>;

    /// A track was removed
    #[zbus(signal)]
    fn track_removed(&self, track_id: OwnedObjectPath) -> Result<()>;

    /// Metadata of a track changed
    #[zbus(signal)]
    fn track_metadata_changed(&self, track_id: OwnedObjectPath, metadata: MetadataMap)
    -> Result<()>;

    /// Track identifiers in play order
    #[zbus(property)]
    fn tracks(&self) -> Result<Vec<OwnedObjectPath>>;

    /// Whether tracks can be added or removed
    #[zbus(property)]
    fn can_edit_tracks(&self) -> Result<bool>;
}

/// MPRIS MediaPlayer2.Playlists interface proxy
#[proxy(
    interface = "org.mpris.MediaPlayer2.Playlists",
    default_service = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
pub trait MediaPlayer2Playlists {
    /// Start playing the given playlist
    fn activate_playlist(&self, playlist_id: &ObjectPath<'_>) -> Result<()>;

    /// A page of the player's playlists
    fn get_playlists(
        &self,
        index: u32,
        max_count: u32,
        order: &str,
        reverse_order: bool,
    ) -> Result<Vec<Playlist>>;

    /// Name or icon of a playlist changed
    #[zbus(signal)]
    fn playlist_changed(&self, playlist: Playlist) -> Result<()>;

    /// Number of playlists available
    #[zbus(property)]
    fn playlist_count(&self) -> Result<u32>;

    /// Orderings supported by `GetPlaylists`
    #[zbus(property)]
    fn orderings(&self) -> Result<Vec<String>>;
}
