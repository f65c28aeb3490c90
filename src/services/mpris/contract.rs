//! Static description of the four MPRIS interfaces.
//!
//! Writable properties are fixed by the MPRIS specification and never taken
//! from introspection data.

use std::fmt;

use super::MprisError;

/// Object path every MPRIS player exports its interfaces on
pub const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";

/// Prefix of every MPRIS service name
pub const MPRIS_BUS_PREFIX: &str = "org.mpris.MediaPlayer2.";

/// One of the four MPRIS sub-interfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MprisInterface {
    /// `org.mpris.MediaPlayer2`
    Base,
    /// `org.mpris.MediaPlayer2.Player`
    Player,
    /// `org.mpris.MediaPlayer2.TrackList`
    TrackList,
    /// `org.mpris.MediaPlayer2.Playlists`
    Playlists,
}

/// Members a player must expose for one interface.
#[derive(Debug)]
pub struct InterfaceContract {
    /// Method names
    pub methods: &'static [&'static str],
    /// Readable property names
    pub properties: &'static [&'static str],
    /// Properties that accept writes
    pub writable: &'static [&'static str],
    /// Signal names
    pub signals: &'static [&'static str],
}

const BASE: InterfaceContract = InterfaceContract {
    methods: &["Raise", "Quit"],
    properties: &[
        "CanQuit",
        "Fullscreen",
        "CanSetFullscreen",
        "CanRaise",
        "HasTrackList",
        "Identity",
        "DesktopEntry",
        "SupportedUriSchemes",
        "SupportedMimeTypes",
    ],
    writable: &["Fullscreen"],
    signals: &[],
};

const PLAYER: InterfaceContract = InterfaceContract {
    methods: &[
        "Next",
        "Previous",
        "Pause",
        "PlayPause",
        "Stop",
        "Play",
        "Seek",
        "SetPosition",
        "OpenUri",
    ],
    properties: &[
        "PlaybackStatus",
        "LoopStatus",
        "Rate",
        "Shuffle",
        "Metadata",
        "Volume",
        "Position",
        "MinimumRate",
        "MaximumRate",
        "CanGoNext",
        "CanGoPrevious",
        "CanPlay",
        "CanPause",
        "CanSeek",
        "CanControl",
    ],
    writable: &["LoopStatus", "Rate", "Shuffle", "Volume"],
    signals: &["Seeked"],
};

const TRACK_LIST: InterfaceContract = InterfaceContract {
    methods: &["GetTracksMetadata", "AddTrack", "RemoveTrack", "GoTo"],
    properties: &["Tracks", "CanEditTracks"],
    writable: &[],
    signals: &[
        "TrackListReplaced",
        "TrackAdded",
        "TrackRemoved",
        "TrackMetadataChanged",
    ],
};

const PLAYLISTS: InterfaceContract = InterfaceContract {
    methods: &["ActivatePlaylist", "GetPlaylists"],
    properties: &["PlaylistCount", "Orderings", "ActivePlaylist"],
    writable: &[],
    signals: &["PlaylistChanged"],
};

impl MprisInterface {
    /// All interfaces in binding order.
    pub const ALL: [MprisInterface; 4] = [
        MprisInterface::Base,
        MprisInterface::Player,
        MprisInterface::TrackList,
        MprisInterface::Playlists,
    ];

    /// Fully qualified D-Bus interface name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Base => "org.mpris.MediaPlayer2",
            Self::Player => "org.mpris.MediaPlayer2.Player",
            Self::TrackList => "org.mpris.MediaPlayer2.TrackList",
            Self::Playlists => "org.mpris.MediaPlayer2.Playlists",
        }
    }

    /// Look up an interface by its D-Bus name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|iface| iface.name() == name)
    }

    /// Static member table for this interface.
    pub fn contract(self) -> &'static InterfaceContract {
        match self {
            Self::Base => &BASE,
            Self::Player => &PLAYER,
            Self::TrackList => &TRACK_LIST,
            Self::Playlists => &PLAYLISTS,
        }
    }

    /// Whether `method` is part of the interface.
    pub fn has_method(self, method: &str) -> bool {
        self.contract().methods.contains(&method)
    }

    /// Whether `property` can be read.
    pub fn has_property(self, property: &str) -> bool {
        self.contract().properties.contains(&property)
    }

    /// Whether `property` is on the writable allowlist.
    pub fn is_writable(self, property: &str) -> bool {
        self.contract().writable.contains(&property)
    }

    /// Whether `signal` is part of the interface.
    pub fn has_signal(self, signal: &str) -> bool {
        self.contract().signals.contains(&signal)
    }

    /// Reject calls to methods outside the interface.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::InvalidOperation` if `method` is not part of the
    /// interface.
    pub fn check_method(self, method: &str) -> Result<(), MprisError> {
        if self.has_method(method) {
            Ok(())
        } else {
            Err(MprisError::invalid(self.name(), format!("no method named '{method}'")))
        }
    }

    /// Reject reads of properties outside the interface.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::InvalidOperation` if `property` is not part of
    /// the interface.
    pub fn check_property(self, property: &str) -> Result<(), MprisError> {
        if self.has_property(property) {
            Ok(())
        } else {
            Err(MprisError::invalid(self.name(), format!("no property named '{property}'")))
        }
    }

    /// Reject writes outside the allowlist.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::InvalidOperation` if `property` is not on the
    /// writable allowlist.
    pub fn check_writable(self, property: &str) -> Result<(), MprisError> {
        if self.is_writable(property) {
            Ok(())
        } else {
            Err(MprisError::invalid(
                self.name(),
                format!("property '{property}' is not writable"),
            ))
        }
    }
}

impl fmt::Display for MprisInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bus name a player registers for the given profile name.
pub fn bus_name_for(player_name: &str) -> String {
    format!("{MPRIS_BUS_PREFIX}{player_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_lookup() {
        for iface in MprisInterface::ALL {
            assert_eq!(MprisInterface::from_name(iface.name()), Some(iface));
        }
        assert_eq!(MprisInterface::from_name("org.freedesktop.DBus"), None);
    }

    #[test]
    fn writable_allowlists_match_mpris() {
        assert_eq!(MprisInterface::Base.contract().writable, ["Fullscreen"]);
        assert_eq!(
            MprisInterface::Player.contract().writable,
            ["LoopStatus", "Rate", "Shuffle", "Volume"]
        );
        assert!(MprisInterface::TrackList.contract().writable.is_empty());
        assert!(MprisInterface::Playlists.contract().writable.is_empty());
    }

    #[test]
    fn writable_properties_are_also_readable() {
        for iface in MprisInterface::ALL {
            for property in iface.contract().writable {
                assert!(iface.has_property(property), "{iface}.{property}");
            }
        }
    }

    #[test]
    fn identity_is_not_writable() {
        assert!(MprisInterface::Base.has_property("Identity"));
        assert!(!MprisInterface::Base.is_writable("Identity"));
        assert!(!MprisInterface::Player.is_writable("PlaybackStatus"));
    }

    #[test]
    fn writes_outside_the_allowlist_are_invalid() {
        assert!(MprisInterface::Player.check_writable("Volume").is_ok());

        let err = MprisInterface::Player
            .check_writable("PlaybackStatus")
            .unwrap_err();
        assert!(matches!(err, MprisError::InvalidOperation { .. }));
        assert!(MprisInterface::TrackList.check_writable("Tracks").is_err());
    }

    #[test]
    fn unknown_members_are_invalid() {
        assert!(MprisInterface::Base.check_method("Quit").is_ok());
        assert!(MprisInterface::Base.check_method("Play").is_err());
        assert!(MprisInterface::Playlists.check_property("Volume").is_err());
    }

    #[test]
    fn bus_name_is_namespaced() {
        assert_eq!(bus_name_for("vlc"), "org.mpris.MediaPlayer2.vlc");
    }
}
