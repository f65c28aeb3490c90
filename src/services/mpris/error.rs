use std::{fmt, time::Duration};

/// Errors that can occur while controlling an MPRIS player
#[derive(thiserror::Error, Debug)]
pub enum MprisError {
    /// The player's service name did not show up on the bus in time
    #[error("service {service} did not appear within {timeout:?}")]
    Timeout {
        /// Bus name that was awaited
        service: String,
        /// Discovery window that elapsed
        timeout: Duration,
    },

    /// An MPRIS interface could not be resolved or wired up
    #[error("failed to bind {interface} on {service}: {reason}")]
    BindFailure {
        /// Bus name of the player
        service: String,
        /// D-Bus interface being bound
        interface: String,
        /// What went wrong
        reason: String,
    },

    /// A forwarded method call or property access failed or timed out
    #[error("remote call {member} on {interface} failed: {reason}")]
    RemoteCallFailure {
        /// D-Bus interface of the member
        interface: String,
        /// Method or property name
        member: String,
        /// What went wrong
        reason: String,
    },

    /// The member is not part of the interface contract, or the property
    /// is not writable
    #[error("invalid operation on {interface}: {reason}")]
    InvalidOperation {
        /// D-Bus interface the operation targeted
        interface: String,
        /// Why it was rejected
        reason: String,
    },

    /// The player process could not be started
    #[error("failed to spawn {command}: {reason}")]
    ProcessSpawnFailure {
        /// Command that was spawned
        command: String,
        /// What went wrong
        reason: String,
    },

    /// Closing the session did not complete cleanly
    #[error("teardown failed: {0}")]
    TeardownFailure(String),

    /// No launch profile exists under this name
    #[error("unknown player profile '{0}'")]
    UnknownProfile(String),

    /// Another connection sequence is still running on this client
    #[error("a connection sequence for '{0}' is already in flight")]
    ConnectionInProgress(String),

    /// The connection sequence failed in one or more steps
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// D-Bus communication error
    #[error("D-Bus operation failed: {0}")]
    DbusError(#[from] zbus::Error),
}

impl MprisError {
    pub(crate) fn bind(service: &str, interface: &str, reason: impl fmt::Display) -> Self {
        Self::BindFailure {
            service: service.to_string(),
            interface: interface.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn remote(interface: &str, member: &str, reason: impl fmt::Display) -> Self {
        Self::RemoteCallFailure {
            interface: interface.to_string(),
            member: member.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid(interface: &str, reason: impl fmt::Display) -> Self {
        Self::InvalidOperation {
            interface: interface.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Per-step failures of a connection sequence.
///
/// Discovery failure stops the sequence, so when `discovery` is set all other
/// steps are empty. The bind and watch steps all run and each records its
/// own cause. TrackList and Playlists are optional in MPRIS, so their causes
/// alone do not fail a session; see [`ConnectError::is_fatal`].
#[derive(Debug, Default)]
pub struct ConnectError {
    /// Bus name the sequence targeted
    pub service: String,
    /// Waiting for the service name failed
    pub discovery: Option<Box<MprisError>>,
    /// Binding `org.mpris.MediaPlayer2` failed
    pub base: Option<Box<MprisError>>,
    /// Binding `org.mpris.MediaPlayer2.Player` failed
    pub player: Option<Box<MprisError>>,
    /// Binding `org.mpris.MediaPlayer2.TrackList` failed
    pub track_list: Option<Box<MprisError>>,
    /// Binding `org.mpris.MediaPlayer2.Playlists` failed
    pub playlists: Option<Box<MprisError>>,
    /// Subscribing to property changes failed
    pub watch: Option<Box<MprisError>>,
}

impl ConnectError {
    pub(crate) fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            ..Self::default()
        }
    }

    /// Step name and cause for every step that failed, in sequence order.
    pub fn causes(&self) -> impl Iterator<Item = (&'static str, &MprisError)> {
        [
            ("discovery", &self.discovery),
            ("base", &self.base),
            ("player", &self.player),
            ("track_list", &self.track_list),
            ("playlists", &self.playlists),
            ("watch", &self.watch),
        ]
        .into_iter()
        .filter_map(|(step, cause)| cause.as_deref().map(|err| (step, err)))
    }

    /// True when no step recorded a failure.
    pub fn is_empty(&self) -> bool {
        self.causes().next().is_none()
    }

    /// True when a required step failed: discovery, Base, Player or the
    /// property watch.
    pub fn is_fatal(&self) -> bool {
        self.discovery.is_some()
            || self.base.is_some()
            || self.player.is_some()
            || self.watch.is_some()
    }

    /// True when the sequence stopped because the service never appeared.
    pub fn is_timeout(&self) -> bool {
        matches!(self.discovery.as_deref(), Some(MprisError::Timeout { .. }))
    }
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection to {} failed", self.service)?;
        for (index, (step, cause)) in self.causes().enumerate() {
            let sep = if index == 0 { ": " } else { "; " };
            write!(f, "{sep}{step}: {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConnectError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_only_failed_steps_in_order() {
        let mut err = ConnectError::new("org.mpris.MediaPlayer2.vlc");
        err.watch = Some(Box::new(MprisError::TeardownFailure("late".into())));
        err.playlists = Some(Box::new(MprisError::bind(
            "org.mpris.MediaPlayer2.vlc",
            "org.mpris.MediaPlayer2.Playlists",
            "interface not exported",
        )));

        let steps: Vec<_> = err.causes().map(|(step, _)| step).collect();
        assert_eq!(steps, ["playlists", "watch"]);

        let text = err.to_string();
        assert!(text.starts_with("connection to org.mpris.MediaPlayer2.vlc failed: playlists:"));
        assert!(text.contains("; watch: teardown failed: late"));
        assert!(!text.contains("base"));
    }

    #[test]
    fn timeout_is_detected_from_discovery_step() {
        let mut err = ConnectError::new("org.mpris.MediaPlayer2.vlc");
        assert!(err.is_empty());
        assert!(!err.is_timeout());

        err.discovery = Some(Box::new(MprisError::Timeout {
            service: err.service.clone(),
            timeout: Duration::from_secs(5),
        }));
        assert!(!err.is_empty());
        assert!(err.is_timeout());
    }

    #[test]
    fn optional_interfaces_alone_are_not_fatal() {
        let service = "org.mpris.MediaPlayer2.vlc";
        let mut err = ConnectError::new(service);
        err.track_list = Some(Box::new(MprisError::bind(
            service,
            "org.mpris.MediaPlayer2.TrackList",
            "interface not exported",
        )));
        err.playlists = Some(Box::new(MprisError::bind(
            service,
            "org.mpris.MediaPlayer2.Playlists",
            "interface not exported",
        )));
        assert!(!err.is_empty());
        assert!(!err.is_fatal());

        err.player = Some(Box::new(MprisError::bind(
            service,
            "org.mpris.MediaPlayer2.Player",
            "interface not exported",
        )));
        assert!(err.is_fatal());
    }
}
