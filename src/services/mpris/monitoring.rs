use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};
use zbus::{Connection, fdo::PropertiesProxy};

use super::{
    MprisError,
    contract::{MPRIS_PATH, MprisInterface},
    facet::FacetState,
    types::PropertyChange,
};

/// Facet states addressed by interface, as seen by the forwarder.
#[derive(Clone, Debug)]
pub struct FacetStates {
    /// `org.mpris.MediaPlayer2`
    pub base: Arc<FacetState>,
    /// `org.mpris.MediaPlayer2.Player`
    pub player: Arc<FacetState>,
    /// `org.mpris.MediaPlayer2.TrackList`
    pub track_list: Arc<FacetState>,
    /// `org.mpris.MediaPlayer2.Playlists`
    pub playlists: Arc<FacetState>,
}

impl FacetStates {
    /// Fresh, empty states for all four interfaces.
    pub fn new() -> Self {
        Self {
            base: FacetState::new(MprisInterface::Base),
            player: FacetState::new(MprisInterface::Player),
            track_list: FacetState::new(MprisInterface::TrackList),
            playlists: FacetState::new(MprisInterface::Playlists),
        }
    }

    /// State for `iface`.
    pub fn get(&self, iface: MprisInterface) -> &Arc<FacetState> {
        match iface {
            MprisInterface::Base => &self.base,
            MprisInterface::Player => &self.player,
            MprisInterface::TrackList => &self.track_list,
            MprisInterface::Playlists => &self.playlists,
        }
    }

    /// Route one change to its facet.
    ///
    /// Returns `false` when the interface is not an MPRIS interface and the
    /// change was dropped.
    pub async fn dispatch(&self, change: PropertyChange) -> bool {
        let Some(iface) = MprisInterface::from_name(&change.interface) else {
            debug!(interface = %change.interface, "ignoring change on foreign interface");
            return false;
        };

        self.get(iface).apply(&change.property, change.value).await;
        true
    }
}

impl Default for FacetStates {
    fn default() -> Self {
        Self::new()
    }
}

/// The single `PropertiesChanged` subscription of a session.
///
/// Dropping it aborts the forwarding task.
#[derive(Debug)]
pub struct PropertyWatch {
    handle: JoinHandle<()>,
}

impl PropertyWatch {
    /// Subscribe to `PropertiesChanged` on the MPRIS object of `service` and
    /// forward every change to `states`.
    ///
    /// Notifications are handled one after another in delivery order.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::BindFailure` if the subscription cannot be set up.
    #[instrument(skip(connection, states))]
    pub async fn attach(
        connection: &Connection,
        service: &str,
        states: FacetStates,
    ) -> Result<Self, MprisError> {
        let properties_iface = "org.freedesktop.DBus.Properties";
        let proxy = PropertiesProxy::builder(connection)
            .destination(service.to_string())
            .and_then(|builder| builder.path(MPRIS_PATH))
            .map_err(|e| MprisError::bind(service, properties_iface, e))?
            .build()
            .await
            .map_err(|e| MprisError::bind(service, properties_iface, e))?;

        let mut changes = proxy
            .receive_properties_changed()
            .await
            .map_err(|e| MprisError::bind(service, properties_iface, e))?;

        let handle = tokio::spawn(async move {
            while let Some(signal) = changes.next().await {
                let batch = match signal.args() {
                    Ok(args) => normalise(
                        args.interface_name().as_str(),
                        args.changed_properties()
                            .iter()
                            .map(|(name, value)| (*name, value.try_to_owned())),
                        args.invalidated_properties().iter().copied(),
                    ),
                    Err(e) => {
                        warn!("Malformed PropertiesChanged signal: {e}");
                        continue;
                    }
                };

                for change in batch {
                    states.dispatch(change).await;
                }
            }
            debug!("PropertiesChanged stream ended");
        });

        Ok(Self { handle })
    }

    /// Stop forwarding.
    pub fn detach(self) {
        self.handle.abort();
    }
}

impl Drop for PropertyWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Turn one `PropertiesChanged` payload into individual changes.
///
/// Values come first, then invalidated names. Values that cannot be owned
/// are reported as invalidations so listeners still re-fetch them.
pub fn normalise<'a, E>(
    interface: &str,
    changed: impl IntoIterator<Item = (&'a str, Result<zbus::zvariant::OwnedValue, E>)>,
    invalidated: impl IntoIterator<Item = &'a str>,
) -> Vec<PropertyChange>
where
    E: std::fmt::Display,
{
    let mut changes: Vec<PropertyChange> = changed
        .into_iter()
        .map(|(property, value)| match value {
            Ok(value) => PropertyChange::updated(interface, property, value),
            Err(e) => {
                warn!(interface, property, "cannot own changed value: {e}");
                PropertyChange::invalidated(interface, property)
            }
        })
        .collect();

    changes.extend(
        invalidated
            .into_iter()
            .map(|property| PropertyChange::invalidated(interface, property)),
    );
    changes
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use zbus::zvariant::{OwnedValue, Value};

    use super::*;
    use crate::services::mpris::types::FacetEvent;

    fn owned<'a>(v: impl Into<Value<'a>>) -> OwnedValue {
        v.into().try_to_owned().unwrap()
    }

    #[test]
    fn normalise_keeps_values_and_invalidations() {
        let changes = normalise::<Infallible>(
            "org.mpris.MediaPlayer2.TrackList",
            [("CanEditTracks", Ok(owned(false)))],
            ["Tracks"],
        );

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].property, "CanEditTracks");
        assert!(changes[0].value.is_some());
        assert_eq!(
            changes[1],
            PropertyChange::invalidated("org.mpris.MediaPlayer2.TrackList", "Tracks")
        );
    }

    #[tokio::test]
    async fn dispatch_routes_by_interface() {
        let states = FacetStates::new();
        let mut player_rx = states.player.subscribe();
        let mut base_rx = states.base.subscribe();

        assert!(
            states
                .dispatch(PropertyChange::updated(
                    "org.mpris.MediaPlayer2.Player",
                    "PlaybackStatus",
                    owned("Playing"),
                ))
                .await
        );

        let event = player_rx.recv().await.unwrap();
        assert_eq!(event.name(), "PlaybackStatusChanged");
        assert!(base_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn separate_sessions_do_not_share_state() {
        let first = FacetStates::new();
        let second = FacetStates::new();

        first
            .dispatch(PropertyChange::updated(
                "org.mpris.MediaPlayer2.Player",
                "Volume",
                owned(0.5),
            ))
            .await;

        assert!(first.player.cached("Volume").await.is_some());
        assert!(second.player.cached("Volume").await.is_none());
    }

    #[tokio::test]
    async fn foreign_interfaces_are_ignored() {
        let states = FacetStates::new();
        let mut rx = states.base.subscribe();

        let routed = states
            .dispatch(PropertyChange::updated(
                "org.example.Other",
                "Identity",
                owned("x"),
            ))
            .await;

        assert!(!routed);
        assert!(rx.try_recv().is_err());
        assert!(states.base.cached("Identity").await.is_none());
    }

    #[tokio::test]
    async fn value_less_tracks_change_emits_tracks_changed() {
        let states = FacetStates::new();
        let mut rx = states.track_list.subscribe();

        states
            .dispatch(PropertyChange::invalidated(
                "org.mpris.MediaPlayer2.TrackList",
                "Tracks",
            ))
            .await;

        assert_eq!(
            rx.recv().await.unwrap(),
            FacetEvent::PropertyInvalidated {
                property: "Tracks".into()
            }
        );
        assert!(states.track_list.snapshot().await.is_empty());
    }
}
