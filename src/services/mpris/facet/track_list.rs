use std::{ops::Deref, sync::Arc};

use futures::StreamExt;
use tracing::{instrument, warn};
use zbus::{
    proxy::CacheProperties,
    zvariant::{ObjectPath, OwnedObjectPath},
};

use super::{Facet, FacetState, SignalForwarders};
use crate::services::mpris::{
    MprisError,
    binder::{self, BindContext},
    contract::{MPRIS_PATH, MprisInterface},
    proxy::{MediaPlayer2TrackListProxy, MetadataMap},
    utils::{metadata_value, to_property_value},
};

/// `org.mpris.MediaPlayer2.TrackList`: the play queue.
///
/// Players usually announce `Tracks` changes without a value, which surfaces
/// as a value-less `TracksChanged` event. Call [`TrackListFacet::tracks`]
/// to re-fetch the list.
#[derive(Clone, Debug)]
pub struct TrackListFacet {
    facet: Facet,
    proxy: MediaPlayer2TrackListProxy<'static>,
    signals: Arc<SignalForwarders>,
}

impl TrackListFacet {
    /// Bind the track list interface and forward its four signals.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::BindFailure` if the interface cannot be resolved
    /// or a signal subscription fails.
    #[instrument(skip_all, fields(service = %ctx.service))]
    pub(crate) async fn bind(
        ctx: &BindContext,
        state: Arc<FacetState>,
    ) -> Result<Self, MprisError> {
        let iface = MprisInterface::TrackList;
        let descriptor = binder::introspect(ctx, iface).await?;

        let proxy = MediaPlayer2TrackListProxy::builder(&ctx.connection)
            .destination(ctx.service.clone())
            .and_then(|builder| builder.path(MPRIS_PATH))
            .map_err(|e| ctx.bind_error(iface, e))?
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .map_err(|e| ctx.bind_error(iface, e))?;

        let subscribe_error = |signal: &str, e: zbus::Error| {
            ctx.bind_error(iface, format!("{signal} subscription failed: {e}"))
        };
        let mut signals = SignalForwarders::default();

        let mut replaced = proxy
            .receive_track_list_replaced()
            .await
            .map_err(|e| subscribe_error("TrackListReplaced", e))?;
        let target = Arc::clone(&state);
        signals.push(tokio::spawn(async move {
            while let Some(signal) = replaced.next().await {
                match signal.args() {
                    Ok(args) => {
                        let forwarded = [
                            to_property_value(args.tracks().clone()),
                            to_property_value(args.current_track().clone()),
                        ];
                        target.emit_signal(
                            "TrackListReplaced",
                            forwarded.into_iter().flatten().collect(),
                        );
                    }
                    Err(e) => warn!("Malformed TrackListReplaced signal: {e}"),
                }
            }
        }));

        let mut added = proxy
            .receive_track_added()
            .await
            .map_err(|e| subscribe_error("TrackAdded", e))?;
        let target = Arc::clone(&state);
        signals.push(tokio::spawn(async move {
            while let Some(signal) = added.next().await {
                match signal.args() {
                    Ok(args) => {
                        let forwarded = [
                            metadata_value(args.metadata()),
                            to_property_value(args.after_track().clone()),
                        ];
                        target.emit_signal("TrackAdded", forwarded.into_iter().flatten().collect());
                    }
                    Err(e) => warn!("Malformed TrackAdded signal: {e}"),
                }
            }
        }));

        let mut removed = proxy
            .receive_track_removed()
            .await
            .map_err(|e| subscribe_error("TrackRemoved", e))?;
        let target = Arc::clone(&state);
        signals.push(tokio::spawn(async move {
            while let Some(signal) = removed.next().await {
                match signal.args() {
                    Ok(args) => {
                        let forwarded = to_property_value(args.track_id().clone());
                        target.emit_signal("TrackRemoved", forwarded.into_iter().collect());
                    }
                    Err(e) => warn!("Malformed TrackRemoved signal: {e}"),
                }
            }
        }));

        let mut metadata_changed = proxy
            .receive_track_metadata_changed()
            .await
            .map_err(|e| subscribe_error("TrackMetadataChanged", e))?;
        let target = Arc::clone(&state);
        signals.push(tokio::spawn(async move {
            while let Some(signal) = metadata_changed.next().await {
                match signal.args() {
                    Ok(args) => {
                        let forwarded = [
                            to_property_value(args.track_id().clone()),
                            metadata_value(args.metadata()),
                        ];
                        target.emit_signal(
                            "TrackMetadataChanged",
                            forwarded.into_iter().flatten().collect(),
                        );
                    }
                    Err(e) => warn!("Malformed TrackMetadataChanged signal: {e}"),
                }
            }
        }));

        let facet = Facet::new(proxy.inner().clone(), state, ctx.call_timeout);
        binder::seed(ctx, &facet, &descriptor).await;

        Ok(Self {
            facet,
            proxy,
            signals: Arc::new(signals),
        })
    }

    /// Track identifiers in play order.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the read fails.
    pub async fn tracks(&self) -> Result<Vec<OwnedObjectPath>, MprisError> {
        self.facet.remote("Tracks", self.proxy.tracks()).await
    }

    /// Metadata for the given tracks, in the same order.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the call fails.
    pub async fn tracks_metadata(
        &self,
        track_ids: &[OwnedObjectPath],
    ) -> Result<Vec<MetadataMap>, MprisError> {
        let paths: Vec<ObjectPath<'static>> = track_ids
            .iter()
            .map(|id| id.clone().into_inner())
            .collect();
        self.facet
            .remote("GetTracksMetadata", self.proxy.get_tracks_metadata(&paths))
            .await
    }

    /// Insert `uri` after `after_track`.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::InvalidOperation` if `after_track` is not an
    /// object path, or `MprisError::RemoteCallFailure` if the call fails.
    pub async fn add_track(
        &self,
        uri: &str,
        after_track: &str,
        set_as_current: bool,
    ) -> Result<(), MprisError> {
        let after = self.track_path(after_track)?;
        self.facet
            .remote("AddTrack", self.proxy.add_track(uri, &after, set_as_current))
            .await
    }

    /// Remove a track from the list.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::InvalidOperation` if `track_id` is not an object
    /// path, or `MprisError::RemoteCallFailure` if the call fails.
    pub async fn remove_track(&self, track_id: &str) -> Result<(), MprisError> {
        let track = self.track_path(track_id)?;
        self.facet
            .remote("RemoveTrack", self.proxy.remove_track(&track))
            .await
    }

    /// Skip to a track.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::InvalidOperation` if `track_id` is not an object
    /// path, or `MprisError::RemoteCallFailure` if the call fails.
    pub async fn go_to(&self, track_id: &str) -> Result<(), MprisError> {
        let track = self.track_path(track_id)?;
        self.facet.remote("GoTo", self.proxy.go_to(&track)).await
    }

    fn track_path<'a>(&self, track_id: &'a str) -> Result<ObjectPath<'a>, MprisError> {
        ObjectPath::try_from(track_id).map_err(|e| {
            MprisError::invalid(self.interface().name(), format!("invalid track id: {e}"))
        })
    }

    /// Stop forwarding this interface's signals.
    pub(crate) fn stop_signals(&self) {
        self.signals.abort();
    }
}

impl Deref for TrackListFacet {
    type Target = Facet;

    fn deref(&self) -> &Facet {
        &self.facet
    }
}
