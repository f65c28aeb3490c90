use std::{ops::Deref, sync::Arc};

use futures::StreamExt;
use tracing::{instrument, warn};
use zbus::{proxy::CacheProperties, zvariant::ObjectPath};

use super::{Facet, FacetState, SignalForwarders};
use crate::services::mpris::{
    MprisError,
    binder::{self, BindContext},
    contract::{MPRIS_PATH, MprisInterface},
    proxy::{MediaPlayer2PlaylistsProxy, Playlist},
    utils::to_property_value,
};

/// `org.mpris.MediaPlayer2.Playlists`: the player's stored playlists.
#[derive(Clone, Debug)]
pub struct PlaylistsFacet {
    facet: Facet,
    proxy: MediaPlayer2PlaylistsProxy<'static>,
    signals: Arc<SignalForwarders>,
}

impl PlaylistsFacet {
    /// Bind the playlists interface and forward `PlaylistChanged`.
    ///
    /// The `(oss)` signal argument is forwarded as three positional values:
    /// id, name and icon.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::BindFailure` if the interface cannot be resolved
    /// or the signal subscription fails.
    #[instrument(skip_all, fields(service = %ctx.service))]
    pub(crate) async fn bind(
        ctx: &BindContext,
        state: Arc<FacetState>,
    ) -> Result<Self, MprisError> {
        let iface = MprisInterface::Playlists;
        let descriptor = binder::introspect(ctx, iface).await?;

        let proxy = MediaPlayer2PlaylistsProxy::builder(&ctx.connection)
            .destination(ctx.service.clone())
            .and_then(|builder| builder.path(MPRIS_PATH))
            .map_err(|e| ctx.bind_error(iface, e))?
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .map_err(|e| ctx.bind_error(iface, e))?;

        let mut signals = SignalForwarders::default();
        let mut changed = proxy.receive_playlist_changed().await.map_err(|e| {
            ctx.bind_error(iface, format!("PlaylistChanged subscription failed: {e}"))
        })?;
        let target = Arc::clone(&state);
        signals.push(tokio::spawn(async move {
            while let Some(signal) = changed.next().await {
                match signal.args() {
                    Ok(args) => {
                        let playlist = args.playlist();
                        let forwarded = [
                            to_property_value(playlist.id.clone()),
                            to_property_value(playlist.name.as_str()),
                            to_property_value(playlist.icon.as_str()),
                        ];
                        target.emit_signal(
                            "PlaylistChanged",
                            forwarded.into_iter().flatten().collect(),
                        );
                    }
                    Err(e) => warn!("Malformed PlaylistChanged signal: {e}"),
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

    /// Start playing a playlist.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::InvalidOperation` if `playlist_id` is not an
    /// object path, or `MprisError::RemoteCallFailure` if the call fails.
    pub async fn activate_playlist(&self, playlist_id: &str) -> Result<(), MprisError> {
        let playlist = ObjectPath::try_from(playlist_id).map_err(|e| {
            MprisError::invalid(self.interface().name(), format!("invalid playlist id: {e}"))
        })?;
        self.facet
            .remote("ActivatePlaylist", self.proxy.activate_playlist(&playlist))
            .await
    }

    /// A page of playlists in the given ordering.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the call fails.
    pub async fn playlists(
        &self,
        index: u32,
        max_count: u32,
        order: &str,
        reverse_order: bool,
    ) -> Result<Vec<Playlist>, MprisError> {
        self.facet
            .remote(
                "GetPlaylists",
                self.proxy
                    .get_playlists(index, max_count, order, reverse_order),
            )
            .await
    }

    /// Number of playlists.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the read fails.
    pub async fn playlist_count(&self) -> Result<u32, MprisError> {
        self.facet
            .remote("PlaylistCount", self.proxy.playlist_count())
            .await
    }

    /// Stop forwarding this interface's signals.
    pub(crate) fn stop_signals(&self) {
        self.signals.abort();
    }
}

impl Deref for PlaylistsFacet {
    type Target = Facet;

    fn deref(&self) -> &Facet {
        &self.facet
    }
}
