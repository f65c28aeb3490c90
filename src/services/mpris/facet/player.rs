use std::{ops::Deref, sync::Arc, time::Duration};

use futures::{Stream, StreamExt};
use tracing::{instrument, warn};
use zbus::{proxy::CacheProperties, zvariant::ObjectPath};

use super::{Facet, FacetState, SignalForwarders};
use crate::services::mpris::{
    MprisError,
    binder::{self, BindContext},
    contract::{MPRIS_PATH, MprisInterface},
    proxy::{MediaPlayer2PlayerProxy, MetadataMap},
    types::{LoopStatus, PlaybackState},
    utils,
};

/// `org.mpris.MediaPlayer2.Player`: playback control and state.
#[derive(Clone, Debug)]
pub struct PlayerFacet {
    facet: Facet,
    proxy: MediaPlayer2PlayerProxy<'static>,
    signals: Arc<SignalForwarders>,
}

impl PlayerFacet {
    /// Bind the player interface and start forwarding `Seeked`.
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
        let iface = MprisInterface::Player;
        let descriptor = binder::introspect(ctx, iface).await?;

        let proxy = MediaPlayer2PlayerProxy::builder(&ctx.connection)
            .destination(ctx.service.clone())
            .and_then(|builder| builder.path(MPRIS_PATH))
            .map_err(|e| ctx.bind_error(iface, e))?
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .map_err(|e| ctx.bind_error(iface, e))?;

        let mut signals = SignalForwarders::default();
        let mut seeked = proxy
            .receive_seeked()
            .await
            .map_err(|e| ctx.bind_error(iface, format!("Seeked subscription failed: {e}")))?;
        let seeked_state = Arc::clone(&state);
        signals.push(tokio::spawn(async move {
            while let Some(signal) = seeked.next().await {
                match signal.args() {
                    Ok(args) => {
                        let args = utils::to_property_value(*args.position()).into_iter().collect();
                        seeked_state.emit_signal("Seeked", args);
                    }
                    Err(e) => warn!("Malformed Seeked signal: {e}"),
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

    /// Start playback.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the call fails.
    pub async fn play(&self) -> Result<(), MprisError> {
        self.facet.remote("Play", self.proxy.play()).await
    }

    /// Pause playback.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the call fails.
    pub async fn pause(&self) -> Result<(), MprisError> {
        self.facet.remote("Pause", self.proxy.pause()).await
    }

    /// Play or pause playback.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the call fails.
    pub async fn play_pause(&self) -> Result<(), MprisError> {
        self.facet.remote("PlayPause", self.proxy.play_pause()).await
    }

    /// Stop playback.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the call fails.
    pub async fn stop(&self) -> Result<(), MprisError> {
        self.facet.remote("Stop", self.proxy.stop()).await
    }

    /// Skip to next track.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the call fails.
    pub async fn next(&self) -> Result<(), MprisError> {
        self.facet.remote("Next", self.proxy.next()).await
    }

    /// Go to previous track.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the call fails.
    pub async fn previous(&self) -> Result<(), MprisError> {
        self.facet.remote("Previous", self.proxy.previous()).await
    }

    /// Seek by a signed offset in microseconds.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the call fails.
    pub async fn seek(&self, offset_micros: i64) -> Result<(), MprisError> {
        self.facet.remote("Seek", self.proxy.seek(offset_micros)).await
    }

    /// Jump to an absolute position within `track_id`.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::InvalidOperation` if `track_id` is not an object
    /// path, or `MprisError::RemoteCallFailure` if the call fails.
    pub async fn set_position(&self, track_id: &str, position: Duration) -> Result<(), MprisError> {
        let track = ObjectPath::try_from(track_id).map_err(|e| {
            MprisError::invalid(self.interface().name(), format!("invalid track id: {e}"))
        })?;

        self.facet
            .remote(
                "SetPosition",
                self.proxy
                    .set_position(&track, utils::to_mpris_micros(position)),
            )
            .await
    }

    /// Open a URI and start playing it.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the call fails.
    pub async fn open_uri(&self, uri: &str) -> Result<(), MprisError> {
        self.facet.remote("OpenUri", self.proxy.open_uri(uri)).await
    }

    /// Current playback state.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the read fails.
    pub async fn playback_status(&self) -> Result<PlaybackState, MprisError> {
        let status = self
            .facet
            .remote("PlaybackStatus", self.proxy.playback_status())
            .await?;
        Ok(PlaybackState::from(status.as_str()))
    }

    /// Metadata of the current track.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the read fails.
    pub async fn metadata(&self) -> Result<MetadataMap, MprisError> {
        self.facet.remote("Metadata", self.proxy.metadata()).await
    }

    /// Current playback position.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the read fails.
    pub async fn position(&self) -> Result<Duration, MprisError> {
        let micros = self.facet.remote("Position", self.proxy.position()).await?;
        Ok(utils::from_mpris_micros(micros))
    }

    /// Set the volume (1.0 is 100%).
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the write fails.
    pub async fn set_volume(&self, volume: f64) -> Result<(), MprisError> {
        self.facet.set("Volume", volume).await
    }

    /// Set the playback rate.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the write fails.
    pub async fn set_rate(&self, rate: f64) -> Result<(), MprisError> {
        self.facet.set("Rate", rate).await
    }

    /// Enable or disable shuffle.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the write fails.
    pub async fn set_shuffle(&self, shuffle: bool) -> Result<(), MprisError> {
        self.facet.set("Shuffle", shuffle).await
    }

    /// Set the loop status.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the write fails.
    pub async fn set_loop_status(&self, status: LoopStatus) -> Result<(), MprisError> {
        self.facet.set("LoopStatus", status.as_str()).await
    }

    /// Poll the playback position.
    ///
    /// `Position` is not announced through `PropertiesChanged`, so it has to
    /// be polled. Only emits when the position actually changes and ends on
    /// the first failed read.
    pub fn watch_position(
        &self,
        interval: Duration,
    ) -> impl Stream<Item = Duration> + Send + use<> {
        let player = self.clone();
        async_stream::stream! {
            let mut last_position: Option<Duration> = None;

            loop {
                match player.position().await {
                    Ok(position) => {
                        if last_position != Some(position) {
                            last_position = Some(position);
                            yield position;
                        }
                    }
                    Err(_) => break,
                }
                tokio::time::sleep(interval).await;
            }
        }
    }

    /// Stop forwarding this interface's signals.
    pub(crate) fn stop_signals(&self) {
        self.signals.abort();
    }
}

impl Deref for PlayerFacet {
    type Target = Facet;

    fn deref(&self) -> &Facet {
        &self.facet
    }
}
