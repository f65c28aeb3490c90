use std::{ops::Deref, sync::Arc};

use tracing::instrument;
use zbus::proxy::CacheProperties;

use super::{Facet, FacetState};
use crate::services::mpris::{
    MprisError,
    binder::{self, BindContext},
    contract::{MPRIS_PATH, MprisInterface},
    proxy::MediaPlayer2Proxy,
};

/// `org.mpris.MediaPlayer2`: identity, capabilities, raise and quit.
///
/// The base interface has no signals.
#[derive(Clone, Debug)]
pub struct BaseFacet {
    facet: Facet,
    proxy: MediaPlayer2Proxy<'static>,
}

impl BaseFacet {
    /// Bind the base interface of the player behind `ctx`.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::BindFailure` if the interface cannot be resolved.
    #[instrument(skip_all, fields(service = %ctx.service))]
    pub(crate) async fn bind(
        ctx: &BindContext,
        state: Arc<FacetState>,
    ) -> Result<Self, MprisError> {
        let iface = MprisInterface::Base;
        let descriptor = binder::introspect(ctx, iface).await?;

        let proxy = MediaPlayer2Proxy::builder(&ctx.connection)
            .destination(ctx.service.clone())
            .and_then(|builder| builder.path(MPRIS_PATH))
            .map_err(|e| ctx.bind_error(iface, e))?
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .map_err(|e| ctx.bind_error(iface, e))?;

        let facet = Facet::new(proxy.inner().clone(), state, ctx.call_timeout);
        binder::seed(ctx, &facet, &descriptor).await;

        Ok(Self { facet, proxy })
    }

    /// Bring the player's window to the front.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the call fails.
    pub async fn raise(&self) -> Result<(), MprisError> {
        self.facet.remote("Raise", self.proxy.raise()).await
    }

    /// Ask the player to exit.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the call fails.
    pub async fn quit(&self) -> Result<(), MprisError> {
        self.facet.remote("Quit", self.proxy.quit()).await
    }

    /// Human-readable player name.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the read fails.
    pub async fn identity(&self) -> Result<String, MprisError> {
        self.facet.remote("Identity", self.proxy.identity()).await
    }

    /// URI schemes the player can open.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the read fails.
    pub async fn supported_uri_schemes(&self) -> Result<Vec<String>, MprisError> {
        self.facet
            .remote("SupportedUriSchemes", self.proxy.supported_uri_schemes())
            .await
    }

    /// MIME types the player can play.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the read fails.
    pub async fn supported_mime_types(&self) -> Result<Vec<String>, MprisError> {
        self.facet
            .remote("SupportedMimeTypes", self.proxy.supported_mime_types())
            .await
    }

    /// Switch fullscreen mode.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::RemoteCallFailure` if the write fails.
    pub async fn set_fullscreen(&self, fullscreen: bool) -> Result<(), MprisError> {
        self.facet.set("Fullscreen", fullscreen).await
    }
}

impl Deref for BaseFacet {
    type Target = Facet;

    fn deref(&self) -> &Facet {
        &self.facet
    }
}
