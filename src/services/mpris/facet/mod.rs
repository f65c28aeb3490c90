//! Local facets of the remote player object.
//!
//! [`Facet`] is the contract-checked, dynamic view of one MPRIS interface.
//! The typed wrappers add convenience methods on top of it and own the tasks
//! that forward the interface's signals.

mod base;
mod player;
mod playlists;
mod state;
mod track_list;

use std::{future::Future, sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{task::JoinHandle, time::timeout};
use tracing::debug;
use zbus::zvariant::{DynamicDeserialize, DynamicType, OwnedValue, Value};

pub use base::BaseFacet;
pub use player::PlayerFacet;
pub use playlists::PlaylistsFacet;
pub use state::FacetState;
pub use track_list::TrackListFacet;

use super::{MprisError, contract::MprisInterface, types::PropertyValue};

/// Dynamic, contract-checked access to one bound interface.
///
/// Methods, getters and setters are validated against the static interface
/// contract before anything is sent on the bus.
#[derive(Clone, Debug)]
pub struct Facet {
    proxy: zbus::Proxy<'static>,
    state: Arc<FacetState>,
    call_timeout: Duration,
}

impl Facet {
    pub(crate) fn new(
        proxy: zbus::Proxy<'static>,
        state: Arc<FacetState>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            proxy,
            state,
            call_timeout,
        }
    }

    /// Interface this facet is bound to.
    pub fn interface(&self) -> MprisInterface {
        self.state.interface()
    }

    /// Cache and event channel shared with the property forwarder.
    pub fn state(&self) -> &Arc<FacetState> {
        &self.state
    }

    /// Call a method of the interface with positional arguments.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::InvalidOperation` if the method is not part of the
    /// interface, or `MprisError::RemoteCallFailure` if the call fails or
    /// exceeds the call timeout.
    pub async fn call<B, R>(&self, method: &str, args: &B) -> Result<R, MprisError>
    where
        B: Serialize + DynamicType,
        R: for<'d> DynamicDeserialize<'d>,
    {
        let iface = self.interface();
        iface.check_method(method)?;

        debug!(interface = %iface, method, "calling remote method");
        self.remote(method, self.proxy.call(method, args)).await
    }

    /// Read a property from the player.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::InvalidOperation` for properties outside the
    /// interface, or `MprisError::RemoteCallFailure` if the read fails.
    pub async fn get(&self, property: &str) -> Result<PropertyValue, MprisError> {
        self.interface().check_property(property)?;

        let value: OwnedValue = self
            .remote(property, self.proxy.get_property(property))
            .await?;
        Ok(Arc::new(value))
    }

    /// Write a property on the player and cache the written value.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::InvalidOperation` if the property is not on the
    /// writable allowlist of the interface, or `MprisError::RemoteCallFailure`
    /// if the write fails.
    pub async fn set<'t, T>(&self, property: &str, value: T) -> Result<(), MprisError>
    where
        T: 't + Into<Value<'t>>,
    {
        let iface = self.interface();
        iface.check_writable(property)?;

        let value: Value<'t> = value.into();
        let cached = value
            .try_to_owned()
            .map_err(|e| MprisError::remote(iface.name(), property, e))?;

        debug!(interface = %iface, property, "writing remote property");
        match timeout(self.call_timeout, self.proxy.set_property(property, value)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(MprisError::remote(iface.name(), property, e)),
            Err(_) => return Err(self.timed_out(property)),
        }

        self.state.store(property, Arc::new(cached)).await;
        Ok(())
    }

    /// Last value observed for `property` without a bus round trip.
    pub async fn cached(&self, property: &str) -> Option<PropertyValue> {
        self.state.cached(property).await
    }

    /// Run a remote operation under the call timeout.
    pub(crate) async fn remote<T>(
        &self,
        member: &str,
        call: impl Future<Output = zbus::Result<T>>,
    ) -> Result<T, MprisError> {
        match timeout(self.call_timeout, call).await {
            Ok(result) => {
                result.map_err(|e| MprisError::remote(self.interface().name(), member, e))
            }
            Err(_) => Err(self.timed_out(member)),
        }
    }

    fn timed_out(&self, member: &str) -> MprisError {
        MprisError::remote(
            self.interface().name(),
            member,
            format!("no reply within {:?}", self.call_timeout),
        )
    }
}

/// Signal forwarding tasks of one bound facet, aborted on drop.
#[derive(Debug, Default)]
pub(crate) struct SignalForwarders {
    handles: Vec<JoinHandle<()>>,
}

impl SignalForwarders {
    pub(crate) fn push(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    pub(crate) fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

impl Drop for SignalForwarders {
    fn drop(&mut self) {
        self.abort();
    }
}
