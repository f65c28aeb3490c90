use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::Duration,
};

use tokio::time;
use tracing::{debug, instrument, warn};
use zbus::{Connection, fdo::IntrospectableProxy, zvariant::OwnedValue};
use zbus_xml::Node;

use super::{
    MprisError,
    contract::{MPRIS_PATH, MprisInterface},
    facet::Facet,
};

/// Everything a facet needs to talk to one player.
#[derive(Clone, Debug)]
pub struct BindContext {
    /// Connection the facets' proxies use
    pub connection: Connection,
    /// Bus name of the player
    pub service: String,
    /// Timeout applied to every forwarded call
    pub call_timeout: Duration,
}

impl BindContext {
    pub(crate) fn bind_error(
        &self,
        iface: MprisInterface,
        reason: impl std::fmt::Display,
    ) -> MprisError {
        MprisError::bind(&self.service, iface.name(), reason)
    }
}

/// Introspected members of one interface, checked against its contract.
///
/// Only lives for the duration of a bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInterfaceDescriptor {
    /// Interface the data was read for
    pub interface: MprisInterface,
    /// Advertised methods
    pub methods: BTreeSet<String>,
    /// Advertised readable properties
    pub readable: BTreeSet<String>,
    /// Writable allowlist from the contract
    pub writable: BTreeSet<String>,
    /// Advertised signals
    pub signals: BTreeSet<String>,
}

impl RemoteInterfaceDescriptor {
    /// Read the members of `iface` out of parsed introspection data.
    ///
    /// # Errors
    ///
    /// Returns `MprisError::BindFailure` if the node does not export `iface`.
    pub fn from_node(
        node: &Node<'_>,
        iface: MprisInterface,
        service: &str,
    ) -> Result<Self, MprisError> {
        let remote = node
            .interfaces()
            .iter()
            .find(|candidate| candidate.name().as_str() == iface.name())
            .ok_or_else(|| MprisError::bind(service, iface.name(), "interface not exported"))?;

        Ok(Self {
            interface: iface,
            methods: remote.methods().iter().map(|m| m.name().to_string()).collect(),
            readable: remote
                .properties()
                .iter()
                .filter(|p| p.access().read())
                .map(|p| p.name().to_string())
                .collect(),
            writable: iface
                .contract()
                .writable
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            signals: remote.signals().iter().map(|s| s.name().to_string()).collect(),
        })
    }

    /// Contract members the player does not advertise, as `kind:name`.
    pub fn missing(&self) -> Vec<String> {
        let contract = self.interface.contract();
        let mut missing = Vec::new();

        for method in contract.methods {
            if !self.methods.contains(*method) {
                missing.push(format!("method:{method}"));
            }
        }
        for property in contract.properties {
            if !self.readable.contains(*property) {
                missing.push(format!("property:{property}"));
            }
        }
        for signal in contract.signals {
            if !self.signals.contains(*signal) {
                missing.push(format!("signal:{signal}"));
            }
        }

        missing
    }

    /// Readable properties that are both advertised and in the contract.
    pub fn contract_properties(&self) -> impl Iterator<Item = &str> {
        self.readable
            .iter()
            .map(String::as_str)
            .filter(|name| self.interface.has_property(name))
    }
}

/// Fetch and parse the introspection data of the MPRIS object.
///
/// # Errors
///
/// Returns `MprisError::BindFailure` if the object cannot be introspected or
/// does not export `iface`.
#[instrument(skip(ctx), fields(service = %ctx.service, interface = %iface))]
pub async fn introspect(
    ctx: &BindContext,
    iface: MprisInterface,
) -> Result<RemoteInterfaceDescriptor, MprisError> {
    let proxy = IntrospectableProxy::builder(&ctx.connection)
        .destination(ctx.service.clone())
        .and_then(|builder| builder.path(MPRIS_PATH))
        .map_err(|e| ctx.bind_error(iface, e))?
        .build()
        .await
        .map_err(|e| ctx.bind_error(iface, e))?;

    let xml = proxy
        .introspect()
        .await
        .map_err(|e| ctx.bind_error(iface, e))?;
    let node = Node::from_reader(xml.as_bytes()).map_err(|e| ctx.bind_error(iface, e))?;

    let descriptor = RemoteInterfaceDescriptor::from_node(&node, iface, &ctx.service)?;
    let missing = descriptor.missing();
    if !missing.is_empty() {
        warn!(?missing, "player does not advertise every contract member");
    }

    Ok(descriptor)
}

/// Seed the facet cache from `Properties.GetAll`.
///
/// Falls back to one `Get` per advertised property when the player rejects
/// `GetAll`. Properties that cannot be read are left out of the cache.
pub async fn seed(ctx: &BindContext, facet: &Facet, descriptor: &RemoteInterfaceDescriptor) {
    let iface = descriptor.interface;

    match get_all(ctx, iface).await {
        Ok(values) => {
            for (property, value) in values {
                if iface.has_property(&property) {
                    facet.state().store(&property, Arc::new(value)).await;
                }
            }
            return;
        }
        Err(e) => debug!(interface = %iface, "GetAll failed, reading one by one: {e}"),
    }

    for property in descriptor.contract_properties() {
        match facet.get(property).await {
            Ok(value) => facet.state().store(property, value).await,
            Err(e) => debug!(interface = %iface, property, "initial read failed: {e}"),
        }
    }
}

async fn get_all(
    ctx: &BindContext,
    iface: MprisInterface,
) -> Result<HashMap<String, OwnedValue>, MprisError> {
    let body = (iface.name(),);
    let call = ctx.connection.call_method(
        Some(ctx.service.as_str()),
        MPRIS_PATH,
        Some("org.freedesktop.DBus.Properties"),
        "GetAll",
        &body,
    );

    let reply = time::timeout(ctx.call_timeout, call)
        .await
        .map_err(|_| MprisError::remote(iface.name(), "GetAll", "timed out"))?
        .map_err(|e| MprisError::remote(iface.name(), "GetAll", e))?;

    reply
        .body()
        .deserialize()
        .map_err(|e| MprisError::remote(iface.name(), "GetAll", e))
}
