use std::{collections::HashMap, sync::Arc, time::Duration};

use tracing::warn;
use zbus::zvariant::{OwnedValue, Value};

use super::{proxy::MetadataMap, types::PropertyValue};

/// Convert Duration to MPRIS position in microseconds
pub fn to_mpris_micros(duration: Duration) -> i64 {
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}

/// Convert MPRIS microseconds to Duration, clamping negatives to zero
pub fn from_mpris_micros(micros: i64) -> Duration {
    Duration::from_micros(u64::try_from(micros).unwrap_or(0))
}

/// Own a D-Bus value so it can be cached or forwarded.
pub(crate) fn to_property_value<'a>(value: impl Into<Value<'a>>) -> Option<PropertyValue> {
    match value.into().try_to_owned() {
        Ok(owned) => Some(Arc::new(owned)),
        Err(e) => {
            warn!("Dropping value that cannot be owned: {e}");
            None
        }
    }
}

/// Pack a metadata map back into a single `a{sv}` value.
pub(crate) fn metadata_value(metadata: &MetadataMap) -> Option<PropertyValue> {
    let entries: HashMap<String, Value<'static>> = metadata
        .iter()
        .filter_map(|(key, value)| {
            value
                .try_clone()
                .ok()
                .map(|value: OwnedValue| (key.clone(), Value::from(value)))
        })
        .collect();
    to_property_value(entries)
}
