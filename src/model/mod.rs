//! Data models handed to the canvas by the upload flow.
//!
//! All of these are read-only inputs. Deserialization is lenient: a
//! malformed field degrades to its neutral default instead of failing the
//! whole payload, so a partially corrupt session still displays.

mod descriptor;
mod detection;
mod stored;

pub use descriptor::ImageDescriptor;
pub use detection::{BoundingBox, Classification, Detection, DetectionResult};
pub use stored::StoredSession;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Deserialize a field, falling back to `T::default()` when the value has
/// the wrong shape.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(&value).unwrap_or_else(|e| {
        log::warn!("Ignoring malformed field ({}), using default", e);
        T::default()
    }))
}

/// Deserialize a list, keeping the elements that parse and dropping the rest.
pub(crate) fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => return Ok(Vec::new()),
        other => {
            log::warn!("Expected a list, got {}; using an empty list", other);
            return Ok(Vec::new());
        }
    };

    Ok(items
        .iter()
        .filter_map(|item| match T::deserialize(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::warn!("Dropping malformed list entry {}: {}", item, e);
                None
            }
        })
        .collect())
}
