//! The session blob written by the upload page and read at mount.

use serde::{Deserialize, Serialize};

use super::{DetectionResult, ImageDescriptor};
use crate::error::SessionError;

/// Image descriptor plus optional detection result, stored flat:
/// the descriptor fields sit at the top level next to `detectionResult`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSession {
    #[serde(flatten)]
    pub image: ImageDescriptor,
    #[serde(rename = "detectionResult", skip_serializing_if = "Option::is_none")]
    pub detection_result: Option<DetectionResult>,
}

impl StoredSession {
    pub fn new(image: ImageDescriptor, detection_result: Option<DetectionResult>) -> Self {
        Self {
            image,
            detection_result,
        }
    }

    /// Parse a stored blob.
    ///
    /// Fails only when the blob is not JSON or has no usable image
    /// descriptor; a corrupt detection result is dropped with a warning.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let image = ImageDescriptor::deserialize(&value)?;

        let detection_result = match value.get("detectionResult") {
            None | Some(serde_json::Value::Null) => None,
            Some(raw) => match DetectionResult::deserialize(raw) {
                Ok(result) => Some(result),
                Err(e) => {
                    log::warn!("Discarding unreadable detection result: {}", e);
                    None
                }
            },
        };

        Ok(Self {
            image,
            detection_result,
        })
    }

    /// Parse an optional blob, mapping absence to [`SessionError::Missing`].
    pub fn from_stored(json: Option<&str>) -> Result<Self, SessionError> {
        Self::from_json(json.ok_or(SessionError::Missing)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Read the blob from `sessionStorage` (WASM only).
    #[cfg(target_arch = "wasm32")]
    pub fn load_from_session_storage() -> Result<Self, SessionError> {
        let json = web_sys::window()
            .and_then(|w| w.session_storage().ok().flatten())
            .and_then(|s| s.get_item(crate::constants::SESSION_STORAGE_KEY).ok().flatten());
        Self::from_stored(json.as_deref())
    }

    /// Remove the blob from `sessionStorage` (WASM only).
    #[cfg(target_arch = "wasm32")]
    pub fn clear_session_storage() {
        if let Some(storage) = web_sys::window().and_then(|w| w.session_storage().ok().flatten()) {
            let _ = storage.remove_item(crate::constants::SESSION_STORAGE_KEY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_blob() {
        let json = r#"{
            "name": "hand.jpg", "size": 1024, "type": "image/jpeg",
            "url": "/images/hand.jpg",
            "detectionResult": {"class": "Fractured", "imageWidth": 10, "imageHeight": 10, "detections": []}
        }"#;
        let session = StoredSession::from_json(json).unwrap();
        assert_eq!(session.image.name, "hand.jpg");
        let result = session.detection_result.expect("result");
        assert!(result.classification.is_fractured());
    }

    #[test]
    fn test_corrupt_result_is_dropped() {
        let json = r#"{"url": "/a.png", "detectionResult": "oops"}"#;
        let session = StoredSession::from_json(json).unwrap();
        assert!(session.detection_result.is_none());
    }

    #[test]
    fn test_unreadable_blob() {
        assert!(matches!(
            StoredSession::from_json("{not json"),
            Err(SessionError::Parse(_))
        ));
        assert!(matches!(
            StoredSession::from_json(r#"{"name": "no url"}"#),
            Err(SessionError::Parse(_))
        ));
        assert!(matches!(
            StoredSession::from_stored(None),
            Err(SessionError::Missing)
        ));
    }

    #[test]
    fn test_to_json_is_flat() {
        let session = StoredSession::new(ImageDescriptor::new("/x.png").with_name("x.png"), None);
        let value: serde_json::Value = serde_json::from_str(&session.to_json().unwrap()).unwrap();
        assert_eq!(value["url"], "/x.png");
        assert_eq!(value["name"], "x.png");
        assert!(value.get("detectionResult").is_none());
        assert!(value.get("image").is_none());
    }
}
