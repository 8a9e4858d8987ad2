//! Image sources and decoding into bitmaps.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ortho_render::Bitmap;

use crate::error::LoadError;

/// Where the pixels of an image come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// `data:<mime>;base64,<payload>`
    DataUrl(String),
    /// A file path (native) or a URL to fetch (browser)
    Path(String),
    /// Bytes already in memory
    Bytes { name: String, bytes: Vec<u8> },
}

impl ImageSource {
    /// Classify a descriptor `url` as a data URL or a path.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("data:") {
            ImageSource::DataUrl(url.to_string())
        } else {
            ImageSource::Path(url.to_string())
        }
    }

    /// Short label for log messages.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::DataUrl(url) => {
                let header = url.split(',').next().unwrap_or_default();
                format!("{} ({} chars)", header, url.len())
            }
            ImageSource::Path(path) => path.clone(),
            ImageSource::Bytes { name, bytes } => format!("{} ({} bytes)", name, bytes.len()),
        }
    }

    /// Read the encoded bytes without touching the network.
    ///
    /// Paths are read from disk on native targets. In the browser a path
    /// must go through a fetching backend instead.
    pub fn read_bytes(self) -> Result<Vec<u8>, LoadError> {
        match self {
            ImageSource::DataUrl(url) => decode_data_url(&url),
            ImageSource::Bytes { bytes, .. } => Ok(bytes),
            #[cfg(not(target_arch = "wasm32"))]
            ImageSource::Path(path) => {
                std::fs::read(&path).map_err(|e| LoadError::fetch(path, e.to_string()))
            }
            #[cfg(target_arch = "wasm32")]
            ImageSource::Path(path) => Err(LoadError::fetch(
                path,
                "paths must be fetched asynchronously in the browser",
            )),
        }
    }
}

/// Extract the payload of a base64 `data:` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, LoadError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| LoadError::invalid_data_url("missing 'data:' prefix"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| LoadError::invalid_data_url("missing ',' separator"))?;

    if !header.ends_with(";base64") {
        return Err(LoadError::invalid_data_url(format!(
            "unsupported encoding '{}', expected base64",
            header
        )));
    }

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| LoadError::invalid_data_url(e.to_string()))
}

/// Decode PNG/JPEG/... bytes into an RGBA bitmap.
pub fn decode_bytes(bytes: &[u8]) -> Result<Bitmap, LoadError> {
    let image = image::load_from_memory(bytes).map_err(|e| LoadError::decode(e.to_string()))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(LoadError::decode(format!("empty image {}x{}", width, height)));
    }

    log::debug!("Decoded {}x{} image from {} bytes", width, height, bytes.len());
    Bitmap::from_rgba8(rgba.into_raw(), width, height).map_err(|e| LoadError::decode(e.to_string()))
}

/// Read and decode `source` on the calling thread.
pub fn load_blocking(source: ImageSource) -> Result<Bitmap, LoadError> {
    let bytes = source.read_bytes()?;
    decode_bytes(&bytes)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_classification() {
        assert!(matches!(
            ImageSource::from_url("data:image/png;base64,AAAA"),
            ImageSource::DataUrl(_)
        ));
        assert_eq!(
            ImageSource::from_url("/images/sample-1.jpg"),
            ImageSource::Path("/images/sample-1.jpg".to_string())
        );
    }

    #[test]
    fn test_data_url_roundtrip_decodes() {
        let url = fixtures::png_data_url(3, 2, [10, 20, 30, 255]);
        let bitmap = load_blocking(ImageSource::from_url(&url)).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (3, 2));
        assert_eq!(&bitmap.data()[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_data_url_errors() {
        assert!(matches!(
            decode_data_url("image/png;base64,AAAA"),
            Err(LoadError::InvalidDataUrl { .. })
        ));
        assert!(matches!(
            decode_data_url("data:image/png;base64"),
            Err(LoadError::InvalidDataUrl { .. })
        ));
        assert!(matches!(
            decode_data_url("data:text/plain,hello"),
            Err(LoadError::InvalidDataUrl { .. })
        ));
        assert!(matches!(
            decode_data_url("data:image/png;base64,!!!"),
            Err(LoadError::InvalidDataUrl { .. })
        ));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = decode_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_blocking(ImageSource::Path("/nonexistent/xray.png".to_string())).unwrap_err();
        assert!(matches!(err, LoadError::Fetch { .. }));
    }
}
