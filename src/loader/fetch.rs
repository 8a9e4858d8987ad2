//! Browser backend: fetches path URLs and decodes on the main thread.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_net::http::Request;

use super::{Completed, DecodeBackend, ImageSource, decode_bytes, load_blocking};
use crate::error::LoadError;

/// Results land in a shared queue filled by spawned futures and drained by
/// [`DecodeBackend::take_results`].
#[derive(Debug, Default)]
pub struct FetchDecoder {
    results: Rc<RefCell<Vec<Completed>>>,
}

impl FetchDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecodeBackend for FetchDecoder {
    fn submit(&mut self, generation: u64, source: ImageSource) {
        match source {
            ImageSource::Path(url) => {
                let results = Rc::clone(&self.results);
                wasm_bindgen_futures::spawn_local(async move {
                    let result = match fetch_binary(&url).await {
                        Ok(bytes) => decode_bytes(&bytes),
                        Err(e) => Err(e),
                    };
                    results.borrow_mut().push(Completed { generation, result });
                });
            }
            other => {
                let result = load_blocking(other);
                self.results.borrow_mut().push(Completed { generation, result });
            }
        }
    }

    fn take_results(&mut self) -> Vec<Completed> {
        std::mem::take(&mut *self.results.borrow_mut())
    }

    fn name(&self) -> &'static str {
        "fetch"
    }
}

async fn fetch_binary(url: &str) -> Result<Vec<u8>, LoadError> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| LoadError::fetch(url, e.to_string()))?;

    if !resp.ok() {
        return Err(LoadError::fetch(url, format!("HTTP {}", resp.status())));
    }

    resp.binary()
        .await
        .map_err(|e| LoadError::fetch(url, e.to_string()))
}
