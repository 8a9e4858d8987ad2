//! Out-of-band image loading with stale-result protection.
//!
//! Every call to [`ImageLoader::load`] starts a new generation. A backend
//! may finish loads in any order; only the result whose generation matches
//! the latest request is handed back, everything else is dropped.

mod inline;
mod source;
#[cfg(not(target_arch = "wasm32"))]
mod thread;
#[cfg(target_arch = "wasm32")]
mod fetch;

pub use inline::InlineDecoder;
pub use source::{ImageSource, decode_bytes, decode_data_url, load_blocking};
#[cfg(not(target_arch = "wasm32"))]
pub use thread::ThreadDecoder;
#[cfg(target_arch = "wasm32")]
pub use fetch::FetchDecoder;

#[cfg(test)]
pub(crate) use source::fixtures;

use ortho_render::Bitmap;

use crate::error::LoadError;

/// A finished decode reported by a backend.
#[derive(Debug)]
pub struct Completed {
    pub generation: u64,
    pub result: Result<Bitmap, LoadError>,
}

/// Something that turns image sources into bitmaps, possibly later.
pub trait DecodeBackend {
    /// Start loading `source`. The result must carry `generation`.
    fn submit(&mut self, generation: u64, source: ImageSource);

    /// Completed loads, without blocking.
    fn take_results(&mut self) -> Vec<Completed>;

    fn name(&self) -> &'static str;
}

/// Identifies one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// How a load ended.
#[derive(Debug)]
pub enum LoadOutcome {
    Ready(Bitmap),
    /// The image could not be read or decoded
    Failed(LoadError),
}

/// Result of the current load, delivered once.
#[derive(Debug)]
pub struct LoadEvent {
    pub ticket: LoadTicket,
    pub outcome: LoadOutcome,
}

/// Tracks the latest load request and filters backend results.
pub struct ImageLoader {
    backend: Box<dyn DecodeBackend>,
    next_generation: u64,
    current: Option<LoadTicket>,
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("backend", &self.backend.name())
            .field("next_generation", &self.next_generation)
            .field("current", &self.current)
            .finish()
    }
}

impl ImageLoader {
    pub fn new(backend: impl DecodeBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            next_generation: 1,
            current: None,
        }
    }

    /// Loader that decodes on the calling thread.
    pub fn inline() -> Self {
        Self::new(InlineDecoder::default())
    }

    /// Background thread decoding, or inline decoding if no thread can be spawned.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn platform_default() -> Self {
        match ThreadDecoder::spawn() {
            Ok(decoder) => Self::new(decoder),
            Err(e) => {
                log::warn!("{}; decoding on the main thread", e);
                Self::inline()
            }
        }
    }

    /// Fetch-and-decode in the browser.
    #[cfg(target_arch = "wasm32")]
    pub fn platform_default() -> Self {
        Self::new(FetchDecoder::new())
    }

    /// Start loading `source`, superseding any load in flight.
    pub fn load(&mut self, source: ImageSource) -> LoadTicket {
        let ticket = LoadTicket {
            generation: self.next_generation,
        };
        self.next_generation += 1;

        if let Some(previous) = self.current.replace(ticket) {
            log::debug!(
                "Load {} superseded by load {}",
                previous.generation,
                ticket.generation
            );
        }
        log::info!(
            "Loading image {} via {} (load {})",
            source.describe(),
            self.backend.name(),
            ticket.generation
        );
        self.backend.submit(ticket.generation, source);
        ticket
    }

    /// Forget the load in flight. Its result will be discarded.
    pub fn cancel(&mut self) {
        if let Some(ticket) = self.current.take() {
            log::debug!("Load {} cancelled", ticket.generation);
        }
    }

    pub fn is_loading(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<LoadTicket> {
        self.current
    }

    /// Collect backend results and return the current load's, if finished.
    pub fn poll(&mut self) -> Option<LoadEvent> {
        let mut event = None;
        for completed in self.backend.take_results() {
            match self.current {
                Some(ticket) if ticket.generation == completed.generation => {
                    self.current = None;
                    let outcome = match completed.result {
                        Ok(bitmap) => LoadOutcome::Ready(bitmap),
                        Err(e) => {
                            log::warn!("Load {} failed: {}", ticket.generation, e);
                            LoadOutcome::Failed(e)
                        }
                    };
                    event = Some(LoadEvent { ticket, outcome });
                }
                _ => log::debug!("Discarding stale load {}", completed.generation),
            }
        }
        event
    }
}
