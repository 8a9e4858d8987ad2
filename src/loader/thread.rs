//! Background thread for image decoding (native only).

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use super::{Completed, DecodeBackend, ImageSource, load_blocking};
use crate::error::LoadError;

/// Message sent to the decoder thread.
enum ThreadMessage {
    Decode { generation: u64, source: ImageSource },
    Shutdown,
}

/// Reads and decodes images on a dedicated thread.
///
/// Requests are processed in order; results are picked up without blocking
/// by [`DecodeBackend::take_results`]. The thread is joined on drop.
pub struct ThreadDecoder {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<Completed>,
    thread_handle: Option<JoinHandle<()>>,
    /// Requests the thread could not accept, answered on the next poll
    rejected: Vec<Completed>,
    /// Generations handed to the thread and not yet answered
    in_flight: Vec<u64>,
}

impl ThreadDecoder {
    /// Spawn the decoder thread.
    pub fn spawn() -> Result<Self, String> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<Completed>();

        let thread_handle = thread::Builder::new()
            .name("image-decoder".to_string())
            .spawn(move || {
                log::debug!("Image decoder thread started");
                Self::thread_loop(request_rx, result_tx);
                log::debug!("Image decoder thread exiting");
            })
            .map_err(|e| format!("Failed to spawn decoder thread: {}", e))?;

        Ok(Self::from_parts(request_tx, result_rx, Some(thread_handle)))
    }

    fn from_parts(
        request_tx: Sender<ThreadMessage>,
        result_rx: Receiver<Completed>,
        thread_handle: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            request_tx,
            result_rx,
            thread_handle,
            rejected: Vec::new(),
            in_flight: Vec::new(),
        }
    }

    fn answered(&mut self, completed: &Completed) {
        self.in_flight.retain(|&g| g != completed.generation);
    }

    /// Fail every unanswered request once the thread can no longer reply.
    fn fail_in_flight(&mut self, results: &mut Vec<Completed>) {
        for generation in self.in_flight.drain(..) {
            log::warn!("Decode request {} lost: decoder thread disconnected", generation);
            results.push(Completed {
                generation,
                result: Err(LoadError::BackendClosed(
                    "decoder thread disconnected".to_string(),
                )),
            });
        }
    }

    fn thread_loop(request_rx: Receiver<ThreadMessage>, result_tx: Sender<Completed>) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Decode { generation, source }) => {
                    let result = load_blocking(source);
                    if result_tx.send(Completed { generation, result }).is_err() {
                        log::warn!("Result channel closed, decoder thread exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) | Err(_) => break,
            }
        }
    }

    /// Block until at least one result arrives or `timeout` passes.
    pub fn wait_results(&mut self, timeout: std::time::Duration) -> Vec<Completed> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(first) => {
                self.answered(&first);
                let mut results = vec![first];
                results.extend(self.take_results());
                results
            }
            Err(RecvTimeoutError::Timeout) => Vec::new(),
            Err(RecvTimeoutError::Disconnected) => self.take_results(),
        }
    }
}

impl DecodeBackend for ThreadDecoder {
    fn submit(&mut self, generation: u64, source: ImageSource) {
        let message = ThreadMessage::Decode { generation, source };
        if self.request_tx.send(message).is_ok() {
            self.in_flight.push(generation);
        } else {
            log::error!("Failed to send decode request {}: thread gone", generation);
            self.rejected.push(Completed {
                generation,
                result: Err(LoadError::BackendClosed(
                    "decoder thread is not running".to_string(),
                )),
            });
        }
    }

    fn take_results(&mut self) -> Vec<Completed> {
        let mut results = std::mem::take(&mut self.rejected);
        loop {
            match self.result_rx.try_recv() {
                Ok(completed) => {
                    self.answered(&completed);
                    results.push(completed);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Decoder thread disconnected");
                    self.fail_in_flight(&mut results);
                    break;
                }
            }
        }
        results
    }

    fn name(&self) -> &'static str {
        "thread"
    }
}

impl Drop for ThreadDecoder {
    fn drop(&mut self) {
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Decoder thread panicked: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::fixtures;
    use std::time::Duration;

    #[test]
    fn test_thread_decodes_in_order() {
        let mut decoder = ThreadDecoder::spawn().unwrap();
        decoder.submit(1, ImageSource::from_url(&fixtures::png_data_url(2, 2, [1, 2, 3, 255])));
        decoder.submit(2, ImageSource::from_url("data:image/png;base64,AAAA"));

        let mut results = Vec::new();
        while results.len() < 2 {
            let batch = decoder.wait_results(Duration::from_secs(5));
            assert!(!batch.is_empty(), "decoder thread timed out");
            results.extend(batch);
        }

        assert_eq!(results[0].generation, 1);
        assert!(results[0].result.is_ok());
        assert_eq!(results[1].generation, 2);
        assert!(results[1].result.is_err());
    }

    #[test]
    fn test_disconnect_fails_unanswered_requests() {
        let (request_tx, _request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<Completed>();
        let mut decoder = ThreadDecoder::from_parts(request_tx, result_rx, None);

        decoder.submit(3, ImageSource::from_url("data:image/png;base64,AAAA"));
        decoder.submit(4, ImageSource::from_url("data:image/png;base64,AAAA"));
        result_tx
            .send(Completed {
                generation: 3,
                result: Err(LoadError::decode("truncated")),
            })
            .unwrap();
        drop(result_tx);

        let results = decoder.take_results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].generation, 3);
        assert!(matches!(results[0].result, Err(LoadError::Decode { .. })));
        assert_eq!(results[1].generation, 4);
        assert!(matches!(results[1].result, Err(LoadError::BackendClosed(_))));

        assert!(decoder.take_results().is_empty());
    }
}
