use super::{Completed, DecodeBackend, ImageSource, load_blocking};

/// Decodes on the caller's thread. Results are held until the next poll so
/// every backend delivers the same way.
#[derive(Debug, Default)]
pub struct InlineDecoder {
    results: Vec<Completed>,
}

impl DecodeBackend for InlineDecoder {
    fn submit(&mut self, generation: u64, source: ImageSource) {
        let result = load_blocking(source);
        self.results.push(Completed { generation, result });
    }

    fn take_results(&mut self) -> Vec<Completed> {
        std::mem::take(&mut self.results)
    }

    fn name(&self) -> &'static str {
        "inline"
    }
}
