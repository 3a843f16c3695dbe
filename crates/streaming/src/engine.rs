use foundation::coord::FragmentPos;

use crate::tile::Tile;

/// Identifies an independent generation target ("biome map" vs "slime-chunk
/// overlay" and so on). Layers never share tiles or pending state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u32);

/// Knobs forwarded to the engine with every generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationParams {
    pub version: String,
    pub seed: String,
    pub frag_size: u32,
    pub y_offset: i32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            version: String::new(),
            seed: String::new(),
            frag_size: 256,
            y_offset: 0,
        }
    }
}

/// One fire-and-forget generation request.
///
/// `epoch` is the issuing layer's epoch at request time; the completion must
/// carry it back so the store can discard results that raced with a clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub layer: LayerId,
    pub pos: FragmentPos,
    pub epoch: u64,
    pub params: GenerationParams,
}

/// Result of a generation call, delivered back to
/// `FragmentStore::on_generation_complete` by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Ok(Tile),
    Failed(String),
}

/// The engine boundary.
///
/// The actual seed-search / world-generation engine lives behind this trait
/// as an opaque, possibly slow, possibly failing remote call. `request` must
/// not block; completions arrive out of band, in any order, and there is no
/// cancellation.
pub trait FragmentSource {
    fn request(&mut self, req: GenerationRequest);
}

/// A source that records requests without resolving them. Useful for tests
/// and as a building block for frame-latency simulations.
#[derive(Debug, Default)]
pub struct RecordingSource {
    pub requests: Vec<GenerationRequest>,
}

impl RecordingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_count_for(&self, layer: LayerId, pos: FragmentPos) -> usize {
        self.requests
            .iter()
            .filter(|r| r.layer == layer && r.pos == pos)
            .count()
    }
}

impl FragmentSource for RecordingSource {
    fn request(&mut self, req: GenerationRequest) {
        self.requests.push(req);
    }
}
