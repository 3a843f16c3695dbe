use std::collections::VecDeque;

use streaming::engine::{FragmentSource, GenerationOutcome, GenerationRequest};
use streaming::tile::Tile;

/// Stand-in for the external generation engine: resolves each request after
/// a fixed number of frames with a deterministic procedural tile, optionally
/// failing every Nth generation to exercise the failure path.
#[derive(Debug)]
pub struct SyntheticSource {
    latency_frames: u64,
    fail_every: Option<u64>,
    now_frame: u64,
    completed: u64,
    issued: u64,
    inflight: VecDeque<(u64, GenerationRequest)>,
}

impl SyntheticSource {
    pub fn new(latency_frames: u64, fail_every: Option<u64>) -> Self {
        Self {
            latency_frames,
            fail_every,
            now_frame: 0,
            completed: 0,
            issued: 0,
            inflight: VecDeque::new(),
        }
    }

    pub fn begin_frame(&mut self, frame_index: u64) {
        self.now_frame = frame_index;
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn inflight(&self) -> usize {
        self.inflight.len()
    }

    /// Completions whose latency has elapsed, in request order.
    pub fn drain_due(&mut self) -> Vec<(GenerationRequest, GenerationOutcome)> {
        let mut due = Vec::new();
        while self
            .inflight
            .front()
            .is_some_and(|(ready_at, _)| *ready_at <= self.now_frame)
        {
            let Some((_, req)) = self.inflight.pop_front() else {
                break;
            };
            self.completed += 1;

            let outcome = match self.fail_every {
                Some(n) if n > 0 && self.completed % n == 0 => {
                    GenerationOutcome::Failed(format!("synthetic failure #{}", self.completed))
                }
                _ => GenerationOutcome::Ok(procedural_tile(&req)),
            };
            due.push((req, outcome));
        }
        due
    }
}

impl FragmentSource for SyntheticSource {
    fn request(&mut self, req: GenerationRequest) {
        self.issued += 1;
        self.inflight
            .push_back((self.now_frame + self.latency_frames, req));
    }
}

/// Solid-color tile keyed off the seed and fragment position, with a
/// checkered brightness step so adjacent fragments are distinguishable.
fn procedural_tile(req: &GenerationRequest) -> Tile {
    let mut h = fnv1a(req.params.seed.as_bytes());
    h = fnv1a_u64(h, req.pos.packed());
    h = fnv1a_u64(h, req.layer.0 as u64);

    let mut rgba = [
        (h >> 16) as u8,
        (h >> 8) as u8,
        h as u8,
        0xff,
    ];
    if (req.pos.fx + req.pos.fy).rem_euclid(2) == 0 {
        for c in rgba.iter_mut().take(3) {
            *c = c.saturating_add(24);
        }
    }
    Tile::filled(req.params.frag_size, rgba)
}

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h = FNV_OFFSET;
    for &b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

fn fnv1a_u64(mut h: u64, v: u64) -> u64 {
    for b in v.to_le_bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}
