use std::collections::{BTreeMap, BTreeSet};

use foundation::coord::FragmentPos;
use tracing::{debug, warn};

use crate::engine::{FragmentSource, GenerationOutcome, GenerationParams, GenerationRequest, LayerId};
use crate::tile::Tile;

#[derive(Debug, Default, Clone)]
struct LayerState {
    tiles: BTreeMap<FragmentPos, Tile>,
    pending: BTreeSet<FragmentPos>,
    /// Incremented on every clear. Completions carrying an older epoch are
    /// discarded, which is the only cancellation mechanism there is.
    epoch: u64,
}

/// Per-layer fragment cache with request deduplication.
///
/// Core property: at most one outstanding generation request per
/// `(layer, pos)`. A miss marks the key pending and issues exactly one call
/// to the `FragmentSource`; later misses for the same key are no-ops until
/// the completion (success or failure) arrives.
///
/// All mutation happens from the owning loop; completions are delivered by
/// the host calling `on_generation_complete`, never from another thread.
#[derive(Debug, Default, Clone)]
pub struct FragmentStore {
    layers: BTreeMap<LayerId, LayerState>,
}

impl FragmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached tile, or requests generation on a cold miss.
    ///
    /// `None` means "absent until ready": the caller skips the cell and the
    /// tile shows up on a later frame via `on_generation_complete`.
    pub fn get_or_request(
        &mut self,
        source: &mut dyn FragmentSource,
        layer: LayerId,
        pos: FragmentPos,
        params: &GenerationParams,
    ) -> Option<&Tile> {
        let state = self.layers.entry(layer).or_default();

        if !state.tiles.contains_key(&pos) && state.pending.insert(pos) {
            source.request(GenerationRequest {
                layer,
                pos,
                epoch: state.epoch,
                params: params.clone(),
            });
        }

        self.layers.get(&layer).and_then(|s| s.tiles.get(&pos))
    }

    /// Delivery point for the async boundary.
    ///
    /// The epoch check happens here so the race with `clear` is handled in
    /// one place: a completion for a generation issued before the clear is
    /// dropped on the floor. Returns `true` only when a tile was stored;
    /// the caller should mark its render state dirty in that case.
    pub fn on_generation_complete(
        &mut self,
        layer: LayerId,
        pos: FragmentPos,
        epoch: u64,
        outcome: GenerationOutcome,
    ) -> bool {
        let Some(state) = self.layers.get_mut(&layer) else {
            debug!(layer = layer.0, %pos, "completion for unknown layer, dropped");
            return false;
        };

        if epoch != state.epoch {
            debug!(
                layer = layer.0,
                %pos,
                stale = epoch,
                current = state.epoch,
                "stale generation completion, dropped"
            );
            return false;
        }

        // Epochs alone don't cover a completion aimed at a store that never
        // requested this key (e.g. after a world switch swapped the active
        // store); only results that are still expected may land.
        if !state.pending.remove(&pos) {
            debug!(layer = layer.0, %pos, "unexpected completion, dropped");
            return false;
        }

        match outcome {
            GenerationOutcome::Ok(tile) => {
                state.tiles.insert(pos, tile);
                true
            }
            GenerationOutcome::Failed(reason) => {
                // No retry policy: the next get_or_request for this key
                // re-issues naturally now that the pending mark is gone.
                warn!(layer = layer.0, %pos, %reason, "fragment generation failed");
                false
            }
        }
    }

    /// Drops all tiles and pending marks for one layer and bumps its epoch.
    pub fn clear(&mut self, layer: LayerId) {
        let state = self.layers.entry(layer).or_default();
        state.tiles.clear();
        state.pending.clear();
        state.epoch += 1;
    }

    pub fn clear_all(&mut self) {
        let layers: Vec<LayerId> = self.layers.keys().copied().collect();
        for layer in layers {
            self.clear(layer);
        }
    }

    /// Invalidates in-flight work without touching cached tiles.
    ///
    /// Used when a snapshot comes back from the world cache: pending marks
    /// saved with it refer to requests issued against a previous activation,
    /// and any of those completions must miss the epoch check.
    pub fn reset_pending(&mut self) {
        for state in self.layers.values_mut() {
            state.pending.clear();
            state.epoch += 1;
        }
    }

    pub fn get(&self, layer: LayerId, pos: FragmentPos) -> Option<&Tile> {
        self.layers.get(&layer).and_then(|s| s.tiles.get(&pos))
    }

    pub fn is_pending(&self, layer: LayerId, pos: FragmentPos) -> bool {
        self.layers
            .get(&layer)
            .map(|s| s.pending.contains(&pos))
            .unwrap_or(false)
    }

    pub fn epoch(&self, layer: LayerId) -> u64 {
        self.layers.get(&layer).map(|s| s.epoch).unwrap_or(0)
    }

    pub fn tile_count(&self, layer: LayerId) -> usize {
        self.layers.get(&layer).map(|s| s.tiles.len()).unwrap_or(0)
    }

    pub fn total_tile_count(&self) -> usize {
        self.layers.values().map(|s| s.tiles.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use foundation::coord::FragmentPos;

    use super::FragmentStore;
    use crate::engine::{GenerationOutcome, GenerationParams, LayerId, RecordingSource};
    use crate::tile::Tile;

    const LAYER: LayerId = LayerId(0);

    fn params() -> GenerationParams {
        GenerationParams {
            frag_size: 4,
            ..GenerationParams::default()
        }
    }

    #[test]
    fn repeated_misses_issue_one_request() {
        let mut store = FragmentStore::new();
        let mut source = RecordingSource::new();
        let pos = FragmentPos::new(3, -2);

        for _ in 0..5 {
            assert!(store.get_or_request(&mut source, LAYER, pos, &params()).is_none());
        }
        assert_eq!(source.request_count_for(LAYER, pos), 1);
        assert!(store.is_pending(LAYER, pos));
    }

    #[test]
    fn completion_stores_tile_and_clears_pending() {
        let mut store = FragmentStore::new();
        let mut source = RecordingSource::new();
        let pos = FragmentPos::new(0, 0);

        store.get_or_request(&mut source, LAYER, pos, &params());
        let req = source.requests[0].clone();

        let stored = store.on_generation_complete(
            LAYER,
            pos,
            req.epoch,
            GenerationOutcome::Ok(Tile::filled(4, [1, 2, 3, 255])),
        );
        assert!(stored);
        assert!(!store.is_pending(LAYER, pos));
        assert!(store.get(LAYER, pos).is_some());

        // A hit does not issue another request.
        store.get_or_request(&mut source, LAYER, pos, &params());
        assert_eq!(source.request_count_for(LAYER, pos), 1);
    }

    #[test]
    fn failure_clears_pending_so_retry_happens_naturally() {
        let mut store = FragmentStore::new();
        let mut source = RecordingSource::new();
        let pos = FragmentPos::new(1, 1);

        store.get_or_request(&mut source, LAYER, pos, &params());
        let stored = store.on_generation_complete(
            LAYER,
            pos,
            0,
            GenerationOutcome::Failed("engine rejected".into()),
        );
        assert!(!stored);
        assert!(store.get(LAYER, pos).is_none());

        // The next frame's request goes out again.
        store.get_or_request(&mut source, LAYER, pos, &params());
        assert_eq!(source.request_count_for(LAYER, pos), 2);
    }

    #[test]
    fn clear_forces_fresh_generation() {
        let mut store = FragmentStore::new();
        let mut source = RecordingSource::new();
        let pos = FragmentPos::new(0, 0);

        store.get_or_request(&mut source, LAYER, pos, &params());
        store.on_generation_complete(
            LAYER,
            pos,
            0,
            GenerationOutcome::Ok(Tile::filled(4, [0, 0, 0, 255])),
        );
        store.clear(LAYER);

        assert!(store.get(LAYER, pos).is_none());
        store.get_or_request(&mut source, LAYER, pos, &params());
        assert_eq!(source.request_count_for(LAYER, pos), 2);
    }

    #[test]
    fn stale_epoch_completion_is_discarded() {
        let mut store = FragmentStore::new();
        let mut source = RecordingSource::new();
        let pos = FragmentPos::new(7, 7);

        store.get_or_request(&mut source, LAYER, pos, &params());
        let old_epoch = source.requests[0].epoch;

        store.clear(LAYER);

        // The late completion from the pre-clear request arrives now.
        let stored = store.on_generation_complete(
            LAYER,
            pos,
            old_epoch,
            GenerationOutcome::Ok(Tile::filled(4, [9, 9, 9, 255])),
        );
        assert!(!stored);
        assert!(store.get(LAYER, pos).is_none());
    }

    #[test]
    fn reset_pending_keeps_tiles_but_invalidates_inflight() {
        let mut store = FragmentStore::new();
        let mut source = RecordingSource::new();
        let done = FragmentPos::new(0, 0);
        let inflight = FragmentPos::new(1, 0);

        store.get_or_request(&mut source, LAYER, done, &params());
        store.on_generation_complete(
            LAYER,
            done,
            0,
            GenerationOutcome::Ok(Tile::filled(4, [5, 5, 5, 255])),
        );
        store.get_or_request(&mut source, LAYER, inflight, &params());

        store.reset_pending();

        assert!(store.get(LAYER, done).is_some());
        assert!(!store.is_pending(LAYER, inflight));
        assert!(!store.on_generation_complete(
            LAYER,
            inflight,
            0,
            GenerationOutcome::Ok(Tile::filled(4, [6, 6, 6, 255])),
        ));
    }

    #[test]
    fn layers_are_independent() {
        let mut store = FragmentStore::new();
        let mut source = RecordingSource::new();
        let pos = FragmentPos::new(0, 0);
        let other = LayerId(1);

        store.get_or_request(&mut source, LAYER, pos, &params());
        store.get_or_request(&mut source, other, pos, &params());
        assert_eq!(source.requests.len(), 2);

        store.clear(LAYER);
        assert!(store.is_pending(other, pos));
    }
}
