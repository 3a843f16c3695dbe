use foundation::coord::FragmentPos;
use runtime::scheduler::RenderScheduler;
use streaming::engine::{FragmentSource, GenerationOutcome, GenerationParams, LayerId};
use streaming::store::FragmentStore;
use streaming::world_cache::{WorldCache, WorldCacheError};

use crate::camera::{Camera, CameraLimits};
use crate::renderer::{DrawCommand, RenderPass, draw_fragments, draw_grid, draw_selection};
use crate::selection::SelectionStore;
use crate::visible::ZoomLimiter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordParseError {
    pub input: String,
}

impl std::fmt::Display for CoordParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid coordinate: {:?}", self.input)
    }
}

impl std::error::Error for CoordParseError {}

/// Parses coordinate text input. Invalid text is a recoverable error the
/// host surfaces to the user; no viewer state changes.
pub fn parse_block_coord(input: &str) -> Result<i64, CoordParseError> {
    input.trim().parse::<i64>().map_err(|_| CoordParseError {
        input: input.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub limits: CameraLimits,
    pub limiter: ZoomLimiter,
    /// Grid spacing in block coordinates; 0 means one fragment.
    pub grid_size: i64,
    pub show_grid: bool,
    pub active_layer: LayerId,
    pub params: GenerationParams,
    pub lru_capacity: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            limits: CameraLimits::default(),
            limiter: ZoomLimiter::default(),
            grid_size: 0,
            show_grid: true,
            active_layer: LayerId(0),
            params: GenerationParams::default(),
            lru_capacity: streaming::world_cache::DEFAULT_WORLD_CACHE_CAPACITY,
        }
    }
}

/// Ties camera, fragment store, selection overlay, world cache and the
/// render scheduler into one session.
///
/// Every mutating input operation marks the render state dirty; the host
/// drives `render_if_dirty` once per frame tick and delivers engine
/// completions through `apply_completion` on the same logical thread.
#[derive(Debug)]
pub struct Viewer {
    camera: Camera,
    store: FragmentStore,
    selection: SelectionStore,
    cache: WorldCache,
    scheduler: RenderScheduler,
    limiter: ZoomLimiter,
    grid_size: i64,
    show_grid: bool,
    active_layer: LayerId,
    params: GenerationParams,
    world_key: Option<String>,
}

impl Viewer {
    pub fn new(width: f64, height: f64, config: ViewerConfig) -> Result<Self, WorldCacheError> {
        let grid_size = if config.grid_size > 0 {
            config.grid_size
        } else {
            config.params.frag_size as i64
        };
        Ok(Self {
            camera: Camera::new(config.params.frag_size, width, height, config.limits),
            store: FragmentStore::new(),
            selection: SelectionStore::new(),
            cache: WorldCache::new(config.lru_capacity)?,
            scheduler: RenderScheduler::new(),
            limiter: config.limiter,
            grid_size,
            show_grid: config.show_grid,
            active_layer: config.active_layer,
            params: config.params,
            world_key: None,
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn store(&self) -> &FragmentStore {
        &self.store
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn active_layer(&self) -> LayerId {
        self.active_layer
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    // Input operations. Each one marks the view dirty; the camera itself
    // holds no dirty flag.

    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.scheduler.mark_dirty();
        self.camera.move_raw(dx, dy);
    }

    pub fn pan(&mut self, dt_s: f64, dir_x: f64, dir_y: f64) {
        self.scheduler.mark_dirty();
        self.camera.move_by(dt_s, dir_x, dir_y);
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.scheduler.mark_dirty();
        self.camera.zoom(factor);
        self.limiter.apply(&mut self.camera);
    }

    pub fn center_at(&mut self, fx: f64, fy: f64) {
        self.scheduler.mark_dirty();
        self.camera.center_at(fx, fy);
    }

    pub fn center_at_block(&mut self, bx: f64, by: f64) {
        self.scheduler.mark_dirty();
        self.camera.center_at_block(bx, by);
    }

    pub fn resolution_change(&mut self, factor: f64) {
        self.scheduler.mark_dirty();
        self.camera.resolution_change(factor);
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.scheduler.mark_dirty();
        self.camera.set_viewport(width, height);
    }

    pub fn set_active_layer(&mut self, layer: LayerId) {
        self.scheduler.mark_dirty();
        self.active_layer = layer;
    }

    pub fn set_grid_size(&mut self, grid_size: i64) {
        self.scheduler.mark_dirty();
        self.grid_size = grid_size;
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.scheduler.mark_dirty();
        self.show_grid = show;
    }

    pub fn set_lru_capacity(&mut self, capacity: usize) -> Result<Vec<String>, WorldCacheError> {
        self.cache.set_capacity(capacity)
    }

    // Selection overlay.

    /// Click input: cycles the selection state of the block cell under the
    /// given viewport pixel.
    pub fn click_block(&mut self, px: f64, py: f64) -> (i64, i64) {
        self.scheduler.mark_dirty();
        let (fx, fy) = self.camera.screen_to_fragment(px, py);
        let base = self.camera.base_tsize() as f64;
        let bx = (fx * base).floor() as i64;
        let by = (fy * base).floor() as i64;
        self.selection.cycle(bx, by);
        (bx, by)
    }

    pub fn set_selection(&mut self, value: u8, cells: &[[i64; 2]]) {
        self.scheduler.mark_dirty();
        self.selection.set_all(value, cells);
    }

    pub fn clear_selection(&mut self) {
        self.scheduler.mark_dirty();
        self.selection.clear();
    }

    pub fn replace_selection(&mut self, selection: SelectionStore) {
        self.scheduler.mark_dirty();
        self.selection = selection;
    }

    // Streaming plumbing.

    /// Delivery point for the async boundary. Marks the view dirty only
    /// when the store accepted the tile, so stale or failed completions do
    /// not trigger a redraw.
    pub fn apply_completion(
        &mut self,
        layer: LayerId,
        pos: FragmentPos,
        epoch: u64,
        outcome: GenerationOutcome,
    ) -> bool {
        let stored = self.store.on_generation_complete(layer, pos, epoch, outcome);
        if stored {
            self.scheduler.mark_dirty();
        }
        stored
    }

    /// Composes a frame when the view is dirty, otherwise does nothing.
    ///
    /// The dirty flag is taken (cleared) before any drawing happens, so a
    /// completion arriving mid-compose re-marks the scheduler for the next
    /// tick.
    pub fn render_if_dirty(&mut self, source: &mut dyn FragmentSource) -> Option<RenderPass> {
        if !self.scheduler.take_dirty() {
            return None;
        }

        let rect = self.limiter.apply(&mut self.camera);

        let mut commands = vec![DrawCommand::Clear {
            width: self.camera.width.round() as i64,
            height: self.camera.height.round() as i64,
        }];
        let requested = draw_fragments(
            &mut self.store,
            source,
            &self.camera,
            self.active_layer,
            &self.params,
            &rect,
            &mut commands,
        );
        if self.show_grid {
            draw_grid(&self.camera, self.grid_size, &mut commands);
        }
        draw_selection(&self.selection, &self.camera, &mut commands);

        Some(RenderPass {
            commands,
            visible: rect,
            requested,
        })
    }

    /// Switches to the snapshot stored under `key`, saving the active one
    /// under its own key first. A key never seen before starts empty.
    pub fn switch_world(&mut self, key: impl Into<String>) {
        let key = key.into();
        self.scheduler.mark_dirty();

        match self.world_key.take() {
            Some(prev) if prev == key => {
                // Same world: keep the tiles, drop in-flight work.
                self.store.reset_pending();
            }
            Some(prev) => {
                let outgoing = std::mem::take(&mut self.store);
                self.cache.save(prev, outgoing);
                self.store = self.cache.take(&key);
            }
            None => {
                // The initial scratch store is not worth caching.
                self.store = self.cache.take(&key);
            }
        }
        self.world_key = Some(key);
    }

    /// Drops all tiles and in-flight work for the active store.
    pub fn clear_active(&mut self) {
        self.scheduler.mark_dirty();
        self.store.clear_all();
    }

    pub fn clear_world_cache(&mut self) {
        self.cache.clear_all();
    }

    /// Color probe at a fragment-float coordinate, `#rrggbb`. Returns
    /// `None` while the fragment is still being generated.
    pub fn probe_pixel(
        &mut self,
        source: &mut dyn FragmentSource,
        fx: f64,
        fy: f64,
    ) -> Option<String> {
        let frag_size = self.params.frag_size;
        let (frag_x, inner_x) = split_fragment_coord(fx, frag_size);
        let (frag_y, inner_y) = split_fragment_coord(fy, frag_size);

        // Out-of-range fragment indices cannot hold a tile; never alias.
        let pos = FragmentPos::new(
            i32::try_from(frag_x).ok()?,
            i32::try_from(frag_y).ok()?,
        );
        let tile = self
            .store
            .get_or_request(source, self.active_layer, pos, &self.params)?;
        tile.pixel_hex(inner_x, inner_y)
    }
}

/// Splits a fragment-float coordinate into (fragment index, pixel within
/// the fragment), rolling over to the next fragment when float error lands
/// the inner offset exactly on the edge.
fn split_fragment_coord(f: f64, frag_size: u32) -> (i64, u32) {
    let mut frag = f.floor() as i64;
    let mut inner = ((f - f.floor()) * frag_size as f64).floor() as u32;
    if inner >= frag_size {
        inner = 0;
        frag += 1;
    }
    (frag, inner)
}
