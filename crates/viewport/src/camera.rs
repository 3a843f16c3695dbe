/// Scale clamp and pan speed for a viewer session.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraLimits {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Key-driven pan speed, pixels per second at scale 1.
    pub speed: f64,
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self {
            min_scale: 0.01,
            max_scale: 2000.0,
            speed: 256.0,
        }
    }
}

/// Coordinate transform between viewport pixel space and fragment space.
///
/// `(x, y)` is the world-space position of the viewport's top-left corner in
/// pixel-equivalent units. `tsize` is the on-screen size of one fragment; it
/// is kept integral because fractional tile sizes leave seams between
/// adjacent fragments when blitting.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    scale: f64,
    base_tsize: u32,
    tsize: f64,
    limits: CameraLimits,
}

impl Camera {
    pub fn new(base_tsize: u32, width: f64, height: f64, limits: CameraLimits) -> Self {
        let mut cam = Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            scale: 1.0,
            base_tsize,
            tsize: 0.0,
            limits,
        };
        cam.recompute_tsize();
        cam
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn tsize(&self) -> f64 {
        self.tsize
    }

    pub fn base_tsize(&self) -> u32 {
        self.base_tsize
    }

    pub fn limits(&self) -> CameraLimits {
        self.limits
    }

    fn recompute_tsize(&mut self) {
        self.tsize = (self.base_tsize as f64 * self.scale).round().max(1.0);
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Switches the level-of-detail tier the fragments are generated at.
    pub fn set_base_tsize(&mut self, base_tsize: u32) {
        self.base_tsize = base_tsize;
        self.recompute_tsize();
    }

    /// Continuous-speed pan for key-driven scrolling.
    pub fn move_by(&mut self, dt_s: f64, dir_x: f64, dir_y: f64) {
        self.x += dir_x * self.limits.speed * dt_s * self.scale;
        self.y += dir_y * self.limits.speed * dt_s * self.scale;
    }

    /// Direct pixel-space pan for drag/wheel handlers. World space is
    /// unbounded, so there is nothing to clamp.
    pub fn move_raw(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Multiplies the scale by `factor`, clamped to the configured range,
    /// keeping the fragment under the viewport center fixed. Wheel zoom that
    /// anchors at the cursor translates, zooms, then translates back.
    pub fn zoom(&mut self, factor: f64) {
        let (old_cx, old_cy) = self.fragment_at_center();
        self.scale = (self.scale * factor).clamp(self.limits.min_scale, self.limits.max_scale);
        self.recompute_tsize();
        self.center_at(old_cx, old_cy);
    }

    /// Positions the camera so the given fragment coordinate sits at the
    /// viewport center.
    pub fn center_at(&mut self, fx: f64, fy: f64) {
        self.x = (fx + 0.5) * self.tsize - self.width / 2.0;
        self.y = (fy + 0.5) * self.tsize - self.height / 2.0;
    }

    pub fn center_at_block(&mut self, bx: f64, by: f64) {
        let base = self.base_tsize as f64;
        self.x = ((bx + 0.5) / base) * self.tsize - self.width / 2.0;
        self.y = ((by + 0.5) / base) * self.tsize - self.height / 2.0;
    }

    /// Fragment coordinate currently at the viewport center.
    pub fn fragment_at_center(&self) -> (f64, f64) {
        (
            (self.x + self.width / 2.0) / self.tsize - 0.5,
            (self.y + self.height / 2.0) / self.tsize - 0.5,
        )
    }

    /// Block coordinate currently at the viewport center.
    pub fn block_at_center(&self) -> (f64, f64) {
        let base = self.base_tsize as f64;
        (
            (self.x + self.width / 2.0) / self.tsize * base - 0.5,
            (self.y + self.height / 2.0) / self.tsize * base - 0.5,
        )
    }

    /// The fragment base resolution changes by `factor`: block (0, 0) stays
    /// put but block (100, 100) becomes (100 * factor, 100 * factor). Keeps
    /// the apparent centered location fixed across the change.
    pub fn resolution_change(&mut self, factor: f64) {
        let (old_bx, old_by) = self.block_at_center();
        self.zoom(factor);
        self.center_at_block((old_bx + 0.5) / factor - 0.5, (old_by + 0.5) / factor - 0.5);
    }

    /// Viewport pixel to fragment coordinate (float).
    pub fn screen_to_fragment(&self, px: f64, py: f64) -> (f64, f64) {
        ((px + self.x) / self.tsize, (py + self.y) / self.tsize)
    }

    /// Viewport pixel to the fragment cell containing it.
    pub fn screen_to_fragment_floor(&self, px: f64, py: f64) -> (i64, i64) {
        let (fx, fy) = self.screen_to_fragment(px, py);
        (fx.floor() as i64, fy.floor() as i64)
    }

    /// Fragment coordinate (float) to viewport pixel.
    pub fn fragment_to_screen(&self, fx: f64, fy: f64) -> (f64, f64) {
        (fx * self.tsize - self.x, fy * self.tsize - self.y)
    }
}
