/// Cooperative redraw scheduling for a display-refresh driven loop.
///
/// The host calls `take_dirty()` once per frame tick and redraws only when
/// it returns `true`. The flag is cleared *before* the redraw happens, so a
/// completion that lands while a frame is being composed re-marks the
/// scheduler and is picked up on the next tick instead of being lost.
#[derive(Debug)]
pub struct RenderScheduler {
    dirty: bool,
    frames_rendered: u64,
    frames_skipped: u64,
}

impl RenderScheduler {
    /// Starts dirty: the first frame always draws.
    pub fn new() -> Self {
        Self {
            dirty: true,
            frames_rendered: 0,
            frames_skipped: 0,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the dirty flag and clears it, counting the outcome.
    pub fn take_dirty(&mut self) -> bool {
        if self.dirty {
            self.dirty = false;
            self.frames_rendered += 1;
            true
        } else {
            self.frames_skipped += 1;
            false
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}
