use tracing::warn;

use crate::camera::Camera;

/// The inclusive rectangle of fragment cells intersecting the viewport.
///
/// The trailing `+ 1` column/row guards against partial-tile gaps when the
/// viewport size is not an exact multiple of `tsize`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VisibleRect {
    pub start_col: i64,
    pub end_col: i64,
    pub start_row: i64,
    pub end_row: i64,
    /// Screen offset of the first column/row, in pixels.
    pub offset_x: f64,
    pub offset_y: f64,
}

impl VisibleRect {
    pub fn compute(camera: &Camera) -> Self {
        let tsize = camera.tsize();
        let start_col = (camera.x / tsize).floor() as i64;
        let end_col = start_col + (camera.width / tsize).ceil() as i64 + 1;
        let start_row = (camera.y / tsize).floor() as i64;
        let end_row = start_row + (camera.height / tsize).ceil() as i64 + 1;
        Self {
            start_col,
            end_col,
            start_row,
            end_row,
            offset_x: -camera.x + start_col as f64 * tsize,
            offset_y: -camera.y + start_row as f64 * tsize,
        }
    }

    pub fn cols(&self) -> i64 {
        self.end_col - self.start_col + 1
    }

    pub fn rows(&self) -> i64 {
        self.end_row - self.start_row + 1
    }

    pub fn cell_count(&self) -> usize {
        (self.cols() * self.rows()) as usize
    }
}

pub const DEFAULT_MAX_FRAGMENTS_ON_SCREEN: usize = 400;

/// Caps the rendered fragment count by nudging the zoom back in.
///
/// This is a reactive clamp applied before each draw, not a limit on the
/// zoom operation itself: zooming out freely is allowed, only the rendered
/// cell count is bounded. The step cap keeps the loop finite when
/// `max_fragments` is below the count reachable at the camera's maximum
/// scale.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ZoomLimiter {
    pub max_fragments: usize,
    pub max_steps: u32,
}

impl Default for ZoomLimiter {
    fn default() -> Self {
        Self {
            max_fragments: DEFAULT_MAX_FRAGMENTS_ON_SCREEN,
            max_steps: 1024,
        }
    }
}

impl ZoomLimiter {
    pub fn apply(&self, camera: &mut Camera) -> VisibleRect {
        let mut rect = VisibleRect::compute(camera);
        let mut steps = 0u32;
        while rect.cell_count() > self.max_fragments {
            if steps >= self.max_steps {
                warn!(
                    cells = rect.cell_count(),
                    max_fragments = self.max_fragments,
                    "zoom limiter hit its step cap without reaching the bound"
                );
                break;
            }
            camera.zoom(1.01);
            rect = VisibleRect::compute(camera);
            steps += 1;
        }
        rect
    }
}

#[cfg(test)]
mod tests {
    use super::{VisibleRect, ZoomLimiter};
    use crate::camera::{Camera, CameraLimits};

    #[test]
    fn rect_for_512_viewport_at_origin() {
        let cam = Camera::new(256, 512.0, 512.0, CameraLimits::default());
        let rect = VisibleRect::compute(&cam);
        assert_eq!(rect.start_col, 0);
        assert_eq!(rect.end_col, 3);
        assert_eq!(rect.start_row, 0);
        assert_eq!(rect.end_row, 3);
        assert_eq!(rect.cell_count(), 16);
    }

    #[test]
    fn rect_handles_negative_camera_position() {
        let mut cam = Camera::new(256, 512.0, 512.0, CameraLimits::default());
        cam.move_raw(-300.0, -1.0);
        let rect = VisibleRect::compute(&cam);
        assert_eq!(rect.start_col, -2);
        assert_eq!(rect.start_row, -1);
        // Offset places the first column at or left of the screen edge.
        assert!(rect.offset_x <= 0.0);
    }

    #[test]
    fn limiter_brings_count_under_bound() {
        let mut cam = Camera::new(256, 512.0, 512.0, CameraLimits::default());
        // Zoom far out so thousands of cells are visible.
        cam.zoom(0.02);
        assert!(VisibleRect::compute(&cam).cell_count() > 400);

        let limiter = ZoomLimiter::default();
        let rect = limiter.apply(&mut cam);
        assert!(rect.cell_count() <= limiter.max_fragments);
    }

    #[test]
    fn limiter_step_cap_terminates_unreachable_bound() {
        // A 512x512 viewport shows at least 2x2 oversized cells plus the
        // guard column/row, so a bound of 1 is unreachable.
        let mut cam = Camera::new(256, 512.0, 512.0, CameraLimits::default());
        cam.zoom(0.02);
        let limiter = ZoomLimiter {
            max_fragments: 1,
            max_steps: 50,
        };
        // Must return rather than loop forever.
        let rect = limiter.apply(&mut cam);
        assert!(rect.cell_count() > 1);
    }
}
