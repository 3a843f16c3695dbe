use foundation::coord::FragmentPos;
use streaming::engine::{FragmentSource, GenerationParams, LayerId};
use streaming::store::FragmentStore;

use crate::camera::Camera;
use crate::selection::SelectionStore;
use crate::visible::VisibleRect;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Host-agnostic draw command list. The host blits these onto whatever
/// surface it owns; nothing here touches a canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Background fill for the whole viewport.
    Clear { width: i64, height: i64 },
    /// Blit one cached fragment, scaled from `src_size` to `dst_size`.
    Blit {
        pos: FragmentPos,
        src_size: u32,
        dst_x: i64,
        dst_y: i64,
        dst_size: i64,
    },
    /// One full-viewport grid line.
    GridLine { axis: Axis, at_px: i64 },
    /// Selection overlay quad for one selected cell.
    SelectionQuad {
        dst_x: i64,
        dst_y: i64,
        dst_size: i64,
        value: u8,
    },
}

/// One composed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPass {
    pub commands: Vec<DrawCommand>,
    pub visible: VisibleRect,
    /// Fragments that were absent and newly requested this pass.
    pub requested: usize,
}

/// Blits every available fragment in the visible rectangle, requesting the
/// missing ones. Absent cells are skipped: the background stays visible
/// until the completion arrives, no placeholder is drawn.
pub fn draw_fragments(
    store: &mut FragmentStore,
    source: &mut dyn FragmentSource,
    camera: &Camera,
    layer: LayerId,
    params: &GenerationParams,
    rect: &VisibleRect,
    commands: &mut Vec<DrawCommand>,
) -> usize {
    let tsize = camera.tsize();
    let mut requested = 0usize;

    for c in rect.start_col..=rect.end_col {
        for r in rect.start_row..=rect.end_row {
            // Panning is unbounded; cells beyond the fragment index range
            // are skipped rather than aliased onto wrapped keys.
            let (Ok(fx), Ok(fy)) = (i32::try_from(c), i32::try_from(r)) else {
                continue;
            };
            let pos = FragmentPos::new(fx, fy);
            let was_pending = store.is_pending(layer, pos);
            let x = (c - rect.start_col) as f64 * tsize + rect.offset_x;
            let y = (r - rect.start_row) as f64 * tsize + rect.offset_y;

            match store.get_or_request(source, layer, pos, params) {
                Some(tile) => {
                    commands.push(DrawCommand::Blit {
                        pos,
                        src_size: tile.size(),
                        dst_x: x.round() as i64,
                        dst_y: y.round() as i64,
                        dst_size: tsize as i64,
                    });
                }
                None => {
                    if !was_pending && store.is_pending(layer, pos) {
                        requested += 1;
                    }
                }
            }
        }
    }

    requested
}

/// Grid lines at block-coordinate multiples of `grid_size`, independent of
/// fragment boundaries.
pub fn draw_grid(camera: &Camera, grid_size: i64, commands: &mut Vec<DrawCommand>) {
    if grid_size <= 0 {
        return;
    }
    let base = camera.base_tsize() as f64;

    let (left_frag, top_frag) = camera.screen_to_fragment(0.0, 0.0);
    let (right_frag, bottom_frag) = camera.screen_to_fragment(camera.width, camera.height);

    let first_col = ((left_frag * base) / grid_size as f64).floor() as i64 * grid_size;
    let last_col = ((right_frag * base) / grid_size as f64).ceil() as i64 * grid_size;
    let first_row = ((top_frag * base) / grid_size as f64).floor() as i64 * grid_size;
    let last_row = ((bottom_frag * base) / grid_size as f64).ceil() as i64 * grid_size;

    let mut b = first_col;
    while b <= last_col {
        let (px, _) = camera.fragment_to_screen(b as f64 / base, 0.0);
        commands.push(DrawCommand::GridLine {
            axis: Axis::Vertical,
            at_px: px.round() as i64,
        });
        b += grid_size;
    }
    let mut b = first_row;
    while b <= last_row {
        let (_, py) = camera.fragment_to_screen(0.0, b as f64 / base);
        commands.push(DrawCommand::GridLine {
            axis: Axis::Horizontal,
            at_px: py.round() as i64,
        });
        b += grid_size;
    }
}

/// Overlay quads for the selection cells currently in view. Selection cells
/// live in block coordinates, one block per cell.
pub fn draw_selection(selection: &SelectionStore, camera: &Camera, commands: &mut Vec<DrawCommand>) {
    if selection.is_empty() {
        return;
    }
    let base = camera.base_tsize() as f64;
    let cell_px = (camera.tsize() / base).max(1.0);

    for ((x, y), value) in selection.iter() {
        let (px, py) = camera.fragment_to_screen(x as f64 / base, y as f64 / base);
        if px + cell_px < 0.0 || py + cell_px < 0.0 || px > camera.width || py > camera.height {
            continue;
        }
        commands.push(DrawCommand::SelectionQuad {
            dst_x: px.round() as i64,
            dst_y: py.round() as i64,
            dst_size: cell_px.round() as i64,
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use streaming::engine::{GenerationOutcome, GenerationParams, LayerId, RecordingSource};
    use streaming::store::FragmentStore;
    use streaming::tile::Tile;

    use super::{Axis, DrawCommand, draw_fragments, draw_grid, draw_selection};
    use crate::camera::{Camera, CameraLimits};
    use crate::selection::{SELECTION_POSITIVE, SelectionStore};
    use crate::visible::VisibleRect;

    const LAYER: LayerId = LayerId(0);

    fn camera() -> Camera {
        Camera::new(256, 512.0, 512.0, CameraLimits::default())
    }

    #[test]
    fn fresh_layer_requests_every_visible_cell() {
        let mut store = FragmentStore::new();
        let mut source = RecordingSource::new();
        let cam = camera();
        let rect = VisibleRect::compute(&cam);
        let mut commands = Vec::new();

        let requested = draw_fragments(
            &mut store,
            &mut source,
            &cam,
            LAYER,
            &GenerationParams::default(),
            &rect,
            &mut commands,
        );
        assert_eq!(requested, 16);
        assert_eq!(source.requests.len(), 16);
        // Nothing resident yet, so nothing to blit.
        assert!(commands.is_empty());

        // A second pass requests nothing new.
        let requested = draw_fragments(
            &mut store,
            &mut source,
            &cam,
            LAYER,
            &GenerationParams::default(),
            &rect,
            &mut commands,
        );
        assert_eq!(requested, 0);
        assert_eq!(source.requests.len(), 16);
    }

    #[test]
    fn resident_tiles_become_blits() {
        let mut store = FragmentStore::new();
        let mut source = RecordingSource::new();
        let cam = camera();
        let rect = VisibleRect::compute(&cam);
        let mut commands = Vec::new();

        draw_fragments(
            &mut store,
            &mut source,
            &cam,
            LAYER,
            &GenerationParams::default(),
            &rect,
            &mut commands,
        );
        for req in source.requests.clone() {
            store.on_generation_complete(
                req.layer,
                req.pos,
                req.epoch,
                GenerationOutcome::Ok(Tile::filled(4, [0, 0, 0, 255])),
            );
        }

        commands.clear();
        draw_fragments(
            &mut store,
            &mut source,
            &cam,
            LAYER,
            &GenerationParams::default(),
            &rect,
            &mut commands,
        );
        let blits = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Blit { .. }))
            .count();
        assert_eq!(blits, 16);
    }

    #[test]
    fn cells_beyond_fragment_index_range_are_skipped() {
        let mut store = FragmentStore::new();
        let mut source = RecordingSource::new();
        let mut cam = camera();
        // Pan past the last representable fragment column.
        cam.move_raw((i32::MAX as f64 + 2.0) * 256.0, 0.0);
        let rect = VisibleRect::compute(&cam);
        let mut commands = Vec::new();

        let requested = draw_fragments(
            &mut store,
            &mut source,
            &cam,
            LAYER,
            &GenerationParams::default(),
            &rect,
            &mut commands,
        );
        assert_eq!(requested, 0);
        assert!(source.requests.is_empty());
        assert!(commands.is_empty());
    }

    #[test]
    fn grid_lines_cover_viewport() {
        let cam = camera();
        let mut commands = Vec::new();
        draw_grid(&cam, 256, &mut commands);
        // 512px viewport at tsize 256: vertical lines at 0, 256, 512 at
        // minimum, same horizontally.
        let verticals = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::GridLine { axis: Axis::Vertical, .. }))
            .count();
        assert!(verticals >= 3);
        assert_eq!(commands.len(), verticals * 2);
    }

    #[test]
    fn selection_quads_skip_offscreen_cells() {
        let cam = camera();
        let mut selection = SelectionStore::new();
        selection.set(0, 0, SELECTION_POSITIVE);
        selection.set(1_000_000, 0, SELECTION_POSITIVE);

        let mut commands = Vec::new();
        draw_selection(&selection, &cam, &mut commands);
        assert_eq!(commands.len(), 1);
    }
}
