mod synthetic;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use formats::selection::SelectionDocument;
use runtime::frame::Frame;
use streaming::engine::GenerationParams;
use viewport::selection::{SELECTION_NEGATIVE, SELECTION_POSITIVE};
use viewport::viewer::{Viewer, ViewerConfig};
use viewport::visible::ZoomLimiter;

use crate::synthetic::SyntheticSource;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless fragment-map viewer demo")]
struct Args {
    /// Number of frames to simulate
    #[arg(long, default_value_t = 120)]
    frames: u64,

    /// World seed forwarded to the generation engine
    #[arg(long, default_value = "1234")]
    seed: String,

    /// World-generation version string forwarded to the engine
    #[arg(long, default_value = "1.16")]
    world_version: String,

    /// Fragment base resolution in pixels
    #[arg(long, default_value_t = 256)]
    frag_size: u32,

    /// Square viewport size in pixels
    #[arg(long, default_value_t = 512)]
    viewport: u32,

    /// Cap on fragments rendered per frame
    #[arg(long, default_value_t = 400)]
    max_fragments: usize,

    /// World snapshot cache capacity
    #[arg(long, default_value_t = 3)]
    lru_capacity: usize,

    /// Frames a synthetic generation takes to resolve
    #[arg(long, default_value_t = 3)]
    latency: u64,

    /// Fail every Nth generation (exercises the failure path)
    #[arg(long)]
    fail_every: Option<u64>,

    /// Disable the coordinate grid overlay
    #[arg(long, default_value_t = false)]
    hide_grid: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = ViewerConfig {
        limiter: ZoomLimiter {
            max_fragments: args.max_fragments,
            ..ZoomLimiter::default()
        },
        show_grid: !args.hide_grid,
        params: GenerationParams {
            version: args.world_version.clone(),
            seed: args.seed.clone(),
            frag_size: args.frag_size,
            y_offset: 0,
        },
        lru_capacity: args.lru_capacity,
        ..ViewerConfig::default()
    };
    let mut viewer = Viewer::new(args.viewport as f64, args.viewport as f64, config)?;
    let mut source = SyntheticSource::new(args.latency, args.fail_every);

    let world_a = format!("world:{}", args.seed);
    let world_b = format!("world:{}:alt", args.seed);
    viewer.switch_world(world_a.as_str());
    viewer.center_at_block(0.0, 0.0);

    let mut frame = Frame::new(0, 1.0 / 60.0);
    while frame.index < args.frames {
        source.begin_frame(frame.index);
        for (req, outcome) in source.drain_due() {
            viewer.apply_completion(req.layer, req.pos, req.epoch, outcome);
        }

        // A scripted input session: pan, zoom out into the limiter, flip
        // between two worlds to show the snapshot cache at work.
        match frame.index {
            10 => viewer.scroll_by(300.0, 180.0),
            25 => viewer.zoom_by(0.25),
            40 => viewer.zoom_by(4.0),
            55 => viewer.switch_world(world_b.as_str()),
            80 => viewer.switch_world(world_a.as_str()),
            95 => {
                viewer.set_selection(SELECTION_POSITIVE, &[[0, 0], [10, -3]]);
                viewer.set_selection(SELECTION_NEGATIVE, &[[-5, 2]]);
            }
            _ => {}
        }

        if let Some(pass) = viewer.render_if_dirty(&mut source) {
            info!(
                frame = frame.index,
                commands = pass.commands.len(),
                visible = pass.visible.cell_count(),
                requested = pass.requested,
                resident = viewer.store().tile_count(viewer.active_layer()),
                inflight = source.inflight(),
                "rendered"
            );
        }

        frame = frame.next();
    }

    let doc = SelectionDocument::from_selection(viewer.selection());
    info!(
        issued = source.issued(),
        rendered = viewer.scheduler().frames_rendered(),
        skipped = viewer.scheduler().frames_skipped(),
        "session complete"
    );
    info!("selection:\n{}", doc.to_pretty_json(20)?);

    Ok(())
}
