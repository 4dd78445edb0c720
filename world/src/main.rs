//! vr-world: runs the interaction world headless and prints every
//! outbound event as an s-expression.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use vr_world::device::headless::HeadlessConfig;
use vr_world::device::{ControllerDelegate, DeviceDelegate, GestureType, HeadlessDevice, ScriptedDevice};
use vr_world::event::SexpWriter;
use vr_world::vr::scene::Mat4;
use vr_world::{World, WorldConfig};

#[derive(Parser, Debug)]
#[command(name = "vr-world", about = "Headless VR controller interaction world")]
struct Cli {
    /// World configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device script to replay (TOML); defaults to the built-in demo
    #[arg(long)]
    script: Option<PathBuf>,

    /// Number of frames to run (default: demo length or script length)
    #[arg(long)]
    frames: Option<u64>,

    /// Override the display density (device pixels per dp)
    #[arg(long)]
    density: Option<f32>,

    /// Virtual viewport of the headless device (WxH)
    #[arg(long, default_value = "1920x1080")]
    viewport: String,

    /// Omit the per-frame head pose events
    #[arg(long)]
    no_head_pose: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

/// Headless device walked through a click, a wheel scroll, a drag and a
/// swipe.
struct Demo {
    device: HeadlessDevice,
    step: usize,
}

impl Demo {
    const LENGTH: u64 = 8;

    fn new(device: HeadlessDevice) -> Self {
        Self { device, step: 0 }
    }

    fn advance(&mut self) {
        let width = self.device.config().width as f32;
        let (cx, cy) = (width / 2.0, self.device.config().height as f32 / 2.0);
        match self.step {
            1 => self.device.touch_event(true, cx, cy),
            2 => self.device.touch_event(false, cx, cy),
            3 => self.device.wheel(0.0, -3.0),
            4 => self.device.move_pointer(cx + width / 8.0, cy),
            5 => self.device.swipe(GestureType::SwipeLeft),
            _ => {}
        }
        self.step += 1;
    }
}

impl DeviceDelegate for Demo {
    fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.device.set_clip_planes(near, far);
    }

    fn process_events(&mut self, controllers: &mut dyn ControllerDelegate) {
        self.advance();
        self.device.process_events(controllers);
    }

    fn gestures(&self) -> &[GestureType] {
        self.device.gestures()
    }

    fn head_transform(&self) -> Mat4 {
        self.device.head_transform()
    }

    fn release_controller_delegate(&mut self) {
        self.device.release_controller_delegate();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("vr-world {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vr_world=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    if let Some(density) = cli.density {
        anyhow::ensure!(density > 0.0, "--density must be positive, got {}", density);
        config.display_density = density;
    }

    let (device, frames): (Box<dyn DeviceDelegate>, u64) = match &cli.script {
        Some(path) => {
            let device = ScriptedDevice::load(path)?;
            let frames = cli.frames.unwrap_or(device.remaining() as u64);
            info!("replaying {} ({} frames)", path.display(), frames);
            (Box::new(device), frames)
        }
        None => {
            let (width, height) = HeadlessConfig::parse_viewport(&cli.viewport)
                .with_context(|| format!("invalid viewport {:?}, expected WxH", cli.viewport))?;
            let device = HeadlessDevice::new(HeadlessConfig {
                width,
                height,
                ..HeadlessConfig::default()
            });
            info!("running headless demo at {}x{}", width, height);
            (Box::new(Demo::new(device)), cli.frames.unwrap_or(Demo::LENGTH))
        }
    };

    let sink = SexpWriter::new(std::io::stdout()).skip_head_pose(cli.no_head_pose);
    let mut world = World::new(config, sink);
    world.register_device(Some(device));
    world.initialize();
    world.resume();

    for _ in 0..frames {
        world.frame();
    }

    info!("done after {} frames", world.frame_count());
    Ok(())
}
