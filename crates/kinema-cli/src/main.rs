mod demo;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kinema_core::{KinemaConfig, Transform2D};
use kinema_engine::{ComponentRegistry, Engine, ManualScheduler, RecordingBackend};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "kinema",
    version,
    about = "Kinema: keyframe animation engine",
    long_about = "Kinema drives scenes of game objects from a normalized store.\nThe CLI runs headless previews against a recording renderer."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the demo scene headlessly and print what the renderer saw
    Preview {
        /// Path to a kinema.toml config (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of frame-clock refreshes to simulate
        #[arg(short, long, default_value_t = 48)]
        frames: u32,

        /// Also print the complete store state as JSON
        #[arg(long)]
        dump_state: bool,
    },

    /// Write a config file populated with the defaults
    InitConfig {
        /// Where to write the config
        #[arg()]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display version and engine info
    Info,
}

fn load_config(path: Option<&Path>) -> Result<KinemaConfig> {
    match path {
        Some(path) => KinemaConfig::load_from_file(path)
            .with_context(|| format!("failed to load config: {}", path.display())),
        None => Ok(KinemaConfig::default()),
    }
}

fn init_logging(default_filter: &str) {
    // stdout carries the JSON reports
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Preview {
            config,
            frames,
            dump_state,
        } => {
            let config = load_config(config.as_deref())?;
            init_logging(&config.logging.filter);
            cmd_preview(config, frames, dump_state)
        }
        Commands::InitConfig { path, force } => {
            init_logging("info");
            cmd_init_config(&path, force)
        }
        Commands::Info => {
            init_logging("warn");
            cmd_info()
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ObjectReport {
    name: String,
    active: bool,
    item: Option<u64>,
    transform: Option<Transform2D>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewReport {
    fps: u32,
    total_frames: u32,
    ticks: u32,
    final_frame: u32,
    renders: usize,
    objects: Vec<ObjectReport>,
    backend_calls: BTreeMap<String, usize>,
}

fn cmd_preview(config: KinemaConfig, ticks: u32, dump_state: bool) -> Result<()> {
    let backend = RecordingBackend::shared();
    let scheduler = Rc::new(RefCell::new(ManualScheduler::new()));
    let mut engine = Engine::new(config, backend.clone(), Box::new(scheduler.clone()))
        .context("failed to start engine")?;
    let objects = demo::build(&engine)?;

    let fps = engine.config().project.fps;
    let frame_ms = 1000.0 / fps as f64;
    engine.player_mut().play();
    let mut now = 0.0;
    engine.tick(now);
    for _ in 0..ticks {
        now += frame_ms;
        engine.tick(now);
    }
    engine.player_mut().pause();
    tracing::info!(
        frame = engine.player().current_frame(),
        pending_requests = scheduler.borrow().active_count(),
        "preview finished"
    );

    let ctx = engine.context();
    let report = {
        let recorded = backend.borrow();
        PreviewReport {
            fps,
            total_frames: engine.config().project.total_frames,
            ticks,
            final_frame: engine.player().current_frame(),
            renders: recorded.render_count(),
            objects: objects
                .iter()
                .map(|node| ObjectReport {
                    name: node.name(ctx).unwrap_or_default(),
                    active: node.is_active(ctx),
                    item: node.item(ctx).map(|handle| handle.0),
                    transform: node.transform(ctx).map(|t| t.to_transform()),
                })
                .collect(),
            backend_calls: recorded.call_histogram().into_iter().collect(),
        }
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if dump_state {
        let state = engine.store().state();
        println!("{}", serde_json::to_string_pretty(&state)?);
    }

    engine.dispose()?;
    Ok(())
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "'{}' already exists (pass --force to overwrite)",
            path.display()
        );
    }
    KinemaConfig::default()
        .save_to_file(path)
        .with_context(|| format!("failed to write config: {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn cmd_info() -> Result<()> {
    let registry = ComponentRegistry::with_builtins();
    let mut types = registry.types();
    types.sort_unstable();
    println!("Kinema animation engine");
    println!("   Version:    {}", env!("CARGO_PKG_VERSION"));
    println!("   Renderer:   recording (headless)");
    println!("   Components: {}", types.join(", "));
    Ok(())
}
