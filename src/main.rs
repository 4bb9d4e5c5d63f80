//! Lookdev - LOD switching and PBR material tuning harness
//!
//! Loads four levels of detail of one model in priority order, shows the
//! first as soon as it is ready and re-synthesizes its materials whenever
//! the control panel changes a parameter.

mod app;
mod assets;
mod config;
mod lod;
mod render;
mod scene;
mod ui;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::assets::FsAssetLoader;
use crate::config::HarnessConfig;
use crate::lod::LodKey;
use crate::scene::serialization::{load_preset_from_file, save_preset_to_file};

#[derive(Parser)]
#[command(name = "lookdev")]
#[command(about = "LOD asset cache and PBR material lookdev harness")]
#[command(version)]
struct Cli {
    /// Harness config (JSON); the stock four-LOD layout when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// LOD to display once loaded (lod1..lod4)
    #[arg(short, long)]
    lod: Option<LodKey>,

    /// Number of frames to run
    #[arg(short, long, default_value = "120")]
    frames: u32,

    /// Parameter preset to start from
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Write the final parameters here on exit
    #[arg(long)]
    save_preset: Option<PathBuf>,

    /// Load every LOD before the first frame instead of between frames
    #[arg(long)]
    preload: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();

    log::info!("Lookdev harness starting");

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(path) = &cli.preset {
        config.parameters = load_preset_from_file(path)
            .with_context(|| format!("loading preset {}", path.display()))?;
    }
    if let Some(lod) = cli.lod {
        config.parameters.general.lod = lod;
    }

    let loader = FsAssetLoader::new(config.asset_root.clone());
    let mut harness = app::Harness::new(loader, scene::Scene::new(), config);
    if let Err(err) = pollster::block_on(harness.start()) {
        log::warn!("Continuing without a model: {}", err);
    }
    if cli.preload {
        let started = std::time::Instant::now();
        if let Err(err) = pollster::block_on(harness.finish_loading()) {
            log::warn!("Continuing with {} LODs: {}", harness.store().len(), err);
        }
        log::info!("Preloaded in {:.2?}", started.elapsed());
    }
    app::run(&mut harness, cli.frames);

    if harness.is_loading() {
        log::info!("Stopped with LODs still loading");
    }
    if harness.store().is_empty() {
        log::warn!("No LOD was ever loaded");
    }
    log::info!(
        "Final scene: {} nodes, status '{}'",
        harness.scene().len(),
        harness.status()
    );

    if let Some(path) = &cli.save_preset {
        save_preset_to_file(harness.params(), path)
            .with_context(|| format!("saving preset {}", path.display()))?;
    }

    log::info!("Goodbye!");
    Ok(())
}
