//! `rig` - render a jointed skeleton scene from a JSON description.

mod cli;
mod scene_file;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use rig_renderer::{render, render_parallel, World};

use cli::Args;
use scene_file::SceneDescription;

const DEFAULT_OUTPUT: &str = "render.png";

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::from(args.log_level))
        .init();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure render threads")?;
    }

    let mut description = SceneDescription::load(&args.scene)?;
    let base_dir = args.scene.parent().map(Path::to_path_buf).unwrap_or_default();

    if let Some(width) = args.width {
        description.render.width = width;
    }
    if let Some(height) = args.height {
        description.render.height = height;
    }

    let scene = description
        .build(&base_dir)
        .with_context(|| format!("failed to build scene from {}", args.scene.display()))?;

    if let Some(path) = &args.export_skeleton {
        scene
            .skeleton_file()
            .save(path)
            .with_context(|| format!("failed to write skeleton {}", path.display()))?;
        log::info!("Wrote skeleton to {}", path.display());
        return Ok(());
    }

    let world = World::from_scene(&scene);
    let image = if args.serial {
        render(&world, &description.camera, &description.render)?
    } else {
        render_parallel(&world, &description.camera, &description.render, None)?
    };

    let output = args
        .output
        .or_else(|| description.output_path(&base_dir))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    image.save(&output).context("failed to write output image")?;

    Ok(())
}
