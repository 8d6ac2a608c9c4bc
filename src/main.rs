use std::sync::Arc;
use std::path::PathBuf;

use anyhow::{ Context, Result };
use clap::Parser;
use log::{ info, LevelFilter };

use phong_tracer::scene::Scene;
use phong_tracer::parallel::parallel_render;

/// Renders a scene file with a Whitted-style ray tracer.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// The scene to render (`.json`, or a command-format scene file).
    scene: PathBuf,

    /// Write the image here instead of the scene's `output` (`.png` or `.ppm`).
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Number of render threads [default: number of logical CPUs].
    #[clap(short, long)]
    threads: Option<usize>,

    /// Offset of shadow ray origins off the surface.
    #[clap(long)]
    shadow_epsilon: Option<f64>,

    /// Offset of reflection ray origins off the surface.
    #[clap(long)]
    reflection_epsilon: Option<f64>,

    /// Log more detail; repeat for even more.
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let mut scene = Scene::load(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;

    if let Some(epsilon) = args.shadow_epsilon {
        scene.world.settings.shadow_epsilon = epsilon;
    }
    if let Some(epsilon) = args.reflection_epsilon {
        scene.world.settings.reflection_epsilon = epsilon;
    }

    let output = args.output.unwrap_or(scene.output);
    let threads = args.threads.unwrap_or_else(num_cpus::get);

    let canvas = if threads == 1 {
        info!("Rendering on the main thread...");
        scene.camera.render(&scene.world)
    } else {
        parallel_render(&Arc::new(scene.world), &Arc::new(scene.camera), threads)
    };

    canvas.save(&output)
        .with_context(|| format!("Failed to save render to {}", output.display()))?;

    Ok(())
}
