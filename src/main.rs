use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wfc_core::{DotNetRandom, RunOutcome, WfcModel, WfcRng};
use wfc_samples::{
    load_samples, render_2d, save_png, text_output, RunTimings, SampleConfig, SampleReport,
    Tileset,
};

/// Generate every sample of a samples file with Wave Function Collapse.
#[derive(Parser, Debug)]
#[command(name = "wfc_studio", version)]
struct Args {
    /// Samples file listing what to generate
    #[arg(long, default_value = "samples/samples.xml")]
    samples: PathBuf,

    /// Output directory, cleared before the run
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Master seed the per-run seeds are drawn from
    #[arg(long, default_value_t = 324234)]
    seed: i32,

    /// Side of one cell in the PNG output
    #[arg(long, default_value_t = 8)]
    pixel_size: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let started = Instant::now();

    prepare_output(&args.output)?;
    let samples = load_samples(&args.samples)
        .with_context(|| format!("loading {}", args.samples.display()))?;

    let mut master = DotNetRandom::from_seed(args.seed);
    let mut reports = Vec::with_capacity(samples.len());

    for sample in &samples {
        info!("< {}", sample.name);
        let tileset = Tileset::load(&sample.tileset)
            .with_context(|| format!("loading tileset for {}", sample.name))?;
        let mut model = WfcModel::new(
            sample.model_config(),
            tileset.weights(),
            tileset.propagator()?,
        )
        .with_context(|| format!("building model for {}", sample.name))?;

        let timings = run_sample(&mut model, sample, &tileset, &mut master, &args)?;
        if timings.successes > 0 {
            info!("{} ({}, {} workers): {}", sample.name, sample.heuristic, sample.workers, timings);
        } else {
            warn!("{}: no successful runs", sample.name);
        }

        reports.push(SampleReport {
            name: sample.name.clone(),
            heuristic: sample.heuristic.to_string(),
            workers: sample.workers,
            timings,
        });
    }

    let stats_path = args.output.join("stats.json");
    let json = serde_json::to_string_pretty(&reports)?;
    fs::write(&stats_path, json).with_context(|| format!("writing {}", stats_path.display()))?;

    info!("time = {} ms", started.elapsed().as_millis());
    Ok(())
}

/// Create the output directory and remove files left from earlier runs.
fn prepare_output(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        }
    }
    Ok(())
}

/// Produce `screenshots` images, retrying each with fresh seeds up to
/// `attempts` times.
fn run_sample(
    model: &mut WfcModel,
    sample: &SampleConfig,
    tileset: &Tileset,
    master: &mut dyn WfcRng,
    args: &Args,
) -> anyhow::Result<RunTimings> {
    let mut timings = RunTimings::default();

    for _ in 0..sample.screenshots {
        for _ in 0..sample.attempts {
            let seed = master.next_int();
            let start = Instant::now();
            let outcome = model.run(seed, sample.limit);
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            timings.record(outcome, elapsed_ms);

            if outcome != RunOutcome::Solved {
                info!("> {} {}", seed, outcome);
                continue;
            }
            info!("> {} {} ({:.2} ms)", seed, outcome, elapsed_ms);

            if let Some(observed) = model.observed() {
                save_outputs(observed, sample, tileset, seed, args)?;
            }
            break;
        }
    }

    Ok(timings)
}

fn save_outputs(
    observed: &[usize],
    sample: &SampleConfig,
    tileset: &Tileset,
    seed: i32,
    args: &Args,
) -> anyhow::Result<()> {
    let stem = format!("{} {}", sample.name, seed);

    let img = render_2d(
        observed,
        sample.width,
        sample.height,
        &tileset.colors(),
        args.pixel_size,
    );
    let png = args.output.join(format!("{}.png", stem));
    save_png(&img, &png).with_context(|| format!("saving {}", png.display()))?;

    if sample.text_output {
        let txt = args.output.join(format!("{}.txt", stem));
        fs::write(&txt, text_output(observed, sample.width, &tileset.names()))
            .with_context(|| format!("writing {}", txt.display()))?;
    }
    Ok(())
}
