//! Dispersion image builder CLI.
//!
//! Loads one parameter of a BlueSky dispersion file, renders every
//! configured image set and prints a JSON summary for the packaging step.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use dispersion_grid::loader::load_with_row_order;
use dispersion_images::config_loader::load_config;
use dispersion_images::{build_image_set, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "dispersion-images")]
#[command(about = "Render classified PNG/GeoTIFF image sets from BlueSky dispersion output")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "DISPERSION_IMAGES_CONFIG")]
    config: String,

    /// Dispersion NetCDF file (overrides input.filename)
    #[arg(short, long)]
    input: Option<String>,

    /// Parameter to render, e.g. PM25 or VISUAL_RANGE (overrides input.parameter)
    #[arg(short, long)]
    parameter: Option<String>,

    /// Output directory (overrides output.directory)
    #[arg(short, long)]
    output: Option<String>,

    /// Comma-separated layer indices (overrides input.layers)
    #[arg(long, value_delimiter = ',')]
    layers: Option<Vec<usize>>,

    /// Log filter directive, e.g. "info" or "renderer=debug" (RUST_LOG wins)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(args: &Args) -> Result<()> {
    // RUST_LOG takes precedence over --log-level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    let mut file = load_config(&args.config)?;
    if let Some(input) = &args.input {
        file.input.filename = input.clone();
    }
    if let Some(parameter) = &args.parameter {
        file.input.parameter = parameter.clone();
    }
    if let Some(output) = &args.output {
        file.output.directory = output.clone();
    }
    if let Some(layers) = &args.layers {
        file.input.layers = layers.clone();
    }

    let run = RunConfig::from_file(&file).context("Invalid configuration")?;
    info!(
        input = %run.input_file.display(),
        parameter = %run.parameter,
        layers = ?run.layers,
        output = %run.output_root.display(),
        "Starting dispersion image build"
    );

    let series = load_with_row_order(&run.input_file, &run.parameter, run.row_order)
        .with_context(|| format!("Failed to load {}", run.input_file.display()))?;

    let summary = build_image_set(
        &series,
        &run.schemes,
        &run.layers,
        &run.utc_offsets,
        &run.context(),
    )
    .context("Failed to build image sets")?;

    info!(
        image_sets = summary.image_sets.len(),
        images = summary.image_count(),
        "Dispersion image build completed"
    );

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
