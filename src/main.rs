// wirescene: scenario loader and sweep planner for link and radar simulations.

// Copyright 2026 The wirescene authors

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use wirescene::prelude::*;
use wirescene::summary::ScenarioSummary;
use wirescene::sweep::export::GridLogger;
use wirescene::variants;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Validate and inspect wireless simulation scenarios", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and resolve every document, failing if any is invalid.
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the resolved scenario.
    Show {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Write the sweep grid as CSV.
    Plan {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-emit the resolved document with defaults filled in.
    Normalize {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    List,
}

fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();

    match cli.command {
        Commands::Check { files } => check(&files)?,
        Commands::Show { file, json } => show(&file, json)?,
        Commands::Plan { file, output } => plan(&file, output)?,
        Commands::Normalize { file, output } => normalize(&file, output)?,
        Commands::List => {
            println!("\nExtension points and their variant tags");
            for entry in variants::catalog() {
                println!("\n  {}", entry.extension_point);
                for tag in entry.tags {
                    println!("    !{}", tag);
                }
            }
            println!("\nUsage: wirescene check <scenario.yml>\n");
        }
    }

    info!("Total runtime: {:.2}s", program_start.elapsed().as_secs_f64());

    Ok(())
}

fn load(path: &Path) -> Result<Scenario> {
    Scenario::load(path).with_context(|| format!("Invalid scenario {}", path.display()))
}

fn check(files: &[PathBuf]) -> Result<()> {
    info!("Checking {} documents on {} threads", files.len(), rayon::current_num_threads());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );

    let outcomes: Vec<(&PathBuf, wirescene::Result<Scenario>)> = files
        .par_iter()
        .map(|path| {
            let outcome = Scenario::load(path);
            pb.inc(1);
            (path, outcome)
        })
        .collect();
    pb.finish_and_clear();

    let mut failures = 0;
    for (path, outcome) in outcomes {
        match outcome {
            Ok(scenario) => {
                let unused = scenario.unused_devices();
                info!(
                    "{}: ok ({} grid points{})",
                    path.display(),
                    scenario.sweep().num_points(),
                    if unused.is_empty() { "" } else { ", unused devices" }
                );
            }
            Err(err) => {
                failures += 1;
                error!("{}: {}", path.display(), err);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} documents failed validation", failures, files.len());
    }
    info!("All {} documents are valid", files.len());
    Ok(())
}

fn show(path: &Path, json: bool) -> Result<()> {
    let scenario = load(path)?;
    let summary = scenario.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary_table(&summary);
    }
    Ok(())
}

fn plan(path: &Path, output: Option<PathBuf>) -> Result<()> {
    let scenario = load(path)?;

    let output = match output {
        Some(output) => output,
        None => {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            PathBuf::from(format!("results/{}_{}_grid.csv", scenario.name(), timestamp))
        }
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Unable to create {}", parent.display()))?;
    }

    let mut logger = GridLogger::new(&output)?;
    let rows = logger.log_sweep(scenario.sweep())?;
    if scenario.dimensions().is_empty() {
        warn!("Scenario {} declares no dimensions, the grid is a single point", scenario.name());
    }
    info!("Sweep grid with {} points saved to: {}", rows, output.display());
    Ok(())
}

fn normalize(path: &Path, output: Option<PathBuf>) -> Result<()> {
    let scenario = load(path)?;
    let yaml = scenario.to_yaml()?;

    match output {
        Some(output) => {
            fs::write(&output, yaml).with_context(|| format!("Unable to write {}", output.display()))?;
            info!("Normalized scenario written to: {}", output.display());
        }
        None => print!("{}", yaml),
    }
    Ok(())
}

fn summary_table(summary: &ScenarioSummary) {
    println!("\n╔══════════════════════════════════════════════════════════════════════════╗");
    println!("║ Scenario: {:<62} ║", summary.name);
    println!("╠════════════════════╦════════════════════╦════════════════╦═══════════════╣");
    println!("║ Device             ║ Carrier (GHz)      ║ Antennas       ║ Links / Ops   ║");
    println!("╠════════════════════╬════════════════════╬════════════════╬═══════════════╣");
    for device in &summary.devices {
        println!(
            "║ {:<18} ║ {:>18.3} ║ {:>14} ║ {:>6} / {:<4} ║",
            device.alias,
            device.carrier_frequency / 1e9,
            device.num_antennas,
            device.channels,
            device.operators,
        );
    }
    println!("╚════════════════════╩════════════════════╩════════════════╩═══════════════╝");

    if !summary.channels.is_empty() {
        println!("\nChannels");
        for channel in &summary.channels {
            println!(
                "  {:<16} {:<20} {} -> {}",
                channel.alias.as_deref().unwrap_or("-"),
                channel.kind,
                channel.transmitter,
                channel.receiver
            );
        }
    }

    if !summary.operators.is_empty() {
        println!("\nOperators");
        for operator in &summary.operators {
            print!("  {:<16} {:<20} on {:<12}", operator.alias, operator.role, operator.device);
            if let Some(waveform) = &operator.waveform {
                print!(
                    " {} {}-ary, {:.2} Mbps, {} samples/frame",
                    waveform.shape,
                    waveform.modulation_order,
                    waveform.data_rate / 1e6,
                    waveform.samples_in_frame
                );
            }
            if let Some(beamformer) = operator.beamformer {
                print!(" [{beamformer}]");
            }
            println!();
        }
    }

    if !summary.evaluators.is_empty() {
        println!("\nEvaluators");
        for evaluator in &summary.evaluators {
            println!(
                "  {:<6} {:<32} {}",
                evaluator.abbreviation,
                evaluator.metric,
                evaluator.subjects.join(", ")
            );
        }
    }

    if !summary.dimensions.is_empty() {
        println!("\nDimensions");
        for dimension in &summary.dimensions {
            println!(
                "  {:<24} {:>5} values {} .. {} [{}] ({})",
                dimension.path, dimension.num_values, dimension.first, dimension.last, dimension.unit, dimension.target
            );
        }
    }

    println!(
        "\nGrid points: {} x {} samples = {} drops\n",
        summary.grid_points, summary.num_samples, summary.total_samples
    );
}
