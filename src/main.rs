use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, error, info, trace, warn};
use propaganda_common::{
    BaseParameters, OutputFormat, SimulationConfig, StepStats, STEP_STATS_CSV_HEADER,
};
use propaganda_engine::grid::cell_coords;
use propaganda_engine::Simulation;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    /// Channel weights and hysteresis tuning of the first showcase scenario.
    ScenarioOne,
}

/// Headless runner: loads a config, runs the simulation and writes per-step stats.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the number of steps from the config.
    #[arg(short, long)]
    steps: Option<u32>,

    /// Replace the configured parameters with a named preset.
    #[arg(short, long, value_enum)]
    preset: Option<Preset>,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting Propaganda Engine (CPU Parallel)...");

    // --- Load Configuration ---
    let mut config = SimulationConfig::load(&args.config)?;
    if let Some(Preset::ScenarioOne) = args.preset {
        info!("Applying preset: scenario one.");
        config.parameters = BaseParameters::scenario_one();
    }
    if let Some(steps) = args.steps {
        config.timing.total_steps = steps;
    }

    info!("Using {} Rayon threads.", rayon::current_num_threads());

    // --- Initialize Simulation ---
    let mut sim = Simulation::from_config(&config)?;
    debug!("Simulation Parameters: {:#?}", sim.params());

    let total_steps = config.timing.total_steps;
    let mut record_interval_steps = config.timing.record_interval_steps;
    if record_interval_steps == 0 {
        warn!("Record interval of 0 steps requested. Recording every step.");
        record_interval_steps = 1;
    }
    info!("Recording stats every {} steps.", record_interval_steps);

    info!("Starting simulation loop for {} steps...", total_steps);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    // --- Initial Snapshot (iteration 0) ---
    sim.record_snapshot();

    for step in 0..total_steps {
        let step_start_time = Instant::now();
        sim.step();
        let step_duration = step_start_time.elapsed();

        let current_time = Instant::now();
        let print_interval_secs = 5.0;
        let should_print_status = current_time.duration_since(previous_print_time).as_secs_f64() >= print_interval_secs;
        let is_record_step = (step + 1) % record_interval_steps == 0;
        let is_last_step = step + 1 == total_steps;

        if is_record_step || is_last_step {
            sim.record_snapshot();
        }

        if should_print_status || is_last_step {
            let stats = sim.last_stats();
            info!(
                "Step [{}/{}] | A: {} B: {} N: {} | Budgets: {:.1} / {:.1} | Step Time: {:6.2} ms | Elapsed: {:.2} s",
                step + 1,
                total_steps,
                stats.count_a,
                stats.count_b,
                stats.count_undecided,
                stats.budget_a,
                stats.budget_b,
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = current_time;
        } else {
            trace!(
                "Step [{}/{}] completed in {:.2} ms",
                step + 1,
                total_steps,
                step_duration.as_secs_f64() * 1000.0
            );
        }
    }

    let total_duration = start_time.elapsed();
    info!("Simulation finished in {:.3} seconds.", total_duration.as_secs_f64());

    // --- Save Recorded Data ---
    let output = &config.output;
    if output.save_stats {
        let filename = format!("{}_stats.{}", output.base_filename, output.format.extension());
        match write_stats(&filename, output.format, sim.recorded_snapshots()) {
            Ok(()) => info!("{} stat rows saved to {}", sim.recorded_snapshots().len(), filename),
            Err(e) => error!("Error saving stats to '{}': {}", filename, e),
        }
    } else {
        info!("Skipping saving stats as per config (save_stats is false).");
    }

    if output.save_final_grid {
        let filename = format!("{}_final_grid.csv", output.base_filename);
        match write_final_grid(&filename, &sim) {
            Ok(()) => info!("Final grid saved to {}", filename),
            Err(e) => error!("Error saving CSV file '{}': {}", filename, e),
        }
    } else {
        info!("Skipping saving final grid as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}

fn write_stats(filename: &str, format: OutputFormat, stats: &[StepStats]) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let mut file = BufWriter::new(File::create(filename)?);
            serde_json::to_writer(&mut file, stats)?;
            file.flush()?;
        }
        OutputFormat::Bincode => {
            let file = BufWriter::new(File::create(filename)?);
            bincode::serialize_into(file, stats)?;
        }
        OutputFormat::Messagepack => {
            let mut file = BufWriter::new(File::create(filename)?);
            rmp_serde::encode::write(&mut file, stats)?;
            file.flush()?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_path(filename)?;
            writer.write_record(STEP_STATS_CSV_HEADER)?;
            for row in stats {
                writer.write_record(row.csv_record())?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn write_final_grid(filename: &str, sim: &Simulation) -> Result<()> {
    let mut writer = csv::Writer::from_path(filename)?;
    writer.write_record(["x", "y", "side", "hysteresis", "threshold", "active"])?;
    for (idx, cell) in sim.cells().iter().enumerate() {
        let (x, y) = cell_coords(idx, sim.cols());
        writer.write_record(&[
            x.to_string(),
            y.to_string(),
            cell.side.label().to_string(),
            format!("{:.4}", cell.hysteresis),
            format!("{:.4}", cell.threshold),
            cell.active.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
