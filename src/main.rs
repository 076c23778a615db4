//! FLASH Oxygen - Entry point
//!
//! Evaluates one constant dose-rate exposure and reports the oxygen
//! depletion, cumulative OER and predicted survival.
//!
//! CLI Usage:
//!   cargo run                                  # 1 Gy at 10 Gy/s, 100% O2
//!   cargo run -- -D 20 -r 600 --o2 0.016       # 20 Gy at 600 Gy/s, 1.6% O2
//!   cargo run -- --params model.json --csv exports

// Unit-suffixed option names, as in the library
#![allow(non_snake_case)]

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use flash_oxygen::{evaluate_exposure, export, Exposure, LqParameters, Parameters};

/// Command line options
struct Options {
    dose_Gy: f64,
    dose_rate: f64,
    o2: Option<f64>,
    alpha: f64,
    beta: f64,
    intervals: usize,
    params_path: Option<PathBuf>,
    csv_dir: Option<PathBuf>,
    json_dir: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dose_Gy: 1.0,
            dose_rate: 10.0,
            o2: None,
            alpha: 0.3,
            beta: 0.03,
            intervals: 1000,
            params_path: None,
            csv_dir: None,
            json_dir: None,
        }
    }
}

fn print_help() {
    println!("FLASH Oxygen");
    println!();
    println!("Usage: flash-oxygen [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -D, --dose GY        Total dose in Gy (default: 1.0)");
    println!("  -r, --rate GY_S      Dose rate in Gy/s (default: 10.0)");
    println!("      --o2 FRACTION    Baseline oxygen, fraction of 100% O2 (default: from params)");
    println!("  -a, --alpha A        LQ alpha, anoxic reference, per Gy (default: 0.3)");
    println!("  -b, --beta B         LQ beta, anoxic reference, per Gy^2 (default: 0.03)");
    println!("  -n, --intervals N    Time grid intervals (default: 1000)");
    println!("  -p, --params PATH    Model parameters JSON");
    println!("      --csv DIR        Export the oxygen trajectory as CSV");
    println!("      --json DIR       Export the outcome as JSON");
    println!("  --help, -h           Show this help");
}

/// Value following the flag at `args[*i]`, advancing the cursor past it
fn next_value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .with_context(|| format!("missing value for {}", flag))
}

/// Parse CLI arguments
fn parse_args() -> Result<Options> {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-D" | "--dose" => {
                options.dose_Gy = next_value(&args, &mut i)?.parse().context("invalid --dose")?
            }
            "-r" | "--rate" => {
                options.dose_rate = next_value(&args, &mut i)?.parse().context("invalid --rate")?
            }
            "--o2" => {
                options.o2 = Some(next_value(&args, &mut i)?.parse().context("invalid --o2")?)
            }
            "-a" | "--alpha" => {
                options.alpha = next_value(&args, &mut i)?.parse().context("invalid --alpha")?
            }
            "-b" | "--beta" => {
                options.beta = next_value(&args, &mut i)?.parse().context("invalid --beta")?
            }
            "-n" | "--intervals" => {
                options.intervals = next_value(&args, &mut i)?
                    .parse()
                    .context("invalid --intervals")?
            }
            "-p" | "--params" => {
                options.params_path = Some(PathBuf::from(next_value(&args, &mut i)?))
            }
            "--csv" => options.csv_dir = Some(PathBuf::from(next_value(&args, &mut i)?)),
            "--json" => options.json_dir = Some(PathBuf::from(next_value(&args, &mut i)?)),
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => log::warn!("Ignoring unknown argument {}", other),
        }
        i += 1;
    }

    Ok(options)
}

fn main() -> Result<()> {
    env_logger::init();

    let options = parse_args()?;

    let mut params = match &options.params_path {
        Some(path) => Parameters::load(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => Parameters::default(),
    };
    if let Some(o2) = options.o2 {
        params.kinetics.baseline_o2 = o2;
        params.kinetics.initial_o2 = None;
    }
    let lq = LqParameters::new(options.alpha, options.beta);

    let exposure = Exposure::constant(options.dose_Gy, options.dose_rate, options.intervals)?;

    let start_time = Instant::now();
    let outcome = evaluate_exposure(&exposure, &params, &lq)?;
    let elapsed = start_time.elapsed();

    println!("=== FLASH Oxygen ===\n");
    println!(
        "Dose: {:.3} Gy at {} Gy/s ({:.4e} s)",
        outcome.total_dose_Gy,
        options.dose_rate,
        exposure.duration_sec()
    );
    println!("Baseline O2: {:.4}", params.kinetics.baseline_o2);
    println!(
        "Depletion: {} per Gy, recovery: {} per s ({:?} model)",
        params.kinetics.depletion_per_Gy, params.kinetics.recovery_per_sec, params.kinetics.model
    );
    println!();
    println!("Final O2: {:.5}", outcome.final_o2);
    println!("Minimum O2: {:.5}", outcome.min_o2);
    println!(
        "Cumulative OER: {:.4} (relative sensitivity {:.4})",
        outcome.cumulative_oer, outcome.relative_sensitivity
    );
    println!(
        "Surviving fraction (alpha={}, beta={}): {:.4e}",
        lq.alpha_per_Gy, lq.beta_per_Gy2, outcome.surviving_fraction
    );
    println!();
    println!(
        "Elapsed time: {:.2?} ({} samples, {:?} integrator)",
        elapsed,
        exposure.len(),
        params.integrator.method
    );

    if let Some(dir) = &options.csv_dir {
        let path =
            export::export_trajectory_csv(dir, &exposure, &outcome.trajectory, &params.oer_curve)?;
        println!("Trajectory written to {}", path.display());
    }
    if let Some(dir) = &options.json_dir {
        let path = export::export_outcome_json(dir, &params, &outcome)?;
        println!("Outcome written to {}", path.display());
    }

    Ok(())
}
