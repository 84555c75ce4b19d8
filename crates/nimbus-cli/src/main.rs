//! Nimbus command-line interface.
//!
//! Run zero-dimensional box-model simulations from TOML configuration
//! files:
//! ```sh
//! nimbus-cli run job.toml
//! nimbus-cli validate job.toml
//! nimbus-cli backends
//! ```

mod config;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nimbus-cli")]
#[command(about = "Nimbus: Lagrangian super-droplet box model")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a TOML configuration file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without running the simulation.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Display the execution backends compiled into this build.
    Backends,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let records = runner::run_simulation(&job)?;

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));
            if job.output.save_moments {
                let csv_path = out_dir.join("moments.csv");
                runner::write_moments_csv(&records, &csv_path)?;
                println!("Moments written to {}", csv_path.display());
            }

            let last = records.last().expect("run always records the initial state");
            println!(
                "Simulation complete: {} super-droplets, mean radius {:.2} µm after {:.0} s",
                last.superdroplets,
                last.mean_radius * 1e6,
                last.time
            );
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            job.ensemble.backend_tag()?;
            job.ensemble.zero_dim.validate();
            println!("Configuration is valid: {}", config.display());
            Ok(())
        }
        Commands::Backends => {
            println!("Execution backends in this build:");
            println!("  serial   — single-threaded reference backend");
            println!("  threads  — shared-memory parallel via Rayon");
            #[cfg(feature = "gpu")]
            println!("  gpu      — accelerator offload via wgpu");
            #[cfg(not(feature = "gpu"))]
            println!("  gpu      — not compiled in (enable the `gpu` feature)");
            Ok(())
        }
    }
}
