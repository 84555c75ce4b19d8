//! TOML configuration deserialisation for box-model jobs.

use serde::Deserialize;

use nimbus_core::types::ZeroDimConfig;
use nimbus_core::units::{DissipationRate, Seconds};
use nimbus_ensemble::BackendTag;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub ensemble: EnsembleConfig,
    pub run: RunConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Ensemble parameters from TOML.
#[derive(Debug, Deserialize)]
pub struct EnsembleConfig {
    /// Execution backend: "serial", "threads", or "gpu".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Droplet precision: "f32" or "f64". Default: "f64".
    #[serde(default = "default_precision")]
    pub precision: String,
    #[serde(flatten)]
    pub zero_dim: ZeroDimConfig,
}

fn default_backend() -> String {
    "serial".into()
}

fn default_precision() -> String {
    "f64".into()
}

impl EnsembleConfig {
    /// Resolve the backend string to a tag.
    pub fn backend_tag(&self) -> anyhow::Result<BackendTag> {
        match self.backend.as_str() {
            "serial" => Ok(BackendTag::Serial),
            "threads" => Ok(BackendTag::Threads),
            "gpu" => Ok(BackendTag::Gpu),
            other => anyhow::bail!(
                "unknown backend '{other}'. Valid backends: serial, threads, gpu"
            ),
        }
    }
}

/// Time-stepping parameters from TOML.
#[derive(Debug, Deserialize)]
pub struct RunConfig {
    /// Coalescence substep length.
    pub dt: Seconds,
    /// Number of substeps.
    pub steps: usize,
    /// Turbulent kinetic-energy dissipation rate.
    #[serde(default)]
    pub dissipation_rate: DissipationRate,
    /// Record diagnostics every this many substeps (default: every step).
    #[serde(default = "default_output_every")]
    pub output_every: usize,
}

fn default_output_every() -> usize {
    1
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Whether to save the moment time series as CSV (default: true).
    #[serde(default = "default_true")]
    pub save_moments: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_moments: true,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}

fn default_true() -> bool {
    true
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: JobConfig = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use nimbus_core::types::InitSpectrum;

    use super::*;

    const EXAMPLE: &str = r#"
        [ensemble]
        backend = "threads"
        sd_conc_mean = 128.0
        volume = 1.0
        seed = 9

        [ensemble.init]
        number_concentration = 8388608.0
        mean_radius = 30.531e-6

        [ensemble.kernel]
        type = "golovin"
        b = 1500.0

        [run]
        dt = 1.0
        steps = 3600
        dissipation_rate = 0.04
    "#;

    #[test]
    fn test_parse_example_job() {
        let job: JobConfig = toml::from_str(EXAMPLE).unwrap();
        assert_eq!(job.ensemble.backend_tag().unwrap(), BackendTag::Threads);
        assert_eq!(job.ensemble.zero_dim.sd_conc_mean, 128.0);
        assert_eq!(job.ensemble.zero_dim.seed, 9);
        assert_eq!(job.run.steps, 3600);
        assert_eq!(job.run.dissipation_rate, DissipationRate::new(0.04));
        // Defaults fill in what the file leaves out.
        assert_eq!(job.run.output_every, 1);
        assert!(job.output.save_moments);
    }

    #[test]
    fn test_minimal_job_uses_defaults() {
        let job: JobConfig = toml::from_str(
            "[ensemble]\nsd_conc_mean = 64.0\n[run]\ndt = 1.0\nsteps = 10\n",
        )
        .unwrap();
        assert_eq!(job.ensemble.backend_tag().unwrap(), BackendTag::Serial);
        assert_eq!(job.ensemble.precision, "f64");
        assert_eq!(job.ensemble.zero_dim.volume.value(), 1.0);
        assert_eq!(job.run.dissipation_rate, DissipationRate::default());
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let job: JobConfig = toml::from_str(
            "[ensemble]\nbackend = \"quantum\"\nsd_conc_mean = 64.0\n[run]\ndt = 1.0\nsteps = 10\n",
        )
        .unwrap();
        assert!(job.ensemble.backend_tag().is_err());
    }

    #[test]
    fn test_default_spectrum_matches_library_default() {
        let job: JobConfig = toml::from_str(
            "[ensemble]\nsd_conc_mean = 64.0\n[run]\ndt = 1.0\nsteps = 10\n",
        )
        .unwrap();
        let default = InitSpectrum::default();
        assert_eq!(
            job.ensemble.zero_dim.init.number_concentration,
            default.number_concentration
        );
        assert_eq!(job.ensemble.zero_dim.init.mean_radius, default.mean_radius);
    }
}
