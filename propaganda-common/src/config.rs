use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::params::BaseParameters;
use crate::player::Player;
use std::path::Path;

// Grid dimensions, in cells
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    pub cols: u32,
    pub rows: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig { cols: 200, rows: 120 }
    }
}

/// How per-cell thresholds are drawn when seeding.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdDistribution {
    Uniform { min: f64, max: f64 },
    /// Normal draws are clamped to [0, 1].
    Normal { mean: f64, std_dev: f64 },
}

impl Default for ThresholdDistribution {
    fn default() -> Self {
        ThresholdDistribution::Uniform { min: 0.0, max: 1.0 }
    }
}

// Initial placement of aligned cells
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SeedingConfig {
    pub count_a: u32,
    pub count_b: u32,
    /// Seed for every pseudorandom draw the engine makes.
    pub seed: u64,
    pub threshold: ThresholdDistribution,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        SeedingConfig {
            count_a: 50,
            count_b: 50,
            seed: 42,
            threshold: ThresholdDistribution::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum NeighbourhoodType {
    /// 4-connected (N/E/S/W).
    #[default]
    VonNeumann,
    /// 8-connected (all queen moves).
    Moore,
}

// Local topology and social graph settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    pub neighbourhood: NeighbourhoodType,
    /// Probability that a topology edge is replaced by a random long-range edge.
    pub rewiring_probability: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            neighbourhood: NeighbourhoodType::VonNeumann,
            rewiring_probability: 0.1,
        }
    }
}

// Configuration for the headless run
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub total_steps: u32,
    /// Record a stats snapshot every N steps (0 is treated as 1).
    pub record_interval_steps: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig { total_steps: 500, record_interval_steps: 1 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Bincode,
    Messagepack,
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Bincode => "bin",
            OutputFormat::Messagepack => "msgpack",
            OutputFormat::Csv => "csv",
        }
    }
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_stats: bool,
    pub format: OutputFormat,
    /// Also write the final grid as CSV (x, y, side, hysteresis, threshold, active).
    pub save_final_grid: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: "propaganda".to_string(),
            save_stats: true,
            format: OutputFormat::Json,
            save_final_grid: false,
        }
    }
}

// Main configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    pub seeding: SeedingConfig,
    pub network: NetworkConfig,
    pub parameters: BaseParameters,
    pub player_a: Player,
    pub player_b: Player,
    pub timing: TimingConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config in '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(text)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid.cols == 0 || self.grid.rows == 0 {
            anyhow::bail!("Grid dimensions must be positive (got {}x{}).", self.grid.cols, self.grid.rows);
        }
        let cells = self.grid.cols as u64 * self.grid.rows as u64;
        let requested = self.seeding.count_a as u64 + self.seeding.count_b as u64;
        if requested > cells {
            anyhow::bail!("Cannot seed {} aligned cells on a grid of {} cells.", requested, cells);
        }
        match self.seeding.threshold {
            ThresholdDistribution::Uniform { min, max } => {
                if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min >= max {
                    anyhow::bail!("Uniform threshold range must satisfy 0 <= min < max <= 1 (got {}..{}).", min, max);
                }
            }
            ThresholdDistribution::Normal { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() || std_dev < 0.0 {
                    anyhow::bail!("Normal threshold needs a finite mean and non-negative std_dev (got {}, {}).", mean, std_dev);
                }
            }
        }
        if !(0.0..=1.0).contains(&self.network.rewiring_probability) {
            anyhow::bail!(
                "rewiring_probability must lie in [0, 1] (got {}).",
                self.network.rewiring_probability
            );
        }
        self.parameters.validate()?;
        self.player_a.validate("A")?;
        self.player_b.validate("B")?;
        Ok(())
    }
}
