pub mod config;
pub mod params;
pub mod player;
pub mod side;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{
    GridConfig, NeighbourhoodType, NetworkConfig, OutputConfig, OutputFormat, SeedingConfig,
    SimulationConfig, ThresholdDistribution, TimingConfig,
};
pub use params::BaseParameters;
pub use player::{Channel, Controls, Player, Tier};
pub use side::Side;
pub use snapshot::{
    ActorCampaign, CampaignDiag, GlobalSignals, StepStats, StepTransitions, STEP_STATS_CSV_HEADER,
};
