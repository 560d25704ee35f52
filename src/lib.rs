//! Propaganda diffusion engine: a cellular automaton where cells take side A, side B or
//! stay undecided under local, social-graph and campaign influence.

pub mod campaign;
pub mod grid;
pub mod hysteresis;
pub mod influence;
pub mod neighbourhood;
pub mod simulation;
pub mod social_graph;
pub mod state;
pub mod stats;

pub use campaign::{BroadcastStock, CampaignEngine, CampaignOutcome};
pub use influence::{FieldComponents, InfluenceAggregator};
pub use neighbourhood::NeighbourhoodType;
pub use simulation::Simulation;
pub use social_graph::SocialGraph;
pub use state::{Cell, GridState, GridView, RegionMask};
