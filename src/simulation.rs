use crate::campaign::{BroadcastStock, CampaignEngine};
use crate::hysteresis;
use crate::influence::InfluenceAggregator;
use crate::neighbourhood::{offsets, NeighbourhoodType};
use crate::social_graph::SocialGraph;
use crate::state::{Cell, GridState, RegionMask};
use crate::stats::{count_transitions, Census};
use anyhow::Result;
use log::{debug, info, trace};
use propaganda_common::{
    BaseParameters, Controls, Player, Side, SimulationConfig, StepStats, StepTransitions,
    ThresholdDistribution,
};
use rand::distr::Uniform;
use rand::prelude::*;
use rand::seq::index;
use rand_distr::Normal;
use rayon::prelude::*;
use std::time::Instant;

/// Rewiring probability used until configured otherwise.
pub const DEFAULT_REWIRING_PROBABILITY: f64 = 0.1;

// Mixed into the seed for social-graph builds so they don't replay the seeding stream.
const GRAPH_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Owns the grid, the actors, the campaign state and the social graph, and drives one
/// full update per [`Simulation::step`].
pub struct Simulation {
    /// Double-buffered cell grid.
    state: GridState,
    params: BaseParameters,
    player_a: Player,
    player_b: Player,
    /// Actors as last passed to `set_players`; restored by `reset`.
    initial_players: (Player, Player),
    /// Broadcast stocks live here.
    campaign: CampaignEngine,
    neighbourhood: NeighbourhoodType,
    rewiring_probability: f64,
    graph: SocialGraph,
    /// Seed for the seeding RNG and (salted) for graph builds.
    seed: u64,
    rng: StdRng,
    threshold_distribution: ThresholdDistribution,
    /// Counts used by the last `seed_randomly`, replayed by `reset`.
    seed_counts: (u32, u32),
    iteration: u64,
    last_stats: StepStats,
    /// Stores collected stats at record intervals.
    recorded_snapshots: Vec<StepStats>,
    /// Side changes made by `paint` since the last step; folded into the next step's stats.
    painted: StepTransitions,
}

impl Simulation {
    /// Creates a `cols x rows` grid of undecided, active cells with seed 0.
    pub fn new(cols: u32, rows: u32) -> Self {
        Self::with_seed(cols, rows, 0)
    }

    /// Creates a `cols x rows` grid whose pseudorandom draws all derive from `seed`.
    pub fn with_seed(cols: u32, rows: u32, seed: u64) -> Self {
        let player = Player::default();
        let mut sim = Self {
            state: GridState::new(cols, rows),
            params: BaseParameters::default(),
            player_a: player.clone(),
            player_b: player.clone(),
            initial_players: (player.clone(), player),
            campaign: CampaignEngine::new(),
            neighbourhood: NeighbourhoodType::default(),
            rewiring_probability: DEFAULT_REWIRING_PROBABILITY,
            graph: SocialGraph::default(),
            seed,
            rng: StdRng::seed_from_u64(seed),
            threshold_distribution: ThresholdDistribution::default(),
            seed_counts: (0, 0),
            iteration: 0,
            last_stats: StepStats::default(),
            recorded_snapshots: Vec::new(),
            painted: StepTransitions::default(),
        };
        sim.rebuild_graph();
        info!("Simulation initialised: {}x{} cells, seed {}.", cols, rows, seed);
        sim
    }

    /// Builds a simulation from a validated configuration and performs the initial seeding.
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut sim = Self::with_seed(config.grid.cols, config.grid.rows, config.seeding.seed);
        sim.params = config.parameters.clone();
        sim.set_players(config.player_a.clone(), config.player_b.clone());
        sim.neighbourhood = config.network.neighbourhood;
        sim.rewiring_probability = config.network.rewiring_probability;
        sim.threshold_distribution = config.seeding.threshold.clone();
        sim.seed_randomly(config.seeding.count_a, config.seeding.count_b)?; // Also rebuilds the graph
        Ok(sim)
    }

    /// Advances the simulation by one step and returns the resulting stats.
    ///
    /// Campaign spend is settled first, then every active cell's next state is computed
    /// from the pre-step grid into the scratch buffer, and the buffers are swapped.
    /// Transitions include side changes painted since the previous step.
    pub fn step(&mut self) -> &StepStats {
        let step_start = Instant::now();

        // --- 1. Campaign: debit budgets, update stocks, produce global signals ---
        let outcome = self.campaign.apply(&mut self.player_a, &mut self.player_b, &self.params);
        let signals = outcome.signals;

        // --- 2. Per-cell pass (parallel): read current, write next ---
        let params = &self.params;
        let topology = offsets(self.neighbourhood);
        let (view, next) = self.state.split_for_step();
        let aggregator = InfluenceAggregator::new(view, topology, &self.graph, &signals, params);

        next.par_iter_mut().enumerate().for_each(|(idx, out)| {
            let cell = &view.cells[idx];
            *out = if cell.active {
                hysteresis::next_state(cell, &aggregator.components_at(idx), &signals, params)
            } else {
                *cell
            };
        });
        let mut transitions = count_transitions(view.cells, next);
        transitions.merge(&std::mem::take(&mut self.painted));

        // --- 3. Swap Buffers: next becomes current ---
        self.state.swap_buffers();
        self.iteration += 1;

        let mut stats = StepStats {
            iteration: self.iteration,
            transitions,
            campaign: outcome.diag,
            signals,
            budget_a: self.player_a.budget,
            budget_b: self.player_b.budget,
            params: self.params.clone(),
            ..StepStats::default()
        };
        Census::of(self.state.cells()).fill(&mut stats);

        trace!(
            "Step {} completed in {:.3} ms ({} transitions).",
            self.iteration,
            step_start.elapsed().as_secs_f64() * 1000.0,
            stats.transitions.total()
        );
        self.last_stats = stats;
        &self.last_stats
    }

    /// Clears every cell, zeroes stocks and the iteration counter, restores the actors,
    /// replays the last seeding and rebuilds the social graph. Activity mask and region
    /// tags are kept. The RNG restarts from the seed, so a reset reproduces the initial state.
    pub fn reset(&mut self) -> Result<()> {
        info!("Resetting simulation...");
        self.state.clear_cells();
        self.campaign.reset();
        self.iteration = 0;
        let (a, b) = self.initial_players.clone();
        self.player_a = a;
        self.player_b = b;
        self.rng = StdRng::seed_from_u64(self.seed);
        self.last_stats = StepStats::default();
        self.recorded_snapshots.clear();
        self.painted = StepTransitions::default();

        let (count_a, count_b) = self.seed_counts;
        self.seed_randomly(count_a, count_b)
    }

    /// Re-randomizes thresholds and places `count_a` A cells and `count_b` B cells on
    /// distinct active, undecided cells chosen uniformly at random.
    ///
    /// Fails without touching the grid if fewer eligible cells exist than requested.
    pub fn seed_randomly(&mut self, count_a: u32, count_b: u32) -> Result<()> {
        let eligible: Vec<usize> = self
            .state
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.active && c.side == Side::Undecided)
            .map(|(i, _)| i)
            .collect();
        let requested = count_a as usize + count_b as usize;
        if requested > eligible.len() {
            anyhow::bail!(
                "Cannot seed {} A + {} B cells: only {} active undecided cells are available.",
                count_a, count_b, eligible.len()
            );
        }

        self.set_threshold_randomly()?;

        // Sample without replacement: first count_a picks become A, the rest B.
        let picks = index::sample(&mut self.rng, eligible.len(), requested);
        let cells = self.state.cells_mut();
        for (k, pick) in picks.iter().enumerate() {
            let cell = &mut cells[eligible[pick]];
            cell.side = if k < count_a as usize { Side::A } else { Side::B };
            cell.hysteresis = 0.0;
        }
        self.seed_counts = (count_a, count_b);
        info!("Seeded {} A and {} B cells among {} eligible.", count_a, count_b, eligible.len());

        self.rebuild_graph();
        Ok(())
    }

    /// Sets every cell's threshold to `threshold`.
    pub fn set_all_threshold(&mut self, threshold: f64) {
        for cell in self.state.cells_mut() {
            cell.threshold = threshold;
        }
    }

    /// Draws a fresh threshold for every active cell from the configured distribution.
    pub fn set_threshold_randomly(&mut self) -> Result<()> {
        let sampler = ThresholdSampler::new(&self.threshold_distribution)?;
        let rng = &mut self.rng;
        for cell in self.state.cells_mut().iter_mut().filter(|c| c.active) {
            cell.threshold = sampler.sample(rng);
        }
        Ok(())
    }

    pub fn set_threshold_distribution(&mut self, distribution: ThresholdDistribution) {
        self.threshold_distribution = distribution;
    }

    /// Replaces the tunables. Grid and social graph stay valid.
    pub fn set_parameters(&mut self, params: BaseParameters) {
        debug!("Parameters updated: {:?}", params);
        self.params = params;
    }

    /// Replaces both actors. They also become the state `reset` returns to.
    pub fn set_players(&mut self, player_a: Player, player_b: Player) {
        self.initial_players = (player_a.clone(), player_b.clone());
        self.player_a = player_a;
        self.player_b = player_b;
    }

    /// Sets this step's control intensities without touching budgets.
    pub fn set_controls(&mut self, controls_a: Controls, controls_b: Controls) {
        self.player_a.controls = controls_a;
        self.player_b.controls = controls_b;
    }

    /// Switches the topology and rebuilds the social graph.
    pub fn set_neighbourhood_type(&mut self, neighbourhood: NeighbourhoodType) {
        self.neighbourhood = neighbourhood;
        self.rebuild_graph();
    }

    /// Changes the small-world rewiring probability and rebuilds the social graph.
    pub fn set_rewiring_probability(&mut self, probability: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&probability) {
            anyhow::bail!("Rewiring probability must lie in [0, 1] (got {}).", probability);
        }
        self.rewiring_probability = probability;
        self.rebuild_graph();
        Ok(())
    }

    /// Applies the map collaborator's activity flags and region tags, then rebuilds the graph.
    pub fn set_region_mask(&mut self, mask: &RegionMask) -> Result<()> {
        self.state.apply_mask(mask)?;
        info!("Region mask applied: {} of {} cells active.", self.state.active_count(), self.state.len());
        self.rebuild_graph();
        Ok(())
    }

    /// Reactivates every cell and drops region tags.
    pub fn clear_region_mask(&mut self) {
        self.state.clear_mask();
        self.rebuild_graph();
    }

    /// Paints a cell directly, bypassing the state machine. Inactive cells are left alone.
    /// A side change is counted in the next step's transitions.
    ///
    /// # Panics
    /// If `(x, y)` lies outside the grid.
    pub fn paint(&mut self, x: u32, y: u32, side: Side) {
        let cell = self.state.cell_mut(x, y);
        if !cell.active {
            debug!("Ignoring paint on inactive cell ({}, {}).", x, y);
            return;
        }
        let previous = cell.side;
        cell.side = side;
        cell.hysteresis = 0.0;
        self.painted.record(previous, side);
    }

    fn rebuild_graph(&mut self) {
        let graph_seed = self
            .seed
            .wrapping_add(GRAPH_SEED_SALT)
            .wrapping_add(self.neighbourhood as u64);
        let mut rng = StdRng::seed_from_u64(graph_seed);
        self.graph = SocialGraph::build(
            self.state.view(),
            offsets(self.neighbourhood),
            self.rewiring_probability,
            &mut rng,
        );
        info!(
            "Social graph rebuilt ({:?}, p = {:.3}): {} edges over {} active cells.",
            self.neighbourhood,
            self.rewiring_probability,
            self.graph.edge_count(),
            self.state.active_count()
        );
    }

    /// Stats describing the current grid. Campaign fields come from the last step.
    pub fn current_stats(&self) -> StepStats {
        let mut stats = StepStats {
            iteration: self.iteration,
            budget_a: self.player_a.budget,
            budget_b: self.player_b.budget,
            params: self.params.clone(),
            ..self.last_stats.clone()
        };
        Census::of(self.state.cells()).fill(&mut stats);
        stats
    }

    /// Stores the current stats in the recorded history.
    pub fn record_snapshot(&mut self) {
        let stats = self.current_stats();
        debug!("Recording snapshot at iteration {}...", stats.iteration);
        self.recorded_snapshots.push(stats);
    }

    /// Provides access to the recorded snapshots.
    pub fn recorded_snapshots(&self) -> &[StepStats] {
        &self.recorded_snapshots
    }

    /// Stats of the most recent step.
    pub fn last_stats(&self) -> &StepStats {
        &self.last_stats
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn cols(&self) -> u32 {
        self.state.cols()
    }

    pub fn rows(&self) -> u32 {
        self.state.rows()
    }

    /// # Panics
    /// If `(x, y)` lies outside the grid.
    pub fn cell(&self, x: u32, y: u32) -> &Cell {
        self.state.cell(x, y)
    }

    /// Direct write access to a cell between steps.
    ///
    /// # Panics
    /// If `(x, y)` lies outside the grid.
    pub fn cell_mut(&mut self, x: u32, y: u32) -> &mut Cell {
        self.state.cell_mut(x, y)
    }

    pub fn try_cell(&self, x: u32, y: u32) -> Option<&Cell> {
        self.state.try_cell(x, y)
    }

    /// All cells of the current buffer, row-major.
    pub fn cells(&self) -> &[Cell] {
        self.state.cells()
    }

    pub fn params(&self) -> &BaseParameters {
        &self.params
    }

    pub fn player_a(&self) -> &Player {
        &self.player_a
    }

    pub fn player_b(&self) -> &Player {
        &self.player_b
    }

    pub fn neighbourhood(&self) -> NeighbourhoodType {
        self.neighbourhood
    }

    pub fn rewiring_probability(&self) -> f64 {
        self.rewiring_probability
    }

    pub fn social_graph(&self) -> &SocialGraph {
        &self.graph
    }

    pub fn broadcast_stock(&self) -> BroadcastStock {
        self.campaign.stock()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

// Threshold draws for seeding.
enum ThresholdSampler {
    Uniform(Uniform<f64>),
    Normal(Normal<f64>),
}

impl ThresholdSampler {
    fn new(distribution: &ThresholdDistribution) -> Result<Self> {
        Ok(match *distribution {
            ThresholdDistribution::Uniform { min, max } => Self::Uniform(Uniform::new(min, max)?),
            ThresholdDistribution::Normal { mean, std_dev } => Self::Normal(Normal::new(mean, std_dev)?),
        })
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Uniform(dist) => dist.sample(rng),
            Self::Normal(dist) => dist.sample(rng).clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_builds_graph_over_all_cells() {
        let sim = Simulation::new(6, 5);
        assert_eq!(sim.iteration(), 0);
        assert_eq!(sim.social_graph().len(), 30);
        assert!(sim.cells().iter().all(|c| c.side == Side::Undecided && c.threshold == 0.5));
    }

    #[test]
    fn seeding_places_exact_counts() {
        let mut sim = Simulation::with_seed(10, 10, 5);
        sim.seed_randomly(7, 4).unwrap();
        let stats = sim.current_stats();
        assert_eq!(stats.count_a, 7);
        assert_eq!(stats.count_b, 4);
        assert!(sim.cells().iter().all(|c| (0.0..1.0).contains(&c.threshold)));
    }

    #[test]
    fn overfull_seeding_fails_fast_and_leaves_grid_alone() {
        let mut sim = Simulation::with_seed(3, 3, 1);
        let mask = RegionMask::from_fn(3, 3, |x, _| (x == 0, None));
        sim.set_region_mask(&mask).unwrap();
        let err = sim.seed_randomly(2, 2).unwrap_err();
        assert!(err.to_string().contains("only 3"));
        assert!(sim.cells().iter().all(|c| c.side == Side::Undecided && c.threshold == 0.5));
    }

    #[test]
    fn seeding_only_uses_active_cells() {
        let mut sim = Simulation::with_seed(4, 4, 9);
        let mask = RegionMask::from_fn(4, 4, |_, y| (y < 2, Some(y as u8)));
        sim.set_region_mask(&mask).unwrap();
        sim.seed_randomly(4, 4).unwrap();
        for y in 2..4 {
            for x in 0..4 {
                assert_eq!(sim.cell(x, y).side, Side::Undecided);
            }
        }
        assert_eq!(sim.current_stats().count_undecided, 0);
    }

    #[test]
    fn normal_thresholds_stay_in_unit_interval() {
        let mut sim = Simulation::with_seed(20, 20, 3);
        sim.set_threshold_distribution(ThresholdDistribution::Normal { mean: 0.5, std_dev: 2.0 });
        sim.set_threshold_randomly().unwrap();
        assert!(sim.cells().iter().all(|c| (0.0..=1.0).contains(&c.threshold)));
    }

    #[test]
    fn set_all_threshold_overrides_every_cell() {
        let mut sim = Simulation::new(3, 2);
        sim.set_all_threshold(0.25);
        assert!(sim.cells().iter().all(|c| c.threshold == 0.25));
    }

    #[test]
    fn paint_bypasses_state_machine_and_skips_inactive() {
        let mut sim = Simulation::new(3, 1);
        sim.cell_mut(0, 0).hysteresis = 0.8;
        sim.paint(0, 0, Side::B);
        assert_eq!(sim.cell(0, 0).side, Side::B);
        assert_eq!(sim.cell(0, 0).hysteresis, 0.0);

        let mask = RegionMask::from_fn(3, 1, |x, _| (x != 2, None));
        sim.set_region_mask(&mask).unwrap();
        sim.paint(2, 0, Side::A);
        assert_eq!(sim.cell(2, 0).side, Side::Undecided);
    }

    #[test]
    fn painted_changes_show_up_in_next_step_transitions() {
        let mut sim = Simulation::new(4, 4);
        sim.paint(0, 0, Side::A);
        sim.paint(1, 0, Side::B);
        sim.paint(1, 0, Side::Undecided);
        sim.paint(2, 0, Side::Undecided); // Unchanged, not counted

        let t = sim.step().transitions;
        assert_eq!(t.undecided_to_a, 1);
        assert_eq!(t.undecided_to_b, 1);
        assert_eq!(t.b_to_undecided, 1);
        assert_eq!(t.total(), 3);

        // Counted once only
        assert_eq!(sim.step().transitions.total(), 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn cell_access_out_of_range_panics() {
        let sim = Simulation::new(3, 3);
        let _ = sim.cell(0, 3);
    }

    #[test]
    fn step_advances_iteration_and_records() {
        let mut sim = Simulation::with_seed(8, 8, 2);
        sim.seed_randomly(3, 3).unwrap();
        sim.record_snapshot();
        sim.step();
        sim.step();
        sim.record_snapshot();
        assert_eq!(sim.iteration(), 2);
        assert_eq!(sim.last_stats().iteration, 2);
        let recorded = sim.recorded_snapshots();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].iteration, 0);
        assert_eq!(recorded[0].count_a, 3);
        assert_eq!(recorded[1].iteration, 2);
    }

    #[test]
    fn rewiring_probability_is_validated() {
        let mut sim = Simulation::new(4, 4);
        assert!(sim.set_rewiring_probability(-0.1).is_err());
        sim.set_rewiring_probability(0.0).unwrap();
        assert_eq!(sim.social_graph().edge_count(), 32);
    }
}
