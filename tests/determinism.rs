use propaganda_common::{BaseParameters, Controls, Player, SimulationConfig};
use propaganda_engine::{Cell, NeighbourhoodType, Simulation};

fn scenario_config(seed: u64) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.grid.cols = 40;
    config.grid.rows = 30;
    config.seeding.count_a = 40;
    config.seeding.count_b = 35;
    config.seeding.seed = seed;
    config.parameters = BaseParameters::scenario_one();
    config.player_a = Player {
        controls: Controls { white_broadcast: 1.0, grey_social: 0.5, black_dm: 0.2, ..Controls::default() },
        ..Player::default()
    };
    config.player_b = Player {
        controls: Controls { white_broadcast: 0.7, white_dm: 0.8, ..Controls::default() },
        ..Player::default()
    };
    config
}

fn run_simulation(seed: u64, steps: usize) -> Vec<Cell> {
    let mut sim = Simulation::from_config(&scenario_config(seed)).expect("valid config");
    for _ in 0..steps {
        sim.step();
    }
    sim.cells().to_vec()
}

#[test]
fn same_seed_same_grid() {
    let grid_a = run_simulation(7, 60);
    let grid_b = run_simulation(7, 60);
    assert_eq!(grid_a, grid_b);
}

#[test]
fn different_seeds_diverge() {
    let grid_a = run_simulation(7, 0);
    let grid_b = run_simulation(8, 0);
    assert_ne!(grid_a, grid_b);
}

#[test]
fn reset_reproduces_the_initial_state() {
    let mut sim = Simulation::from_config(&scenario_config(11)).expect("valid config");
    let initial = sim.cells().to_vec();
    let initial_graph = sim.social_graph().clone();
    let initial_budget = sim.player_a().budget;

    for _ in 0..30 {
        sim.step();
    }
    sim.record_snapshot();
    assert!(sim.player_a().budget < initial_budget);

    sim.reset().expect("reset succeeds");
    assert_eq!(sim.iteration(), 0);
    assert_eq!(sim.cells(), initial.as_slice());
    assert_eq!(sim.social_graph(), &initial_graph);
    assert_eq!(sim.player_a().budget, initial_budget);
    assert_eq!(sim.broadcast_stock().a, 0.0);
    assert!(sim.recorded_snapshots().is_empty());
}

#[test]
fn topology_switch_is_idempotent() {
    let mut sim = Simulation::from_config(&scenario_config(3)).expect("valid config");
    sim.set_neighbourhood_type(NeighbourhoodType::Moore);
    let once = sim.social_graph().clone();
    sim.set_neighbourhood_type(NeighbourhoodType::Moore);
    assert_eq!(sim.social_graph(), &once);

    sim.set_neighbourhood_type(NeighbourhoodType::VonNeumann);
    assert_ne!(sim.social_graph(), &once);
    sim.set_neighbourhood_type(NeighbourhoodType::Moore);
    assert_eq!(sim.social_graph(), &once);
}
