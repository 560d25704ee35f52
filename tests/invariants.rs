use propaganda_common::{BaseParameters, Controls, Player, Side};
use propaganda_engine::{NeighbourhoodType, RegionMask, Simulation};

fn aggressive_players() -> (Player, Player) {
    let a = Player {
        budget: 400.0,
        controls: Controls {
            white_broadcast: 3.0,
            black_broadcast: 2.0,
            grey_social: 1.5,
            black_dm: 1.0,
            ..Controls::default()
        },
        ..Player::default()
    };
    let b = Player {
        budget: 250.0,
        controls: Controls {
            grey_broadcast: 4.0,
            white_social: 2.0,
            white_dm: 2.5,
            ..Controls::default()
        },
        ..Player::default()
    };
    (a, b)
}

#[test]
fn state_stays_bounded_over_a_long_run() {
    let mut sim = Simulation::with_seed(30, 24, 99);
    let params = BaseParameters {
        dm_hys_gain: 0.05,
        social_hys_gain: 0.05,
        broadcast_hys_gain: 0.2,
        ..BaseParameters::scenario_one()
    };
    sim.set_parameters(params.clone());
    let (a, b) = aggressive_players();
    sim.set_players(a, b);
    sim.set_neighbourhood_type(NeighbourhoodType::Moore);
    sim.seed_randomly(60, 60).unwrap();

    for step in 0..300 {
        let before = sim.cells().to_vec();
        let stats = sim.step().clone();
        assert!(stats.budget_a >= 0.0 && stats.budget_b >= 0.0, "negative budget at step {}", step);
        assert_eq!(stats.count_a + stats.count_b + stats.count_undecided, stats.active);

        let stock = sim.broadcast_stock();
        assert!((0.0..=params.broadcast_stock_max).contains(&stock.a));
        assert!((0.0..=params.broadcast_stock_max).contains(&stock.b));

        for (old, cell) in before.iter().zip(sim.cells()) {
            if old.side.is_aligned() && cell.side == old.side.opposite() {
                assert_eq!(cell.hysteresis, 0.0, "flip kept hysteresis at step {}", step);
            }
            assert!(cell.hysteresis.is_finite());
            assert!(cell.hysteresis >= 0.0 && cell.hysteresis <= params.hys_max_total);
        }
    }
    // Both budgets run dry long before the end
    assert!(sim.player_a().budget < 1e-9);
    assert!(sim.player_b().budget < 1e-9);
}

#[test]
fn lowering_the_cap_mid_run_is_enforced() {
    let mut sim = Simulation::with_seed(16, 16, 5);
    sim.set_parameters(BaseParameters { broadcast_hys_gain: 0.5, ..BaseParameters::scenario_one() });
    let (a, b) = aggressive_players();
    sim.set_players(a, b);
    sim.seed_randomly(40, 40).unwrap();
    for _ in 0..40 {
        sim.step();
    }

    sim.set_parameters(BaseParameters { hys_max_total: 0.1, ..sim.params().clone() });
    sim.step();
    assert!(sim.cells().iter().all(|c| c.hysteresis <= 0.1));
}

#[test]
fn seeding_more_than_eligible_is_an_error() {
    let mut sim = Simulation::with_seed(5, 5, 1);
    assert!(sim.seed_randomly(20, 6).is_err());
    sim.seed_randomly(20, 5).unwrap();
    assert!(sim.cells().iter().all(|c| c.side != Side::Undecided));
    // Nothing left to seed on top
    assert!(sim.seed_randomly(1, 0).is_err());
}

#[test]
fn fully_masked_grid_has_no_edges_and_steps_safely() {
    let mut sim = Simulation::with_seed(6, 6, 2);
    sim.set_region_mask(&RegionMask::from_fn(6, 6, |_, _| (false, None))).unwrap();
    assert_eq!(sim.social_graph().edge_count(), 0);
    assert!(sim.seed_randomly(1, 0).is_err());

    let (a, b) = aggressive_players();
    sim.set_players(a, b);
    let stats = sim.step();
    assert_eq!(stats.active, 0);
    assert_eq!(stats.share_a, 0.0);
}

#[test]
fn graph_edges_avoid_inactive_cells() {
    let mut sim = Simulation::with_seed(10, 10, 8);
    sim.set_rewiring_probability(0.5).unwrap();
    let mask = RegionMask::from_fn(10, 10, |x, _| (x < 5, Some(if x < 3 { 1 } else { 2 })));
    sim.set_region_mask(&mask).unwrap();

    let graph = sim.social_graph();
    for (idx, cell) in sim.cells().iter().enumerate() {
        if !cell.active {
            assert!(graph.neighbours(idx).is_empty());
        }
        for &j in graph.neighbours(idx) {
            assert!(sim.cells()[j as usize].active);
            assert_ne!(j as usize, idx);
        }
    }
    assert_eq!(sim.cell(1, 4).region, Some(1));
    assert_eq!(sim.cell(4, 4).region, Some(2));

    sim.clear_region_mask();
    assert!(sim.cells().iter().all(|c| c.active && c.region.is_none()));
}

#[test]
fn mask_size_mismatch_is_rejected() {
    let mut sim = Simulation::new(4, 4);
    let mask = RegionMask::from_fn(3, 4, |_, _| (true, None));
    assert!(sim.set_region_mask(&mask).is_err());
}

#[test]
fn hot_swapped_negative_cap_does_not_panic() {
    let mut sim = Simulation::with_seed(4, 4, 12);
    sim.seed_randomly(4, 4).unwrap();
    let (a, b) = aggressive_players();
    sim.set_players(a, b);
    for _ in 0..3 {
        sim.step();
    }

    sim.set_parameters(BaseParameters { hys_max_total: -0.5, ..BaseParameters::scenario_one() });
    sim.step();
    sim.step();
    assert!(sim.cells().iter().all(|c| c.hysteresis == 0.0));
}
