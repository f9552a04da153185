use std::collections::HashSet;

use broadside::strategy::HuntStrategy;
use broadside::{
    place_fleet, standard_ship_lengths, Board, Coord, Mode, ShotOutcome, Strategy, StrategyError,
    StrategyRegistry,
};
use proptest::prelude::*;
use rand::{rngs::SmallRng, SeedableRng};

fn random_board(seed: u64, n: usize) -> Board {
    let mut rng = SmallRng::seed_from_u64(seed);
    let fleet = place_fleet(&mut rng, n, &standard_ship_lengths()).unwrap();
    Board::new(n, fleet).unwrap()
}

/// Every queued candidate must touch the sole hit, or extend the line of
/// hits by one cell at either end.
fn check_hunt_invariant(s: &HuntStrategy) -> Result<(), String> {
    let hits = s.confirmed_hits();
    for c in s.candidates() {
        let ok = match hits {
            [] => false,
            [h] => h.chebyshev(c) == 1 && (h.row == c.row || h.col == c.col),
            _ => {
                let mut sorted = hits.to_vec();
                sorted.sort();
                let (lo, hi) = (sorted[0], sorted[sorted.len() - 1]);
                let horizontal = lo.row == hi.row;
                let on_line = if horizontal { c.row == lo.row } else { c.col == lo.col };
                let next_to_end = if horizontal {
                    c.col == lo.col - 1 || c.col == hi.col + 1
                } else {
                    c.row == lo.row - 1 || c.row == hi.row + 1
                };
                on_line && next_to_end
            }
        };
        if !ok {
            return Err(format!("candidate {c} does not follow hits {hits:?}"));
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn hunt_candidates_follow_the_hits(seed in any::<u64>()) {
        let mut board = random_board(seed, 10);
        let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(1));
        let mut s = HuntStrategy::new(10);
        loop {
            let c = s.next_shot(&mut rng).unwrap();
            let outcome = board.receive_shot(c).unwrap();
            s.record_result(c, outcome);
            if let Err(msg) = check_hunt_invariant(&s) {
                prop_assert!(false, "{}", msg);
            }
            if outcome.is_sink() {
                prop_assert_eq!(s.mode(), Mode::Explore);
                prop_assert!(s.confirmed_hits().is_empty());
                prop_assert_eq!(s.candidates().count(), 0);
            }
            if outcome == ShotOutcome::FleetDestroyed {
                break;
            }
        }
    }

    #[test]
    fn no_strategy_fires_twice(seed in any::<u64>(), pick in 0usize..5) {
        let registry = StrategyRegistry::with_builtin();
        let name = registry.names()[pick].clone();
        let mut board = random_board(seed, 10);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut s = registry.create(&name, 10).unwrap();
        let mut seen = HashSet::new();
        loop {
            let c = s.next_shot(&mut rng).unwrap();
            prop_assert!(c.in_bounds(10));
            prop_assert!(seen.insert(c), "{} fired twice at {}", name, c);
            let outcome = board.receive_shot(c).unwrap();
            s.record_result(c, outcome);
            if outcome == ShotOutcome::FleetDestroyed {
                break;
            }
        }
        prop_assert_eq!(s.fired().count_ones(), seen.len());
    }
}

#[test]
fn hit_hit_sunk_on_a_three_cell_ship() {
    let mut s = HuntStrategy::new(5);
    let mut modes = vec![s.mode()];
    for (c, outcome) in [
        (Coord::new(1, 1), ShotOutcome::Hit),
        (Coord::new(1, 2), ShotOutcome::Hit),
        (Coord::new(1, 3), ShotOutcome::Sunk),
    ] {
        s.record_result(c, outcome);
        modes.push(s.mode());
    }
    assert_eq!(modes, vec![Mode::Explore, Mode::Hunt, Mode::Hunt, Mode::Explore]);
    assert!(s.confirmed_hits().is_empty());
    assert_eq!(s.candidates().count(), 0);
}

#[test]
fn exhausted_board_reports_no_valid_move() {
    let registry = StrategyRegistry::with_builtin();
    let mut rng = SmallRng::seed_from_u64(99);
    for name in registry.names() {
        let mut s = registry.create(&name, 3).unwrap();
        for _ in 0..9 {
            let c = s.next_shot(&mut rng).unwrap();
            s.record_result(c, ShotOutcome::Miss);
        }
        assert_eq!(
            s.next_shot(&mut rng).unwrap_err(),
            StrategyError::NoValidMoveLeft,
            "{name}"
        );
    }
}
