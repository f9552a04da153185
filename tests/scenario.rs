use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use broadside::strategy::HuntStrategy;
use broadside::{
    run_session_with, BitBoard, Board, Coord, Fleet, MatchOptions, Mode, Orientation, PeerId, Ship,
    ShotOutcome, Side, Strategy, StrategyError, Verbosity,
};
use rand::{rngs::SmallRng, SeedableRng};

/// Fires a fixed list of cells while feeding every outcome to a real hunt
/// engine, and records the engine's mode after each shot.
struct Scripted {
    shots: VecDeque<Coord>,
    engine: HuntStrategy,
    fired: BitBoard,
    modes: Arc<Mutex<Vec<Mode>>>,
}

impl Scripted {
    fn new(n: usize, shots: &[Coord], modes: Arc<Mutex<Vec<Mode>>>) -> Self {
        modes.lock().unwrap().push(Mode::Explore);
        Self {
            shots: shots.iter().copied().collect(),
            engine: HuntStrategy::new(n),
            fired: BitBoard::new(n),
            modes,
        }
    }
}

impl Strategy for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn next_shot(&mut self, _rng: &mut SmallRng) -> Result<Coord, StrategyError> {
        let c = self.shots.pop_front().ok_or(StrategyError::NoValidMoveLeft)?;
        self.fired.set(c).unwrap();
        Ok(c)
    }

    fn record_result(&mut self, coord: Coord, outcome: ShotOutcome) {
        self.engine.record_result(coord, outcome);
        self.modes.lock().unwrap().push(self.engine.mode());
    }

    fn mode(&self) -> Mode {
        self.engine.mode()
    }

    fn fired(&self) -> &BitBoard {
        &self.fired
    }
}

fn single_ship_board(n: usize, origin: Coord, length: usize) -> Board {
    let ship = Ship::new(length, origin, Orientation::Horizontal, n).unwrap();
    Board::new(n, Fleet::from_ships(vec![ship]).unwrap()).unwrap()
}

fn side(board: Board, strategy: impl Strategy + 'static) -> Side {
    Side {
        board,
        strategy: Box::new(strategy),
        rng: SmallRng::seed_from_u64(0),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn three_cell_ship_sinks_in_three_turns() {
    let modes_a = Arc::new(Mutex::new(Vec::new()));
    let modes_b = Arc::new(Mutex::new(Vec::new()));
    let a = side(
        single_ship_board(5, Coord::new(4, 0), 2),
        Scripted::new(
            5,
            &[Coord::new(1, 1), Coord::new(1, 2), Coord::new(1, 3)],
            modes_a.clone(),
        ),
    );
    let b = side(
        single_ship_board(5, Coord::new(1, 1), 3),
        Scripted::new(5, &[Coord::new(0, 4), Coord::new(2, 4)], modes_b.clone()),
    );
    let opts = MatchOptions {
        strategy_a: "scripted".into(),
        strategy_b: "scripted".into(),
        verbosity: Verbosity::All,
        ..MatchOptions::default()
    };

    let report = run_session_with(a, b, opts).await.unwrap();
    let result = report.result;

    assert_eq!(result.winner, PeerId::A);
    assert_eq!(result.rounds(), 3);
    assert_eq!((result.shots_a, result.hits_a), (3, 3));
    assert_eq!((result.shots_b, result.hits_b), (2, 0));
    assert_eq!(result.turns, 5);

    let trace = modes_a.lock().unwrap().clone();
    assert_eq!(trace, vec![Mode::Explore, Mode::Hunt, Mode::Hunt, Mode::Explore]);
    let mut collapsed = trace.clone();
    collapsed.dedup();
    assert_eq!(collapsed, vec![Mode::Explore, Mode::Hunt, Mode::Explore]);
    assert!(modes_b.lock().unwrap().iter().all(|&m| m == Mode::Explore));

    let outcomes: Vec<_> = result.events.iter().map(|e| (e.turn, e.shooter, e.outcome)).collect();
    assert_eq!(
        outcomes,
        vec![
            (0, PeerId::A, ShotOutcome::Hit),
            (1, PeerId::B, ShotOutcome::Miss),
            (2, PeerId::A, ShotOutcome::Hit),
            (3, PeerId::B, ShotOutcome::Miss),
            (4, PeerId::A, ShotOutcome::FleetDestroyed),
        ]
    );
    assert_eq!(report.barriers_a, vec![1, 2, 3, 4, 5]);
    assert_eq!(report.barriers_a, report.barriers_b);
}

#[tokio::test(flavor = "multi_thread")]
async fn second_peer_can_win() {
    let a = side(
        single_ship_board(5, Coord::new(0, 0), 2),
        Scripted::new(5, &[Coord::new(4, 4), Coord::new(4, 3)], Arc::default()),
    );
    let b = side(
        single_ship_board(5, Coord::new(3, 3), 2),
        Scripted::new(5, &[Coord::new(0, 0), Coord::new(0, 1)], Arc::default()),
    );
    let report = run_session_with(a, b, MatchOptions::default()).await.unwrap();
    assert_eq!(report.result.winner, PeerId::B);
    assert_eq!(report.result.turns, 4);
    assert_eq!(report.result.rounds(), 2);
    assert!(report.result.events.is_empty());
}
