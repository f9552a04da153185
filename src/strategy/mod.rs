//! Targeting strategies and the registry that creates them by name.
//!
//! A strategy sees nothing of the opponent's board. It proposes one shot
//! at a time with [`Strategy::next_shot`] and learns the outcome through
//! [`Strategy::record_result`]. Every instance keeps its own fired
//! history, lives for exactly one match, and is dropped afterwards.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bitboard::BitBoard;
use crate::common::{Coord, ShotOutcome, StrategyError};

pub mod density;
pub mod hunt;
pub mod random;

pub use density::DensityStrategy;
pub use hunt::{HuntConfig, HuntStrategy};
pub use random::RandomStrategy;

/// Decision phase of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Searching for a ship.
    #[default]
    Explore,
    /// Finishing off a ship that has been hit but not sunk.
    Hunt,
}

/// Interface implemented by every targeting strategy.
pub trait Strategy: Send {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Choose the next target. The returned cell is in bounds, has never
    /// been returned before by this instance, and is recorded in the fired
    /// history before it is handed out.
    fn next_shot(&mut self, rng: &mut SmallRng) -> Result<Coord, StrategyError>;

    /// Inform the strategy of the outcome of a shot it proposed.
    fn record_result(&mut self, coord: Coord, outcome: ShotOutcome);

    /// Current decision phase.
    fn mode(&self) -> Mode {
        Mode::Explore
    }

    /// Every cell this instance has fired at.
    fn fired(&self) -> &BitBoard;
}

/// Builds a fresh strategy for a board of the given side length.
pub type StrategyFactory = Arc<dyn Fn(usize) -> Box<dyn Strategy> + Send + Sync>;

/// Name → factory table. Built once and handed to whoever needs to create
/// strategies; there is no global registry.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    factories: BTreeMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every strategy shipped with the crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(random::NAME, |n| Box::new(RandomStrategy::new(n)));
        registry.register(hunt::NAME, |n| {
            Box::new(HuntStrategy::with_config(n, HuntConfig::default()))
        });
        registry.register(hunt::PARITY_NAME, |n| {
            Box::new(HuntStrategy::with_config(n, HuntConfig::parity()))
        });
        registry.register(hunt::FENCED_NAME, |n| {
            Box::new(HuntStrategy::with_config(n, HuntConfig::fenced()))
        });
        registry.register(density::NAME, |n| Box::new(DensityStrategy::new(n)));
        registry
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(usize) -> Box<dyn Strategy> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Instantiate the strategy registered under `name`.
    pub fn create(&self, name: &str, board_size: usize) -> Result<Box<dyn Strategy>, StrategyError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| StrategyError::UnknownStrategy(name.to_string()))?;
        Ok(factory(board_size))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Uniform draws tried before falling back to enumerating the open cells.
const REJECTION_ROUNDS: usize = 256;

/// Draw a uniformly random cell that is not in `fired` and passes `allowed`.
/// Returns `None` when no such cell exists.
pub(crate) fn sample_untried<F>(rng: &mut SmallRng, fired: &BitBoard, allowed: F) -> Option<Coord>
where
    F: Fn(Coord) -> bool,
{
    let n = fired.size();
    if n == 0 || fired.is_full() {
        return None;
    }
    for _ in 0..REJECTION_ROUNDS {
        let c = Coord::new(
            rng.random_range(0..n) as i32,
            rng.random_range(0..n) as i32,
        );
        if !fired.contains(c) && allowed(c) {
            return Some(c);
        }
    }
    let open: Vec<Coord> = (!fired).iter().filter(|&c| allowed(c)).collect();
    if open.is_empty() {
        return None;
    }
    Some(open[rng.random_range(0..open.len())])
}

/// The 4-connected group of set cells in `cells` that contains `start`.
/// Ships never touch, so a fully hit ship is exactly one such group.
pub(crate) fn cluster_through(cells: &BitBoard, start: Coord) -> Vec<Coord> {
    let mut seen = BitBoard::<u64>::new(cells.size());
    let mut stack = vec![start];
    let mut out = Vec::new();
    while let Some(c) = stack.pop() {
        if !cells.contains(c) || seen.contains(c) {
            continue;
        }
        // contains() implies in bounds
        let _ = seen.set(c);
        out.push(c);
        stack.extend(c.neighbors4());
    }
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn registry_creates_by_name() {
        let registry = StrategyRegistry::with_builtin();
        assert_eq!(
            registry.names(),
            vec!["density", "hunt", "hunt-fenced", "hunt-parity", "random"]
        );
        let s = registry.create("hunt", 10).unwrap();
        assert_eq!(s.name(), "hunt");
        assert_eq!(s.mode(), Mode::Explore);
        assert!(matches!(
            registry.create("nope", 10),
            Err(StrategyError::UnknownStrategy(name)) if name == "nope"
        ));
    }

    #[test]
    fn custom_factories_can_be_registered() {
        let mut registry = StrategyRegistry::new();
        assert!(registry.is_empty());
        registry.register("mine", |n| Box::new(RandomStrategy::new(n)));
        assert!(registry.contains("mine"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn sampling_exhausts_then_reports_none() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut fired = BitBoard::new(3);
        for _ in 0..9 {
            let c = sample_untried(&mut rng, &fired, |_| true).unwrap();
            assert!(!fired.contains(c));
            fired.set(c).unwrap();
        }
        assert_eq!(sample_untried(&mut rng, &fired, |_| true), None);
    }

    #[test]
    fn sampling_respects_filter() {
        let mut rng = SmallRng::seed_from_u64(9);
        let fired = BitBoard::new(4);
        for _ in 0..50 {
            let c = sample_untried(&mut rng, &fired, |c| c.row == 2).unwrap();
            assert_eq!(c.row, 2);
        }
        assert_eq!(sample_untried(&mut rng, &fired, |c| c.row == 9), None);
    }

    #[test]
    fn cluster_stops_at_gaps() {
        let cells = BitBoard::from_coords(
            6,
            [
                Coord::new(1, 1),
                Coord::new(1, 2),
                Coord::new(1, 3),
                Coord::new(3, 3),
            ],
        )
        .unwrap();
        assert_eq!(
            cluster_through(&cells, Coord::new(1, 2)),
            vec![Coord::new(1, 1), Coord::new(1, 2), Coord::new(1, 3)]
        );
        assert_eq!(cluster_through(&cells, Coord::new(3, 3)), vec![Coord::new(3, 3)]);
    }
}
