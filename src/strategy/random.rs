use rand::rngs::SmallRng;

use super::{sample_untried, Strategy};
use crate::bitboard::BitBoard;
use crate::common::{Coord, ShotOutcome, StrategyError};

pub const NAME: &str = "random";

/// Fires at uniformly random untried cells and ignores every outcome.
pub struct RandomStrategy {
    fired: BitBoard,
}

impl RandomStrategy {
    pub fn new(board_size: usize) -> Self {
        Self {
            fired: BitBoard::new(board_size),
        }
    }
}

impl Strategy for RandomStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn next_shot(&mut self, rng: &mut SmallRng) -> Result<Coord, StrategyError> {
        let c = sample_untried(rng, &self.fired, |_| true).ok_or(StrategyError::NoValidMoveLeft)?;
        self.fired.set(c).map_err(|_| StrategyError::NoValidMoveLeft)?;
        Ok(c)
    }

    fn record_result(&mut self, _coord: Coord, _outcome: ShotOutcome) {}

    fn fired(&self) -> &BitBoard {
        &self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn covers_the_board_without_repeats() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut s = RandomStrategy::new(4);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..16 {
            let c = s.next_shot(&mut rng).unwrap();
            assert!(c.in_bounds(4));
            assert!(seen.insert(c));
            s.record_result(c, ShotOutcome::Miss);
        }
        assert_eq!(s.next_shot(&mut rng), Err(StrategyError::NoValidMoveLeft));
    }
}
