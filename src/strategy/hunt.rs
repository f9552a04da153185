//! Two-phase targeting: explore at random until something is hit, then hunt
//! along the wounded ship until it sinks.
//!
//! While hunting, the strategy keeps the confirmed hits on the current
//! target and a FIFO queue of candidate cells derived from them:
//!
//! * one hit: its four orthogonal neighbors;
//! * two or more hits: the hits are sorted, the unit step between the first
//!   two gives the ship's axis, and the only candidates are one step before
//!   the lowest hit and one step past the highest.
//!
//! Candidates that are off the board or already fired are dropped. When
//! the queue runs dry the next shot falls back to exploring, but the mode
//! stays `Hunt` until a sinking is reported.

use std::collections::VecDeque;

use rand::rngs::SmallRng;

use super::{cluster_through, sample_untried, Mode, Strategy};
use crate::bitboard::BitBoard;
use crate::common::{Coord, ShotOutcome, StrategyError};

pub const NAME: &str = "hunt";
pub const PARITY_NAME: &str = "hunt-parity";
pub const FENCED_NAME: &str = "hunt-fenced";

/// Optional refinements of the basic explore/hunt engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HuntConfig {
    /// Explore only cells with even `row + col` while any remain untried.
    pub parity: bool,
    /// Never fire into the one-cell ring around a sunk ship. Sound because
    /// fleets keep their ships at least one cell apart.
    pub fence_sunk: bool,
}

impl HuntConfig {
    pub fn parity() -> Self {
        Self {
            parity: true,
            ..Self::default()
        }
    }

    pub fn fenced() -> Self {
        Self {
            fence_sunk: true,
            ..Self::default()
        }
    }
}

pub struct HuntStrategy {
    config: HuntConfig,
    mode: Mode,
    candidates: VecDeque<Coord>,
    hits: Vec<Coord>,
    fired: BitBoard,
    /// Sunk ships and their surrounding ring; only filled when fencing.
    fence: BitBoard,
}

impl HuntStrategy {
    /// Plain explore/hunt with uniform exploration.
    pub fn new(board_size: usize) -> Self {
        Self::with_config(board_size, HuntConfig::default())
    }

    pub fn with_config(board_size: usize, config: HuntConfig) -> Self {
        Self {
            config,
            mode: Mode::Explore,
            candidates: VecDeque::new(),
            hits: Vec::new(),
            fired: BitBoard::new(board_size),
            fence: BitBoard::new(board_size),
        }
    }

    pub fn config(&self) -> HuntConfig {
        self.config
    }

    /// Hits on the ship currently being chased.
    pub fn confirmed_hits(&self) -> &[Coord] {
        &self.hits
    }

    /// Pending hunt candidates, in the order they will be tried.
    pub fn candidates(&self) -> impl Iterator<Item = Coord> + '_ {
        self.candidates.iter().copied()
    }

    fn is_open(&self, c: Coord) -> bool {
        c.in_bounds(self.fired.size())
            && !self.fired.contains(c)
            && !(self.config.fence_sunk && self.fence.contains(c))
    }

    fn refresh_candidates(&mut self) {
        self.candidates.clear();
        let raw: Vec<Coord> = match self.hits.len() {
            0 => return,
            1 => self.hits[0].neighbors4().to_vec(),
            _ => {
                self.hits.sort();
                // Trusts the first pair for the axis; hits on one ship are colinear.
                let (a, b) = (self.hits[0], self.hits[1]);
                let (dr, dc) = ((b.row - a.row).signum(), (b.col - a.col).signum());
                let first = self.hits[0];
                let last = self.hits[self.hits.len() - 1];
                vec![first.offset(-dr, -dc), last.offset(dr, dc)]
            }
        };
        let open: Vec<Coord> = raw.into_iter().filter(|&c| self.is_open(c)).collect();
        self.candidates.extend(open);
    }

    fn explore(&self, rng: &mut SmallRng) -> Option<Coord> {
        let fence = self.config.fence_sunk.then_some(&self.fence);
        let unfenced = |c: Coord| !fence.is_some_and(|f| f.contains(c));
        if self.config.parity {
            let on_parity = |c: Coord| (c.row + c.col) % 2 == 0 && unfenced(c);
            if let Some(c) = sample_untried(rng, &self.fired, on_parity) {
                return Some(c);
            }
        }
        // A fence can cover every open cell near the end of a match; any
        // untried cell is still a legal shot.
        sample_untried(rng, &self.fired, unfenced)
            .or_else(|| sample_untried(rng, &self.fired, |_| true))
    }

    fn close_in(&mut self, c: Coord) {
        if self.config.fence_sunk {
            let hits = BitBoard::from_coords(self.fired.size(), self.hits.iter().copied())
                .unwrap_or_else(|_| BitBoard::new(self.fired.size()));
            let ship = BitBoard::from_coords(self.fired.size(), cluster_through(&hits, c))
                .unwrap_or_else(|_| BitBoard::new(self.fired.size()));
            self.fence = &self.fence | &ship.halo();
        }
        self.hits.clear();
        self.candidates.clear();
        self.mode = Mode::Explore;
    }
}

impl Strategy for HuntStrategy {
    fn name(&self) -> &str {
        match (self.config.parity, self.config.fence_sunk) {
            (false, false) => NAME,
            (true, false) => PARITY_NAME,
            (false, true) => FENCED_NAME,
            (true, true) => "hunt-parity-fenced",
        }
    }

    fn next_shot(&mut self, rng: &mut SmallRng) -> Result<Coord, StrategyError> {
        let mut target = None;
        if self.mode == Mode::Hunt {
            while let Some(c) = self.candidates.pop_front() {
                if self.is_open(c) {
                    target = Some(c);
                    break;
                }
            }
        }
        let c = match target {
            Some(c) => c,
            None => self.explore(rng).ok_or(StrategyError::NoValidMoveLeft)?,
        };
        self.fired.set(c).map_err(|_| StrategyError::NoValidMoveLeft)?;
        Ok(c)
    }

    fn record_result(&mut self, coord: Coord, outcome: ShotOutcome) {
        match outcome {
            ShotOutcome::Miss => {}
            ShotOutcome::Hit => {
                self.hits.push(coord);
                self.mode = Mode::Hunt;
                self.refresh_candidates();
            }
            ShotOutcome::Sunk | ShotOutcome::FleetDestroyed => {
                self.hits.push(coord);
                self.close_in(coord);
            }
        }
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn fired(&self) -> &BitBoard {
        &self.fired
    }
}
