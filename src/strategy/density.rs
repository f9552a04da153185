// Probability-density targeting for the opponent board.

use rand::rngs::SmallRng;
use rand::Rng;

use super::{cluster_through, sample_untried, Mode, Strategy};
use crate::bitboard::BitBoard;
use crate::common::{Coord, ShotOutcome, StrategyError};
use crate::config::standard_ship_lengths;
use crate::ship::Orientation;

pub const NAME: &str = "density";

/// Placements covering `k` open hits weigh `HIT_BIAS^k`, so cells next to a
/// wounded ship dominate the density.
const HIT_BIAS: f64 = 10.0;

/// Sampling temperature. Below 1 sharpens the density toward its peaks.
const TEMPERATURE: f64 = 0.5;

/// Compute a probability density over an `n×n` board.
///
/// Every placement of every remaining ship length, in both orientations,
/// that avoids `blocked` contributes its weight to each of its cells that is
/// neither blocked nor already hit. The result is row-major and sums to 1,
/// or is uniform when no placement fits.
pub fn calc_pdf(hits: &BitBoard, blocked: &BitBoard, remaining: &[usize]) -> Vec<f64> {
    let n = hits.size();
    let mut matrix = vec![0.0f64; n * n];

    for &len in remaining.iter() {
        if len == 0 || len > n {
            continue;
        }
        for orient in [Orientation::Horizontal, Orientation::Vertical] {
            let (dr, dc) = orient.step();
            let (rows, cols) = match orient {
                Orientation::Horizontal => (n, n - len + 1),
                Orientation::Vertical => (n - len + 1, n),
            };
            for r in 0..rows as i32 {
                for c in 0..cols as i32 {
                    let cells = (0..len as i32).map(|k| Coord::new(r + dr * k, c + dc * k));
                    if cells.clone().any(|x| blocked.contains(x)) {
                        continue;
                    }
                    let n_hits = cells.clone().filter(|&x| hits.contains(x)).count();
                    let weight = HIT_BIAS.powi(n_hits as i32);
                    for x in cells.filter(|&x| !hits.contains(x)) {
                        matrix[x.index(n)] += weight;
                    }
                }
            }
        }
    }

    normalize(matrix)
}

fn normalize(mut matrix: Vec<f64>) -> Vec<f64> {
    let total: f64 = matrix.iter().sum();
    if total == 0.0 {
        let uniform = 1.0 / matrix.len().max(1) as f64;
        matrix.iter_mut().for_each(|v| *v = uniform);
        return matrix;
    }
    matrix.iter_mut().for_each(|v| *v /= total);
    matrix
}

/// Sample a cell index from a density using a temperature parameter.
/// Returns `None` if the density has no mass at all.
pub fn sample_pdf<R: Rng + ?Sized>(pdf: &[f64], temperature: f64, rng: &mut R) -> Option<usize> {
    let adjusted: Vec<f64> = pdf.iter().map(|v| v.powf(1.0 / temperature)).collect();
    let total: f64 = adjusted.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let threshold: f64 = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, v) in adjusted.iter().enumerate() {
        cumulative += v;
        if threshold < cumulative {
            return Some(i);
        }
    }
    adjusted.iter().rposition(|&v| v > 0.0)
}

/// Fires where the remaining ships most likely are, given everything
/// learned so far.
pub struct DensityStrategy {
    fired: BitBoard,
    /// Hits on ships not yet sunk.
    open_hits: BitBoard,
    /// Misses, sunk ships and the ring around each sunk ship.
    blocked: BitBoard,
    remaining: Vec<usize>,
}

impl DensityStrategy {
    /// Density targeting against the standard fleet.
    pub fn new(board_size: usize) -> Self {
        Self::with_fleet(board_size, standard_ship_lengths())
    }

    /// Density targeting against a fleet with the given ship lengths.
    pub fn with_fleet(board_size: usize, ship_lengths: Vec<usize>) -> Self {
        Self {
            fired: BitBoard::new(board_size),
            open_hits: BitBoard::new(board_size),
            blocked: BitBoard::new(board_size),
            remaining: ship_lengths,
        }
    }

    /// Lengths of enemy ships not yet sunk.
    pub fn remaining(&self) -> &[usize] {
        &self.remaining
    }

    /// Current density over the board.
    pub fn density(&self) -> Vec<f64> {
        calc_pdf(&self.open_hits, &self.blocked, &self.remaining)
    }
}

impl Strategy for DensityStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn next_shot(&mut self, rng: &mut SmallRng) -> Result<Coord, StrategyError> {
        let n = self.fired.size();
        let pdf: Vec<f64> = self
            .density()
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                let c = Coord::new((i / n) as i32, (i % n) as i32);
                if self.fired.contains(c) { 0.0 } else { p }
            })
            .collect();
        let c = match sample_pdf(&pdf, TEMPERATURE, rng) {
            Some(i) => Coord::new((i / n) as i32, (i % n) as i32),
            None => sample_untried(rng, &self.fired, |_| true)
                .ok_or(StrategyError::NoValidMoveLeft)?,
        };
        self.fired.set(c).map_err(|_| StrategyError::NoValidMoveLeft)?;
        Ok(c)
    }

    fn record_result(&mut self, coord: Coord, outcome: ShotOutcome) {
        let n = self.fired.size();
        match outcome {
            ShotOutcome::Miss => {
                let _ = self.blocked.set(coord);
            }
            ShotOutcome::Hit => {
                let _ = self.open_hits.set(coord);
            }
            ShotOutcome::Sunk | ShotOutcome::FleetDestroyed => {
                let _ = self.open_hits.set(coord);
                let ship = cluster_through(&self.open_hits, coord);
                for &c in &ship {
                    let _ = self.open_hits.clear(c);
                }
                if let Some(i) = self.remaining.iter().position(|&l| l == ship.len()) {
                    self.remaining.remove(i);
                }
                if let Ok(sunk) = BitBoard::from_coords(n, ship) {
                    self.blocked = &self.blocked | &sunk.halo();
                }
            }
        }
    }

    fn mode(&self) -> Mode {
        if self.open_hits.is_empty() {
            Mode::Explore
        } else {
            Mode::Hunt
        }
    }

    fn fired(&self) -> &BitBoard {
        &self.fired
    }
}
