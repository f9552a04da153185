//! Common types for the simulator: coordinates, cell states, shot outcomes
//! and the domain error enums.

use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A cell on the square board. Signed so that neighbor arithmetic can step
/// off the edge and be rejected by a bounds check afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Returns `true` if the coordinate lies on an `n×n` board.
    pub fn in_bounds(self, n: usize) -> bool {
        let n = n as i64;
        (0..n).contains(&(self.row as i64)) && (0..n).contains(&(self.col as i64))
    }

    pub fn offset(self, dr: i32, dc: i32) -> Self {
        Self::new(self.row + dr, self.col + dc)
    }

    /// The four orthogonal neighbors: up, down, left, right.
    pub fn neighbors4(self) -> [Coord; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }

    /// The eight cells surrounding this one.
    pub fn neighbors8(self) -> impl Iterator<Item = Coord> {
        (-1..=1)
            .flat_map(move |dr| (-1..=1).map(move |dc| (dr, dc)))
            .filter(|&(dr, dc)| dr != 0 || dc != 0)
            .map(move |(dr, dc)| self.offset(dr, dc))
    }

    /// Chebyshev (king-move) distance.
    pub fn chebyshev(self, other: Coord) -> u32 {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }

    /// Row-major index on an `n×n` board. Caller guarantees bounds.
    pub(crate) fn index(self, n: usize) -> usize {
        self.row as usize * n + self.col as usize
    }
}

impl From<(i32, i32)> for Coord {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// State of a single cell on a player's own board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Empty,
    ShipPresent,
    Hit,
    Miss,
}

/// Result of a shot as reported by the receiving board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotOutcome {
    Miss,
    Hit,
    /// A ship lost its last cell but the fleet still floats.
    Sunk,
    /// The last ship of the fleet went down.
    FleetDestroyed,
}

impl ShotOutcome {
    /// `true` for every outcome that struck a ship.
    pub fn is_hit(self) -> bool {
        !matches!(self, ShotOutcome::Miss)
    }

    /// `true` when a ship went down, including the last one.
    pub fn is_sink(self) -> bool {
        matches!(self, ShotOutcome::Sunk | ShotOutcome::FleetDestroyed)
    }
}

/// Errors returned by board operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("coordinate {0} is outside the board")]
    OutOfBounds(Coord),
    #[error("coordinate {0} was already shot")]
    AlreadyShot(Coord),
    #[error("cell {0} is already occupied")]
    Occupied(Coord),
    #[error("ship cell {0} touches another ship")]
    TooClose(Coord),
}

/// Fleet placement failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("no legal position for a ship of length {length} on a {board_size}x{board_size} board after {attempts} attempts")]
    Infeasible {
        length: usize,
        board_size: usize,
        attempts: usize,
    },
}

/// Errors raised by strategies and the strategy registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("every cell of the board has already been fired upon")]
    NoValidMoveLeft,
    #[error("no strategy registered under the name `{0}`")]
    UnknownStrategy(String),
}

/// Fatal conditions inside a running session. None of them is recoverable
/// within the match; the match is aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("protocol desynchronization: expected {expected}, got {got}")]
    ProtocolDesynchronization { expected: String, got: String },
    #[error("partner closed the {0} channel")]
    ChannelClosed(&'static str),
    #[error("peers disagree at match end: {0}")]
    StatsMismatch(String),
}

impl SessionError {
    pub(crate) fn desync(expected: impl fmt::Display, got: impl fmt::Display) -> Self {
        SessionError::ProtocolDesynchronization {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}
