use serde::{Deserialize, Serialize};

use crate::ship::ShipClass;

pub const DEFAULT_BOARD_SIZE: usize = 20;
pub const NUM_SHIPS: usize = 5;
pub const FLEET: [ShipClass; NUM_SHIPS] = [
    ShipClass::new("Carrier", 5),
    ShipClass::new("Battleship", 4),
    ShipClass::new("Cruiser", 3),
    ShipClass::new("Submarine", 3),
    ShipClass::new("Destroyer", 2),
];

/// Total number of ship segments used in the standard fleet.
pub const TOTAL_SHIP_CELLS: usize = 5 + 4 + 3 + 3 + 2;

/// Attempts allowed per ship before placement gives up.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

/// Ship lengths of the standard fleet, in placement order.
pub fn standard_ship_lengths() -> Vec<usize> {
    FLEET.iter().map(|s| s.length()).collect()
}

/// Which shot events a match keeps for later display. Never affects play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Every shot.
    All,
    /// Opening shots, hits, sinkings, the shot after a sinking, shots fired
    /// while a wounded ship is being chased, and the final shot.
    #[default]
    HitsOnly,
    /// Nothing.
    Silent,
}

/// Everything the simulation core reads from the outside world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    pub board_size: usize,
    pub ship_lengths: Vec<usize>,
    pub trials_per_pair: usize,
    pub verbosity: Verbosity,
    /// Attach a snapshot of the receiving board to every kept event.
    pub record_boards: bool,
    /// Fixed RNG seed for reproducible runs; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            ship_lengths: standard_ship_lengths(),
            trials_per_pair: 1,
            verbosity: Verbosity::HitsOnly,
            record_boards: false,
            seed: None,
        }
    }
}
