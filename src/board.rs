//! A player's own board: the cell grid plus the fleet sailing on it.

use serde::{Deserialize, Serialize};

use crate::bitboard::BitBoard;
use crate::common::{BoardError, CellState, Coord, ShotOutcome};
use crate::fleet::Fleet;

/// Copy of a board's cells, taken only when an event log asks for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub size: usize,
    pub cells: Vec<CellState>,
}

impl BoardSnapshot {
    pub fn cell(&self, c: Coord) -> Option<CellState> {
        c.in_bounds(self.size).then(|| self.cells[c.index(self.size)])
    }
}

/// Main board state: ship cells, hits and misses.
#[derive(Debug, Clone)]
pub struct Board {
    size: usize,
    cells: Vec<CellState>,
    fleet: Fleet,
    shot: BitBoard,
}

impl Board {
    /// Lay `fleet` onto an empty `size×size` board.
    pub fn new(size: usize, fleet: Fleet) -> Result<Self, BoardError> {
        let mut cells = vec![CellState::Empty; size * size];
        for c in fleet.ships().iter().flat_map(|s| s.footprint()) {
            if !c.in_bounds(size) {
                return Err(BoardError::OutOfBounds(c));
            }
            let cell = &mut cells[c.index(size)];
            if *cell == CellState::ShipPresent {
                return Err(BoardError::Occupied(c));
            }
            *cell = CellState::ShipPresent;
        }
        Ok(Board {
            size,
            cells,
            fleet,
            shot: BitBoard::new(size),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn cell(&self, c: Coord) -> Result<CellState, BoardError> {
        if !c.in_bounds(self.size) {
            return Err(BoardError::OutOfBounds(c));
        }
        Ok(self.cells[c.index(self.size)])
    }

    /// Returns `true` when every ship has been sunk.
    pub fn fleet_destroyed(&self) -> bool {
        self.fleet.is_empty()
    }

    /// Apply an incoming shot at `c`.
    ///
    /// A shot on a live ship marks the cell hit and removes it from the
    /// ship; a ship with no cells left leaves the fleet. The last ship
    /// leaving reports [`ShotOutcome::FleetDestroyed`]. Firing twice at
    /// the same cell is an error.
    pub fn receive_shot(&mut self, c: Coord) -> Result<ShotOutcome, BoardError> {
        if !c.in_bounds(self.size) {
            return Err(BoardError::OutOfBounds(c));
        }
        if self.shot.contains(c) {
            return Err(BoardError::AlreadyShot(c));
        }
        self.shot.set(c)?;
        let idx = c.index(self.size);

        let ships = self.fleet.ships_mut();
        match ships.iter().position(|s| s.occupies(c)) {
            Some(i) => {
                ships[i].strike(c);
                self.cells[idx] = CellState::Hit;
                if !ships[i].is_sunk() {
                    return Ok(ShotOutcome::Hit);
                }
                ships.remove(i);
                if ships.is_empty() {
                    Ok(ShotOutcome::FleetDestroyed)
                } else {
                    Ok(ShotOutcome::Sunk)
                }
            }
            None => {
                self.cells[idx] = CellState::Miss;
                Ok(ShotOutcome::Miss)
            }
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            size: self.size,
            cells: self.cells.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ship::{Orientation, Ship};

    fn two_ship_board() -> Board {
        let fleet = Fleet::from_ships(vec![
            Ship::new(2, Coord::new(0, 0), Orientation::Horizontal, 5).unwrap(),
            Ship::new(1, Coord::new(4, 4), Orientation::Vertical, 5).unwrap(),
        ])
        .unwrap();
        Board::new(5, fleet).unwrap()
    }

    #[test]
    fn miss_hit_sunk_destroyed() {
        let mut board = two_ship_board();
        assert_eq!(board.receive_shot(Coord::new(2, 2)), Ok(ShotOutcome::Miss));
        assert_eq!(board.cell(Coord::new(2, 2)), Ok(CellState::Miss));
        assert_eq!(board.receive_shot(Coord::new(0, 0)), Ok(ShotOutcome::Hit));
        assert_eq!(board.receive_shot(Coord::new(0, 1)), Ok(ShotOutcome::Sunk));
        assert_eq!(board.fleet().len(), 1);
        assert_eq!(
            board.receive_shot(Coord::new(4, 4)),
            Ok(ShotOutcome::FleetDestroyed)
        );
        assert!(board.fleet_destroyed());
        assert_eq!(board.cell(Coord::new(4, 4)), Ok(CellState::Hit));
    }

    #[test]
    fn repeated_and_stray_shots_are_errors() {
        let mut board = two_ship_board();
        board.receive_shot(Coord::new(0, 0)).unwrap();
        assert_eq!(
            board.receive_shot(Coord::new(0, 0)),
            Err(BoardError::AlreadyShot(Coord::new(0, 0)))
        );
        assert_eq!(
            board.receive_shot(Coord::new(5, 0)),
            Err(BoardError::OutOfBounds(Coord::new(5, 0)))
        );
    }

    #[test]
    fn snapshot_reflects_cells() {
        let mut board = two_ship_board();
        board.receive_shot(Coord::new(0, 1)).unwrap();
        let snap = board.snapshot();
        assert_eq!(snap.cell(Coord::new(0, 0)), Some(CellState::ShipPresent));
        assert_eq!(snap.cell(Coord::new(0, 1)), Some(CellState::Hit));
        assert_eq!(snap.cell(Coord::new(1, 1)), Some(CellState::Empty));
        assert_eq!(snap.cell(Coord::new(9, 9)), None);
    }
}
