//! Ship classes and placed ships.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::common::{BoardError, Coord};

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Unit step along the ship's axis as `(dr, dc)`.
    pub fn step(self) -> (i32, i32) {
        match self {
            Orientation::Horizontal => (0, 1),
            Orientation::Vertical => (1, 0),
        }
    }
}

/// Type of ship: name and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipClass {
    name: &'static str,
    length: usize,
}

impl ShipClass {
    pub const fn new(name: &'static str, length: usize) -> Self {
        Self { name, length }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

/// A placed ship. Keeps the cells that have not been hit yet; it is sunk
/// once that list is empty.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    length: usize,
    origin: Coord,
    orientation: Orientation,
    afloat: Vec<Coord>,
}

impl Ship {
    /// Lay out a ship of `length` cells starting at `origin`. Fails if any
    /// cell would fall off an `n×n` board.
    pub fn new(
        length: usize,
        origin: Coord,
        orientation: Orientation,
        n: usize,
    ) -> Result<Self, BoardError> {
        let (dr, dc) = orientation.step();
        let mut cells = Vec::with_capacity(length);
        for i in 0..length as i32 {
            let c = origin.offset(dr * i, dc * i);
            if !c.in_bounds(n) {
                return Err(BoardError::OutOfBounds(c));
            }
            cells.push(c);
        }
        Ok(Ship {
            length,
            origin,
            orientation,
            afloat: cells,
        })
    }

    /// Full footprint of the ship, hit or not.
    pub fn footprint(&self) -> impl Iterator<Item = Coord> + '_ {
        let (dr, dc) = self.orientation.step();
        (0..self.length as i32).map(move |i| self.origin.offset(dr * i, dc * i))
    }

    /// Cells not yet hit.
    pub fn afloat(&self) -> &[Coord] {
        &self.afloat
    }

    pub fn occupies(&self, c: Coord) -> bool {
        self.afloat.contains(&c)
    }

    /// Remove `c` from the unhit cells. Returns `true` if it was there.
    pub fn strike(&mut self, c: Coord) -> bool {
        match self.afloat.iter().position(|&x| x == c) {
            Some(i) => {
                self.afloat.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn is_sunk(&self) -> bool {
        self.afloat.is_empty()
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn origin(&self) -> Coord {
        self.origin
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }
}

impl fmt::Debug for Ship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ship {{ length: {}, origin: {}, orientation: {:?}, afloat: {} }}",
            self.length,
            self.origin,
            self.orientation,
            self.afloat.len(),
        )
    }
}
