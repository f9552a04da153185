//! Fleets and randomized fleet placement.
//!
//! Ships are placed one after the other. For each ship an orientation and a
//! legal origin are drawn uniformly; the draw is rejected when any of its
//! cells falls inside the one-cell halo of the ships already placed. There
//! is no backtracking across ships, so each ship gets a bounded number of
//! draws and placement fails with [`PlacementError::Infeasible`] when they
//! run out.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bitboard::BitBoard;
use crate::common::{BoardError, Coord, PlacementError};
use crate::config::MAX_PLACEMENT_ATTEMPTS;
use crate::ship::{Orientation, Ship};

/// The ships still afloat for one player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fleet {
    ships: Vec<Ship>,
}

impl Fleet {
    /// Build a fleet from explicit ships, checking that no two ships come
    /// within Chebyshev distance 1 of each other.
    pub fn from_ships(ships: Vec<Ship>) -> Result<Self, BoardError> {
        for (i, a) in ships.iter().enumerate() {
            for b in &ships[i + 1..] {
                for ca in a.footprint() {
                    if let Some(cb) = b.footprint().find(|&cb| cb.chebyshev(ca) <= 1) {
                        return Err(if cb == ca {
                            BoardError::Occupied(cb)
                        } else {
                            BoardError::TooClose(cb)
                        });
                    }
                }
            }
        }
        Ok(Fleet { ships })
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub(crate) fn ships_mut(&mut self) -> &mut Vec<Ship> {
        &mut self.ships
    }

    pub fn len(&self) -> usize {
        self.ships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    /// Cells covered by the full footprint of every ship.
    pub fn occupancy(&self, n: usize) -> Result<BitBoard, BoardError> {
        BitBoard::from_coords(n, self.ships.iter().flat_map(|s| s.footprint()))
    }

    /// Smallest Chebyshev distance between cells of two distinct ships, or
    /// `None` for fleets of fewer than two ships.
    pub fn min_separation(&self) -> Option<u32> {
        let mut best = None;
        for (i, a) in self.ships.iter().enumerate() {
            for b in &self.ships[i + 1..] {
                for ca in a.footprint() {
                    for cb in b.footprint() {
                        let d = ca.chebyshev(cb);
                        best = Some(best.map_or(d, |m: u32| m.min(d)));
                    }
                }
            }
        }
        best
    }
}

/// Randomly place ships of the given lengths on an `n×n` board.
pub fn place_fleet<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    lengths: &[usize],
) -> Result<Fleet, PlacementError> {
    place_fleet_with_limit(rng, n, lengths, MAX_PLACEMENT_ATTEMPTS)
}

/// [`place_fleet`] with an explicit per-ship attempt budget.
pub fn place_fleet_with_limit<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    lengths: &[usize],
    max_attempts: usize,
) -> Result<Fleet, PlacementError> {
    let mut ships = Vec::with_capacity(lengths.len());
    // occupied cells plus their 8-neighborhood
    let mut blocked = BitBoard::<u64>::new(n);

    for &length in lengths {
        let infeasible = PlacementError::Infeasible {
            length,
            board_size: n,
            attempts: max_attempts,
        };
        if length == 0 || length > n {
            return Err(infeasible);
        }
        let mut placed = None;
        for _ in 0..max_attempts {
            let orientation = if rng.random() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let (max_r, max_c) = match orientation {
                Orientation::Horizontal => (n - 1, n - length),
                Orientation::Vertical => (n - length, n - 1),
            };
            let origin = Coord::new(
                rng.random_range(0..=max_r) as i32,
                rng.random_range(0..=max_c) as i32,
            );
            let ship = match Ship::new(length, origin, orientation, n) {
                Ok(ship) => ship,
                Err(_) => continue,
            };
            if ship.footprint().any(|c| blocked.contains(c)) {
                continue;
            }
            placed = Some(ship);
            break;
        }
        let ship = placed.ok_or_else(|| infeasible.clone())?;
        // only the new ship's ring is added; earlier rings must not grow
        let footprint = BitBoard::<u64>::from_coords(n, ship.footprint())
            .map_err(|_| infeasible)?;
        blocked = &blocked | &footprint.halo();
        ships.push(ship);
    }

    Ok(Fleet { ships })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::standard_ship_lengths;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn standard_fleet_on_default_board() {
        let mut rng = SmallRng::seed_from_u64(42);
        let fleet = place_fleet(&mut rng, 20, &standard_ship_lengths()).unwrap();
        let lengths: Vec<_> = fleet.ships().iter().map(|s| s.length()).collect();
        assert_eq!(lengths, vec![5, 4, 3, 3, 2]);
        assert!(fleet.min_separation().unwrap() >= 2);
        assert_eq!(fleet.occupancy(20).unwrap().count_ones(), 17);
    }

    #[test]
    fn undersized_board_fails_instead_of_spinning() {
        let mut rng = SmallRng::seed_from_u64(7);
        let err = place_fleet_with_limit(&mut rng, 4, &[3, 3, 3], 500).unwrap_err();
        assert!(matches!(err, PlacementError::Infeasible { length: 3, .. }));
    }

    #[test]
    fn later_ships_may_sit_two_cells_from_earlier_ones() {
        let mut placed = 0;
        for seed in 0..64 {
            let mut rng = SmallRng::seed_from_u64(seed);
            // a 3x3 board fits two 3-ships only on opposite edges
            if let Ok(fleet) = place_fleet_with_limit(&mut rng, 3, &[3, 3], 200) {
                assert_eq!(fleet.min_separation(), Some(2));
                placed += 1;
            }
        }
        assert!(placed > 0);
    }

    #[test]
    fn ring_around_first_ship_does_not_widen() {
        let mut rng = SmallRng::seed_from_u64(11);
        // ships along rows 0, 2 and 4 are the only way to fit three 5-ships
        let mut ok = 0;
        for _ in 0..200 {
            if let Ok(fleet) = place_fleet_with_limit(&mut rng, 5, &[5, 5, 5], 2_000) {
                assert_eq!(fleet.min_separation(), Some(2));
                ok += 1;
            }
        }
        assert!(ok > 0);
    }

    #[test]
    fn ship_longer_than_board_is_infeasible() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(place_fleet(&mut rng, 3, &[4]).is_err());
    }

    #[test]
    fn touching_ships_are_rejected() {
        let a = Ship::new(2, Coord::new(0, 0), Orientation::Horizontal, 5).unwrap();
        let b = Ship::new(2, Coord::new(1, 2), Orientation::Horizontal, 5).unwrap();
        assert_eq!(
            Fleet::from_ships(vec![a.clone(), b]),
            Err(BoardError::TooClose(Coord::new(1, 2)))
        );
        let c = Ship::new(2, Coord::new(2, 0), Orientation::Horizontal, 5).unwrap();
        assert_eq!(Fleet::from_ships(vec![a, c]).unwrap().min_separation(), Some(2));
    }
}
