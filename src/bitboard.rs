//! A runtime-sized bitboard.
//!
//! Boards are `N×N` grids packed row-major into a vector of unsigned words
//! `T`. Unlike a single-integer board, `N` is chosen at construction, so
//! the default 20×20 board (400 cells) fits as easily as a 5×5 test board.

use core::fmt;
use core::ops::{BitAnd, BitOr, Not};
use num_traits::{PrimInt, Unsigned, Zero};

use crate::common::{BoardError, Coord};

/// An `N×N` set of cells stored in words of type `T`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitBoard<T = u64>
where
    T: PrimInt + Unsigned,
{
    size: usize,
    words: Vec<T>,
}

impl<T> BitBoard<T>
where
    T: PrimInt + Unsigned,
{
    #[inline]
    fn word_bits() -> usize {
        T::zero().count_zeros() as usize
    }

    /// Create an empty board of side `size`.
    pub fn new(size: usize) -> Self {
        let cells = size * size;
        let words = cells.div_ceil(Self::word_bits());
        BitBoard {
            size,
            words: vec![T::zero(); words],
        }
    }

    /// Create a board from an iterator of coordinates.
    pub fn from_coords<I>(size: usize, coords: I) -> Result<Self, BoardError>
    where
        I: IntoIterator<Item = Coord>,
    {
        let mut board = Self::new(size);
        for c in coords {
            board.set(c)?;
        }
        Ok(board)
    }

    /// Side length of the board.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells (`N * N`).
    pub fn capacity(&self) -> usize {
        self.size * self.size
    }

    #[inline]
    fn locate(&self, c: Coord) -> Result<(usize, usize), BoardError> {
        if !c.in_bounds(self.size) {
            return Err(BoardError::OutOfBounds(c));
        }
        let idx = c.index(self.size);
        Ok((idx / Self::word_bits(), idx % Self::word_bits()))
    }

    /// Returns whether `c` is set. Out-of-range coordinates are never set.
    #[inline]
    pub fn contains(&self, c: Coord) -> bool {
        match self.locate(c) {
            Ok((w, b)) => ((self.words[w] >> b) & T::one()) != T::zero(),
            Err(_) => false,
        }
    }

    /// Sets the bit at `c`.
    pub fn set(&mut self, c: Coord) -> Result<(), BoardError> {
        let (w, b) = self.locate(c)?;
        self.words[w] = self.words[w] | (T::one() << b);
        Ok(())
    }

    /// Clears the bit at `c`.
    pub fn clear(&mut self, c: Coord) -> Result<(), BoardError> {
        let (w, b) = self.locate(c)?;
        self.words[w] = self.words[w] & !(T::one() << b);
        Ok(())
    }

    /// Number of set cells.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| w.is_zero())
    }

    /// `true` when every cell of the board is set.
    pub fn is_full(&self) -> bool {
        self.count_ones() == self.capacity()
    }

    /// Iterator over set cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        let n = self.size;
        (0..self.capacity())
            .filter(move |&idx| {
                let w = idx / Self::word_bits();
                let b = idx % Self::word_bits();
                ((self.words[w] >> b) & T::one()) != T::zero()
            })
            .map(move |idx| Coord::new((idx / n) as i32, (idx % n) as i32))
    }

    /// The board grown by one cell in every direction (including diagonals),
    /// clipped to the edges. Every set cell's 8-neighborhood becomes set.
    pub fn halo(&self) -> Self {
        let mut out = self.clone();
        for c in self.iter() {
            for n in c.neighbors8() {
                // clipped at the border
                let _ = out.set(n);
            }
        }
        out
    }

    /// Returns `true` if the two boards share at least one cell.
    pub fn intersects(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .any(|(a, b)| !(*a & *b).is_zero())
    }

    // Bits past N*N in the last word must stay clear for counting to work.
    fn trim(mut self) -> Self {
        let used = self.capacity() % Self::word_bits();
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last = *last & ((T::one() << used) - T::one());
            }
        }
        self
    }
}

impl<T> BitAnd for &BitBoard<T>
where
    T: PrimInt + Unsigned,
{
    type Output = BitBoard<T>;
    fn bitand(self, rhs: Self) -> BitBoard<T> {
        debug_assert_eq!(self.size, rhs.size);
        BitBoard {
            size: self.size,
            words: self
                .words
                .iter()
                .zip(rhs.words.iter())
                .map(|(a, b)| *a & *b)
                .collect(),
        }
    }
}

impl<T> BitOr for &BitBoard<T>
where
    T: PrimInt + Unsigned,
{
    type Output = BitBoard<T>;
    fn bitor(self, rhs: Self) -> BitBoard<T> {
        debug_assert_eq!(self.size, rhs.size);
        BitBoard {
            size: self.size,
            words: self
                .words
                .iter()
                .zip(rhs.words.iter())
                .map(|(a, b)| *a | *b)
                .collect(),
        }
    }
}

/// Complement within board bounds.
impl<T> Not for &BitBoard<T>
where
    T: PrimInt + Unsigned,
{
    type Output = BitBoard<T>;
    fn not(self) -> BitBoard<T> {
        BitBoard {
            size: self.size,
            words: self.words.iter().map(|w| !*w).collect(),
        }
        .trim()
    }
}

impl<T> fmt::Debug for BitBoard<T>
where
    T: PrimInt + Unsigned,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BitBoard<{}>:", self.size)?;
        for r in 0..self.size as i32 {
            for c in 0..self.size as i32 {
                let bit = if self.contains(Coord::new(r, c)) { '■' } else { '□' };
                write!(f, "{} ", bit)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
