//! Layer geometry: a 2D grid of pools (stripes), each a 2D grid of units.
//!
//! Units are laid out pool-major with implicit positions:
//!   pool = i / (unit_y * unit_x), uy = (i % nn) / unit_x, ux = i % unit_x
//!
//! No per-unit position storage; coordinates are computed on demand.

use std::ops::Range;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    pub pool_y: usize,
    pub pool_x: usize,
    pub unit_y: usize,
    pub unit_x: usize,
}

/// One independently gateable group of units within a layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolRange {
    pub index: usize,
    pub units: Range<usize>,
}

impl Shape {
    /// Four-dimensional shape `[pool_y, pool_x, unit_y, unit_x]`.
    /// Panics if any dimension is zero.
    pub fn new(pool_y: usize, pool_x: usize, unit_y: usize, unit_x: usize) -> Self {
        assert!(
            pool_y > 0 && pool_x > 0 && unit_y > 0 && unit_x > 0,
            "layer dimensions must be non-zero"
        );
        Self { pool_y, pool_x, unit_y, unit_x }
    }

    /// Single-pool layer of `unit_y x unit_x` units.
    pub fn flat(unit_y: usize, unit_x: usize) -> Self {
        Self::new(1, 1, unit_y, unit_x)
    }

    #[inline]
    pub fn n_pools(&self) -> usize {
        self.pool_y * self.pool_x
    }

    #[inline]
    pub fn units_per_pool(&self) -> usize {
        self.unit_y * self.unit_x
    }

    /// Total number of units.
    #[inline]
    pub fn len(&self) -> usize {
        self.n_pools() * self.units_per_pool()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pool index owning unit `i`.
    #[inline]
    pub fn pool_of(&self, i: usize) -> usize {
        i / self.units_per_pool()
    }

    /// `(pool, uy, ux)` for flat unit index `i`.
    #[inline]
    pub fn coords(&self, i: usize) -> (usize, usize, usize) {
        let nn = self.units_per_pool();
        let ui = i % nn;
        (i / nn, ui / self.unit_x, ui % self.unit_x)
    }

    /// Flat index of `(pool, uy, ux)`.
    #[inline]
    pub fn index(&self, pool: usize, uy: usize, ux: usize) -> usize {
        pool * self.units_per_pool() + uy * self.unit_x + ux
    }

    /// Unit index range of pool `p`.
    #[inline]
    pub fn pool_units(&self, p: usize) -> Range<usize> {
        let nn = self.units_per_pool();
        p * nn..(p + 1) * nn
    }

    pub fn pools(&self) -> impl Iterator<Item = PoolRange> + '_ {
        (0..self.n_pools()).map(move |p| PoolRange { index: p, units: self.pool_units(p) })
    }
}
