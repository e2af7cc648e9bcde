//! Unit state: SoA (Structure of Arrays) layout for the per-cycle hot loops.
//!
//! Each unit field is a separate contiguous array so the settle, gating and
//! learning passes iterate over dense memory. Every array has exactly one
//! entry per unit and is never resized after build.

use std::ops::Range;

use crate::shape::Shape;

/// Flags byte encoding:
/// - Bit 0: unit is lesioned / off and skipped by every pass
/// - Bits 1-7: reserved
pub mod flags {
    pub const OFF_BIT: u8 = 0x01;

    #[inline]
    pub fn is_off(f: u8) -> bool {
        f & OFF_BIT != 0
    }

    #[inline]
    pub fn set_off(f: u8, off: bool) -> u8 {
        if off {
            f | OFF_BIT
        } else {
            f & !OFF_BIT
        }
    }
}

/// SoA unit storage.
pub struct NeuronArrays {
    /// Rate-code activation in [0, 1].
    pub act: Vec<f32>,
    /// Externally clamped / expected value.
    pub ext: Vec<f32>,
    /// Net excitatory input accumulated from projections this cycle.
    pub ge_raw: Vec<f32>,
    /// Total excitatory conductance after extra drive (e.g. maintenance).
    pub ge: Vec<f32>,
    /// Learning activation consumed by trace learning. Signed on matrix
    /// layers (negative when the stripe did not gate).
    pub act_lrn: Vec<f32>,
    /// Peak activation over the integration window of the current trial.
    pub alpha_max: Vec<f32>,
    /// Primary value copied in by a PV layer broadcast.
    pub pv_act: Vec<f32>,
    /// Zero-based pool index of each unit.
    pub sub_pool: Vec<u32>,
    /// Bit flags, see [`flags`].
    pub flags: Vec<u8>,
}

impl NeuronArrays {
    /// Allocate arrays for every unit of `shape`, all at rest.
    pub fn new(shape: &Shape) -> Self {
        let n = shape.len();
        let sub_pool = (0..n).map(|i| shape.pool_of(i) as u32).collect();
        Self {
            act: vec![0.0; n],
            ext: vec![0.0; n],
            ge_raw: vec![0.0; n],
            ge: vec![0.0; n],
            act_lrn: vec![0.0; n],
            alpha_max: vec![0.0; n],
            pv_act: vec![0.0; n],
            sub_pool,
            flags: vec![0u8; n],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.act.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.act.is_empty()
    }

    #[inline]
    pub fn is_off(&self, i: usize) -> bool {
        flags::is_off(self.flags[i])
    }

    pub fn set_off(&mut self, i: usize, off: bool) {
        self.flags[i] = flags::set_off(self.flags[i], off);
    }

    /// Return every dynamic variable to rest. Flags and pool membership persist.
    pub fn init_acts(&mut self) {
        self.act.fill(0.0);
        self.ext.fill(0.0);
        self.ge_raw.fill(0.0);
        self.ge.fill(0.0);
        self.act_lrn.fill(0.0);
        self.alpha_max.fill(0.0);
        self.pv_act.fill(0.0);
    }

    /// Decay activation state of `range` toward rest by `frac` (0 = none, 1 = full).
    pub fn decay_range(&mut self, range: Range<usize>, frac: f32) {
        if frac <= 0.0 {
            return;
        }
        let frac = frac.min(1.0);
        for i in range {
            if self.is_off(i) {
                continue;
            }
            self.act[i] -= frac * self.act[i];
            self.ge[i] -= frac * self.ge[i];
            self.ge_raw[i] -= frac * self.ge_raw[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_sized_to_shape() {
        let arr = NeuronArrays::new(&Shape::new(1, 3, 2, 2));
        assert_eq!(arr.len(), 12);
        assert_eq!(arr.sub_pool[0], 0);
        assert_eq!(arr.sub_pool[4], 1);
        assert_eq!(arr.sub_pool[11], 2);
    }

    #[test]
    fn off_flag_roundtrip() {
        let mut arr = NeuronArrays::new(&Shape::flat(1, 4));
        arr.set_off(2, true);
        assert!(arr.is_off(2));
        assert!(!arr.is_off(1));
        arr.set_off(2, false);
        assert!(!arr.is_off(2));
    }

    #[test]
    fn decay_moves_toward_rest() {
        let mut arr = NeuronArrays::new(&Shape::flat(1, 4));
        arr.act.fill(0.8);
        arr.decay_range(0..2, 0.5);
        assert!((arr.act[0] - 0.4).abs() < 1e-6);
        assert!((arr.act[1] - 0.4).abs() < 1e-6);
        assert!((arr.act[2] - 0.8).abs() < 1e-6);

        arr.decay_range(2..4, 1.0);
        assert_eq!(arr.act[3], 0.0);
    }

    #[test]
    fn zero_decay_is_noop() {
        let mut arr = NeuronArrays::new(&Shape::flat(1, 2));
        arr.act.fill(0.3);
        arr.decay_range(0..2, 0.0);
        assert!((arr.act[0] - 0.3).abs() < 1e-6);
    }
}
