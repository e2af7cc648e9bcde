//! Generic weight-update primitives shared by every learning projection.
//!
//! A learning rule computes a raw `dwt` per synapse; these primitives scale it
//! (normalization by the running max |dwt|, momentum) and apply accumulated
//! changes to the weights.

use crate::error::{GateError, Result};
use crate::synapse::Synapse;

/// Normalization of weight changes by a slowly decaying running max of |dwt|.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DWtNormParams {
    /// Default: true
    pub on: bool,
    /// Time constant for decay of the running max. Default: 1000
    pub decay_tau: f32,
    /// Floor on the normalizer. Default: 0.001
    pub norm_min: f32,
    /// Learning-rate compensation for the overall effect of normalization.
    /// Default: 0.15
    pub lr_comp: f32,
}

impl Default for DWtNormParams {
    fn default() -> Self {
        Self { on: true, decay_tau: 1000.0, norm_min: 0.001, lr_comp: 0.15 }
    }
}

impl DWtNormParams {
    #[inline]
    pub fn decay_dt_c(&self) -> f32 {
        1.0 - 1.0 / self.decay_tau
    }

    /// Update the running max in `norm` with `abs_dwt` and return the
    /// normalization factor. Returns 1 while the running max is zero.
    #[inline]
    pub fn norm_from_abs_dwt(&self, norm: &mut f32, abs_dwt: f32) -> f32 {
        *norm = (self.decay_dt_c() * *norm).max(abs_dwt);
        if *norm == 0.0 {
            return 1.0;
        }
        self.lr_comp / norm.max(self.norm_min)
    }
}

/// Momentum on weight changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MomentumParams {
    /// Default: true
    pub on: bool,
    /// Time constant of the momentum integration. Default: 10
    pub m_tau: f32,
    /// Learning-rate compensation. Default: 0.1
    pub lr_comp: f32,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self { on: true, m_tau: 10.0, lr_comp: 0.1 }
    }
}

impl MomentumParams {
    #[inline]
    pub fn m_dt_c(&self) -> f32 {
        1.0 - 1.0 / self.m_tau
    }

    /// Integrate `dwt` into `moment` and return the compensated result.
    #[inline]
    pub fn moment_from_dwt(&self, moment: &mut f32, dwt: f32) -> f32 {
        *moment = self.m_dt_c() * *moment + dwt;
        self.lr_comp * *moment
    }
}

/// Per-projection learning parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LearnParams {
    /// Learning enabled. When off, DWt is a no-op. Default: true
    pub learn: bool,
    /// Learning rate. Default: 0.04
    pub lrate: f32,
    pub norm: DWtNormParams,
    pub momentum: MomentumParams,
}

impl Default for LearnParams {
    fn default() -> Self {
        Self {
            learn: true,
            lrate: 0.04,
            norm: DWtNormParams::default(),
            momentum: MomentumParams::default(),
        }
    }
}

impl LearnParams {
    /// Trace projections carry no extra scaling by default.
    pub fn trace_defaults() -> Self {
        Self {
            norm: DWtNormParams { on: false, ..DWtNormParams::default() },
            momentum: MomentumParams { on: false, ..MomentumParams::default() },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.lrate < 0.0 {
            return Err(GateError::InvalidParam {
                name: "lrate",
                detail: format!("must be >= 0, got {}", self.lrate),
            });
        }
        if self.norm.decay_tau < 1.0 {
            return Err(GateError::InvalidParam {
                name: "decay_tau",
                detail: format!("must be >= 1, got {}", self.norm.decay_tau),
            });
        }
        if self.momentum.m_tau < 1.0 {
            return Err(GateError::InvalidParam {
                name: "m_tau",
                detail: format!("must be >= 1, got {}", self.momentum.m_tau),
            });
        }
        Ok(())
    }

    /// Apply pending weight changes: linear update clipped to [0, 1], then
    /// zero `dwt`.
    pub fn wt_from_dwt(&self, syns: &mut [Synapse]) {
        if !self.learn {
            return;
        }
        for sy in syns.iter_mut() {
            if sy.dwt != 0.0 {
                sy.wt = (sy.wt + sy.dwt).clamp(0.0, 1.0);
            }
            sy.dwt = 0.0;
        }
    }
}
