//! Primary-value (PV) broadcast.
//!
//! A PV layer copies its effective activation (`max(act, ext)`) straight into
//! the `pv_act` field of each registered receiver layer during its send
//! quarter, bypassing weighted projections. Receivers must share the PV
//! layer's unit layout; this is checked at build.

use crate::error::{GateError, Result};
use crate::layer::Layer;
use crate::neuron::NeuronArrays;
use crate::time::{Quarter, SimTime};

#[derive(Clone, Debug, PartialEq)]
pub struct PvParams {
    /// Quarter during which activation is sent every cycle. Default: Q4
    pub send_quarter: Quarter,
    /// Receiver layer names.
    pub receivers: Vec<String>,
}

impl Default for PvParams {
    fn default() -> Self {
        Self { send_quarter: Quarter::Q4, receivers: Vec::new() }
    }
}

pub struct PvState {
    pub params: PvParams,
    pub(crate) receivers: Vec<usize>,
}

impl PvState {
    pub fn new(params: PvParams) -> Self {
        Self { params, receivers: Vec::new() }
    }

    pub fn add_receiver(&mut self, name: &str) {
        if !self.params.receivers.iter().any(|r| r == name) {
            self.params.receivers.push(name.to_string());
        }
    }

    #[inline]
    pub fn sends_at(&self, time: &SimTime) -> bool {
        time.quarter == self.params.send_quarter
    }

    /// Resolved receiver layer indices.
    pub fn resolved_receivers(&self) -> &[usize] {
        &self.receivers
    }
}

/// Copy `max(act, ext)` of every source unit into the receiver's `pv_act`.
pub fn send_pv_act(src: &NeuronArrays, recv: &mut NeuronArrays) {
    debug_assert_eq!(src.len(), recv.len(), "PV receiver must match the PV layer's shape");
    for ((pv, &act), &ext) in recv.pv_act.iter_mut().zip(&src.act).zip(&src.ext) {
        *pv = act.max(ext);
    }
}

/// Scalar readouts of a PV layer for monitoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PvMonitor {
    /// Sum of activation over the layer.
    TotalAct,
    /// Activation of one unit.
    Act(usize),
    /// Pool mean activation times pool size.
    PoolActAvg(usize),
    /// Pool peak activation times pool size.
    PoolActMax(usize),
}

impl PvMonitor {
    pub fn eval(self, ly: &Layer) -> Result<f32> {
        let act = &ly.neurons.act;
        let n_pools = ly.shape.n_pools();
        let nn = ly.shape.units_per_pool() as f32;
        match self {
            Self::TotalAct => Ok(act.iter().sum()),
            Self::Act(i) => act
                .get(i)
                .copied()
                .ok_or(GateError::IndexOutOfRange { index: i, len: act.len() }),
            Self::PoolActAvg(p) if p < n_pools => Ok(ly.pool_act_avg(p) * nn),
            Self::PoolActMax(p) if p < n_pools => Ok(ly.pool_act_max(p) * nn),
            Self::PoolActAvg(p) | Self::PoolActMax(p) => {
                Err(GateError::IndexOutOfRange { index: p, len: n_pools })
            }
        }
    }
}
