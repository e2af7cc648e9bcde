//! Activation dynamics: the pluggable unit-update rule.
//!
//! Membrane integration and rate coding live outside this crate. `ActDynamics`
//! is the seam: the network hands each layer's arrays to its dynamics once per
//! cycle (the settle phase), together with any extra excitatory drive the layer
//! contributes (deep PFC maintenance conductance). Two simple rules are
//! provided so networks run out of the box.

use crate::neuron::NeuronArrays;
use crate::time::SimTime;

/// Per-cycle unit update.
///
/// Implementations must only write `act` and `ge`; all other arrays belong to
/// the gating and learning passes.
pub trait ActDynamics: Send + Sync {
    /// Settle activations for one cycle.
    ///
    /// `extra_ge`: additional excitatory drive per unit (same length as the
    /// arrays) or `None`.
    fn settle(&self, neurons: &mut NeuronArrays, extra_ge: Option<&[f32]>, time: &SimTime);
}

/// First-order relaxation of activation toward clipped net input.
///
/// `ge = ge_raw + extra`, `act += dt * (clamp(gain * ge, 0, 1) - act)`.
#[derive(Clone, Copy, Debug)]
pub struct RateCodeDynamics {
    /// Integration rate per cycle. Default: 0.3
    pub dt: f32,
    /// Gain on net input. Default: 1.0
    pub gain: f32,
}

impl Default for RateCodeDynamics {
    fn default() -> Self {
        Self { dt: 0.3, gain: 1.0 }
    }
}

impl ActDynamics for RateCodeDynamics {
    fn settle(&self, neurons: &mut NeuronArrays, extra_ge: Option<&[f32]>, _time: &SimTime) {
        for i in 0..neurons.len() {
            if neurons.is_off(i) {
                continue;
            }
            let extra = extra_ge.map_or(0.0, |e| e[i]);
            let ge = neurons.ge_raw[i] + extra;
            neurons.ge[i] = ge;
            let drive = (self.gain * ge).clamp(0.0, 1.0);
            neurons.act[i] += self.dt * (drive - neurons.act[i]);
        }
    }
}

/// Hard clamp: activation follows `ext` exactly. For input, PV and gate-source
/// layers whose activity is dictated by the environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClampedDynamics;

impl ActDynamics for ClampedDynamics {
    #[inline]
    fn settle(&self, neurons: &mut NeuronArrays, extra_ge: Option<&[f32]>, _time: &SimTime) {
        for i in 0..neurons.len() {
            if neurons.is_off(i) {
                continue;
            }
            neurons.ge[i] = neurons.ge_raw[i] + extra_ge.map_or(0.0, |e| e[i]);
            neurons.act[i] = neurons.ext[i];
        }
    }
}

/// Leaves activations untouched. The host writes `act` directly between
/// cycles (e.g. from an external simulator).
#[derive(Clone, Copy, Debug, Default)]
pub struct ExternalDynamics;

impl ActDynamics for ExternalDynamics {
    #[inline]
    fn settle(&self, _neurons: &mut NeuronArrays, _extra_ge: Option<&[f32]>, _time: &SimTime) {}
}
