//! Matrix (striatal) learning layer: dopamine and acetylcholine derivation.
//!
//! Every cycle the raw `da` is turned into the effective learning dopamine
//! `da_lrn` (burst/dip gain, then receptor polarity). Once the alpha-max
//! integration window has elapsed, each unit's learning activation is signed
//! by whether its stripe's thalamic gate fired: positive when it did,
//! negative when it did not.

use crate::error::{GateError, Result};
use crate::neuron::NeuronArrays;
use crate::time::SimTime;

/// Dominant dopamine receptor type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DaReceptor {
    /// Go pathway: learns in the direction of dopamine.
    #[default]
    D1,
    /// NoGo pathway: dopamine sign is inverted.
    D2,
}

impl DaReceptor {
    #[inline]
    pub fn polarity(self) -> f32 {
        match self {
            Self::D1 => 1.0,
            Self::D2 => -1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatrixParams {
    /// Name of the thalamic layer that gates this matrix layer. Default: "VThal"
    pub thal_layer: String,
    /// Threshold on the thalamic pool's peak activation for counting as
    /// gated. Default: 0.25
    pub thal_thr: f32,
    /// Use the activation derivative `2 a (1 - a)` as the learning factor.
    /// Default: true
    pub deriv: bool,
    /// Gain on positive dopamine bursts. Default: 1.0
    pub burst_gain: f32,
    /// Gain on negative dopamine dips. Default: 1.0
    pub dip_gain: f32,
}

impl Default for MatrixParams {
    fn default() -> Self {
        Self {
            thal_layer: "VThal".to_string(),
            thal_thr: 0.25,
            deriv: true,
            burst_gain: 1.0,
            dip_gain: 1.0,
        }
    }
}

impl MatrixParams {
    /// Learning factor applied to alpha-max activation.
    #[inline]
    pub fn lrn_factor(&self, act: f32) -> f32 {
        if self.deriv {
            2.0 * act * (1.0 - act)
        } else {
            act
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.burst_gain < 0.0 || self.dip_gain < 0.0 {
            return Err(GateError::InvalidParam {
                name: "burst_gain/dip_gain",
                detail: format!("gains must be >= 0, got {} / {}", self.burst_gain, self.dip_gain),
            });
        }
        Ok(())
    }
}

/// Neuromodulator state of a matrix layer.
pub struct MatrixState {
    pub receptor: DaReceptor,
    pub params: MatrixParams,
    /// Raw dopamine, set externally.
    pub da: f32,
    /// Effective learning dopamine, derived every cycle.
    pub da_lrn: f32,
    /// Acetylcholine level, set externally; drives trace decay.
    pub ach: f32,
    pub(crate) thal: Option<usize>,
}

impl MatrixState {
    pub fn new(receptor: DaReceptor) -> Self {
        Self::with_params(receptor, MatrixParams::default())
    }

    pub fn with_params(receptor: DaReceptor, params: MatrixParams) -> Self {
        Self { receptor, params, da: 0.0, da_lrn: 0.0, ach: 0.0, thal: None }
    }

    pub fn init_acts(&mut self) {
        self.da = 0.0;
        self.da_lrn = 0.0;
        self.ach = 0.0;
    }

    /// `da_lrn` from `da`: burst or dip gain, then receptor polarity.
    #[inline]
    pub fn da_lrn_from_da(&mut self) {
        let gain = if self.da > 0.0 { self.params.burst_gain } else { self.params.dip_gain };
        self.da_lrn = self.da * gain * self.receptor.polarity();
    }

    /// Sign the learning activation of each unit by whether its stripe's
    /// thalamic gate fired. Skipped before `alpha_max_cyc`.
    ///
    /// `thal_pool_max(p)` returns the thalamic layer's peak alpha-max for pool
    /// `p`, or `None` when the pool does not exist.
    pub fn act_lrn_from_thal<F>(
        &self,
        time: &SimTime,
        alpha_max_cyc: u32,
        neurons: &mut NeuronArrays,
        thal_pool_max: F,
    ) where
        F: Fn(usize) -> Option<f32>,
    {
        if time.cycle < alpha_max_cyc {
            return;
        }
        for ni in 0..neurons.len() {
            if neurons.is_off(ni) {
                continue;
            }
            let amax = self.params.lrn_factor(neurons.alpha_max[ni]);
            let tact = thal_pool_max(neurons.sub_pool[ni] as usize).unwrap_or(0.0);
            neurons.act_lrn[ni] = if tact > self.params.thal_thr { amax } else { -amax };
        }
    }
}
