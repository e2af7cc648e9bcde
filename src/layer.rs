//! Layers: unit arrays plus the role-specific state that drives gating and
//! learning.
//!
//! Every layer owns its arrays exclusively. Role-specific behavior is a closed
//! set of variants in [`LayerKind`]; the network dispatches on it in the
//! post-settle phase.

use crate::dynamics::{ActDynamics, ClampedDynamics, RateCodeDynamics};
use crate::error::{GateError, Result};
use crate::matrix::MatrixState;
use crate::neuron::NeuronArrays;
use crate::pfc::PfcDeepState;
use crate::pv::PvState;
use crate::shape::Shape;
use crate::time::SimTime;

/// Index of a layer in its network, assigned in insertion order.
pub type LayerId = usize;

/// Role of a layer.
pub enum LayerKind {
    /// Generic layer with no gating or neuromodulatory role.
    Plain,
    /// Primary-value source broadcasting into receivers' `pv_act`.
    Pv(PvState),
    /// Deep PFC layer with per-stripe gating and maintenance.
    PfcDeep(PfcDeepState),
    /// Striatal matrix layer deriving learning dopamine.
    Matrix(MatrixState),
}

impl LayerKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Pv(_) => "pv",
            Self::PfcDeep(_) => "pfc_deep",
            Self::Matrix(_) => "matrix",
        }
    }
}

pub struct Layer {
    pub name: String,
    pub id: LayerId,
    pub shape: Shape,
    pub neurons: NeuronArrays,
    pub kind: LayerKind,
    /// Cycle within the trial from which `alpha_max` starts integrating.
    /// Default: 30
    pub alpha_max_cyc: u32,
    /// Set when a PV layer broadcasts into this layer.
    pub is_pv_receiver: bool,
    pub dynamics: Box<dyn ActDynamics>,
}

impl Layer {
    /// PV layers are clamped to their external input; every other kind
    /// relaxes toward its net input.
    pub fn new(id: LayerId, name: &str, shape: Shape, kind: LayerKind) -> Self {
        let dynamics: Box<dyn ActDynamics> = match kind {
            LayerKind::Pv(_) => Box::new(ClampedDynamics),
            _ => Box::new(RateCodeDynamics::default()),
        };
        Self {
            name: name.to_string(),
            id,
            shape,
            neurons: NeuronArrays::new(&shape),
            kind,
            alpha_max_cyc: 30,
            is_pv_receiver: false,
            dynamics,
        }
    }

    pub fn with_dynamics<D: ActDynamics + 'static>(mut self, dynamics: D) -> Self {
        self.dynamics = Box::new(dynamics);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    #[inline]
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Phase 1 of a cycle: settle activations, then integrate alpha-max.
    /// Deep PFC layers receive their maintenance conductance as extra drive.
    pub fn settle(&mut self, time: &SimTime) {
        let extra = match &self.kind {
            LayerKind::PfcDeep(pfc) => Some(pfc.neurs.maint_ge.as_slice()),
            _ => None,
        };
        self.dynamics.settle(&mut self.neurons, extra, time);

        if time.cycle < self.alpha_max_cyc {
            return;
        }
        // matrix layers sign act_lrn from the thalamic gate instead
        let set_act_lrn = !matches!(self.kind, LayerKind::Matrix(_));
        let nr = &mut self.neurons;
        for i in 0..nr.len() {
            if nr.is_off(i) {
                continue;
            }
            nr.alpha_max[i] = nr.alpha_max[i].max(nr.act[i]);
            if set_act_lrn {
                nr.act_lrn[i] = nr.alpha_max[i];
            }
        }
    }

    /// Reset per-trial integration at the start of an alpha cycle.
    pub fn alpha_cyc_init(&mut self) {
        self.neurons.alpha_max.fill(0.0);
    }

    /// Return all activation state, including role-specific state, to rest.
    pub fn init_acts(&mut self) {
        self.neurons.init_acts();
        match &mut self.kind {
            LayerKind::PfcDeep(pfc) => pfc.init_acts(),
            LayerKind::Matrix(mtx) => mtx.init_acts(),
            LayerKind::Plain | LayerKind::Pv(_) => {}
        }
    }

    /// Decay activation of pool `pool` toward rest by `frac`.
    pub fn decay_pool(&mut self, pool: usize, frac: f32) {
        if pool >= self.shape.n_pools() {
            return;
        }
        self.neurons.decay_range(self.shape.pool_units(pool), frac);
    }

    /// Peak alpha-max over the units of `pool`.
    pub fn pool_alpha_max(&self, pool: usize) -> Option<f32> {
        if pool >= self.shape.n_pools() {
            return None;
        }
        let r = self.shape.pool_units(pool);
        Some(self.neurons.alpha_max[r].iter().fold(0.0f32, |m, &v| m.max(v)))
    }

    pub fn pool_act_avg(&self, pool: usize) -> f32 {
        let r = self.shape.pool_units(pool);
        let n = r.len();
        if n == 0 {
            return 0.0;
        }
        self.neurons.act[r].iter().sum::<f32>() / n as f32
    }

    pub fn pool_act_max(&self, pool: usize) -> f32 {
        let r = self.shape.pool_units(pool);
        self.neurons.act[r].iter().fold(0.0f32, |m, &v| m.max(v))
    }

    /// Clamp external input. `ext.len()` must equal the unit count.
    pub fn apply_ext(&mut self, ext: &[f32]) -> Result<()> {
        if ext.len() != self.len() {
            return Err(GateError::ShapeMismatch {
                a: self.name.clone(),
                b: "external input".to_string(),
                detail: format!("{} units vs {} values", self.len(), ext.len()),
            });
        }
        self.neurons.ext.copy_from_slice(ext);
        Ok(())
    }

    /// Overwrite activations directly, e.g. from an external simulator.
    pub fn set_act(&mut self, act: &[f32]) -> Result<()> {
        if act.len() != self.len() {
            return Err(GateError::ShapeMismatch {
                a: self.name.clone(),
                b: "activations".to_string(),
                detail: format!("{} units vs {} values", self.len(), act.len()),
            });
        }
        self.neurons.act.copy_from_slice(act);
        Ok(())
    }

    pub fn as_pfc(&self) -> Option<&PfcDeepState> {
        match &self.kind {
            LayerKind::PfcDeep(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_pfc_mut(&mut self) -> Option<&mut PfcDeepState> {
        match &mut self.kind {
            LayerKind::PfcDeep(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&MatrixState> {
        match &self.kind {
            LayerKind::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_matrix_mut(&mut self) -> Option<&mut MatrixState> {
        match &mut self.kind {
            LayerKind::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_pv(&self) -> Option<&PvState> {
        match &self.kind {
            LayerKind::Pv(p) => Some(p),
            _ => None,
        }
    }

    pub(crate) fn expect_kind(&self, expected: &'static str) -> GateError {
        GateError::LayerKindMismatch {
            layer: self.name.clone(),
            expected,
            found: self.kind_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::ExternalDynamics;
    use crate::matrix::DaReceptor;

    fn time_at_cycle(c: u32) -> SimTime {
        let mut t = SimTime::default();
        t.cycle = c;
        t
    }

    #[test]
    fn alpha_max_waits_for_window() {
        let mut ly = Layer::new(0, "Hidden", Shape::flat(1, 2), LayerKind::Plain)
            .with_dynamics(ExternalDynamics);
        ly.neurons.act = vec![0.6, 0.2];
        ly.settle(&time_at_cycle(5));
        assert_eq!(ly.neurons.alpha_max, vec![0.0, 0.0]);

        ly.settle(&time_at_cycle(30));
        assert!((ly.neurons.alpha_max[0] - 0.6).abs() < 1e-6);
        assert!((ly.neurons.act_lrn[0] - 0.6).abs() < 1e-6);

        ly.neurons.act = vec![0.1, 0.9];
        ly.settle(&time_at_cycle(31));
        assert!((ly.neurons.alpha_max[0] - 0.6).abs() < 1e-6, "alpha-max keeps the peak");
        assert!((ly.neurons.alpha_max[1] - 0.9).abs() < 1e-6);

        ly.alpha_cyc_init();
        assert_eq!(ly.neurons.alpha_max, vec![0.0, 0.0]);
    }

    #[test]
    fn matrix_layer_leaves_act_lrn_alone() {
        let mut ly = Layer::new(0, "MtxGo", Shape::flat(1, 1), LayerKind::Matrix(MatrixState::new(DaReceptor::D1)))
            .with_dynamics(ExternalDynamics);
        ly.neurons.act[0] = 0.7;
        ly.settle(&time_at_cycle(40));
        assert!((ly.neurons.alpha_max[0] - 0.7).abs() < 1e-6);
        assert_eq!(ly.neurons.act_lrn[0], 0.0);
    }

    #[test]
    fn deep_layer_gets_maintenance_drive() {
        let shape = Shape::flat(1, 1);
        let mut pfc = PfcDeepState::maint_gate();
        pfc.build(shape.len(), shape.n_pools());
        pfc.neurs.maint_ge[0] = 0.5;
        let mut ly = Layer::new(0, "PFCmntD", shape, LayerKind::PfcDeep(pfc))
            .with_dynamics(RateCodeDynamics { dt: 1.0, gain: 1.0 });
        ly.settle(&SimTime::default());
        assert!((ly.neurons.act[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn pool_helpers() {
        let mut ly = Layer::new(0, "L", Shape::new(1, 2, 1, 2), LayerKind::Plain);
        ly.neurons.act = vec![0.2, 0.4, 1.0, 0.0];
        ly.neurons.alpha_max = vec![0.1, 0.3, 0.0, 0.8];
        assert!((ly.pool_act_avg(0) - 0.3).abs() < 1e-6);
        assert!((ly.pool_act_max(1) - 1.0).abs() < 1e-6);
        assert_eq!(ly.pool_alpha_max(1), Some(0.8));
        assert_eq!(ly.pool_alpha_max(2), None);

        ly.decay_pool(1, 0.5);
        assert!((ly.neurons.act[2] - 0.5).abs() < 1e-6);
        assert!((ly.neurons.act[0] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn ext_and_act_length_checked() {
        let mut ly = Layer::new(0, "In", Shape::flat(1, 2), LayerKind::Plain);
        assert!(ly.apply_ext(&[1.0]).is_err());
        ly.apply_ext(&[1.0, 0.0]).unwrap();
        assert_eq!(ly.neurons.ext, vec![1.0, 0.0]);
        assert!(ly.set_act(&[0.1, 0.2, 0.3]).is_err());
        ly.init_acts();
        assert_eq!(ly.neurons.ext, vec![0.0, 0.0]);
    }

    #[test]
    fn pv_layers_are_clamped() {
        let pv = PvState::new(crate::pv::PvParams::default());
        let mut ly = Layer::new(0, "PosPV", Shape::flat(1, 1), LayerKind::Pv(pv));
        ly.apply_ext(&[0.8]).unwrap();
        ly.settle(&SimTime::default());
        assert!((ly.neurons.act[0] - 0.8).abs() < 1e-6);
        assert_eq!(ly.kind_name(), "pv");
    }
}
