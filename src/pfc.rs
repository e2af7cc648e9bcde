//! PFC deep-layer gating and maintenance.
//!
//! A deep PFC layer pairs with a super layer of the same pool geometry. When a
//! stripe gates, the super layer's activity at that moment is snapshotted into
//! `maint` and held as a sustained excitatory drive (`maint_ge`) on the deep
//! units until the stripe is cleared, re-gated, or exceeds `max_maint`.
//!
//! Gating runs every cycle in the post-settle phase. Counter updates and
//! `deep_maint` run at the end of each gate quarter. Cross-layer effects
//! (clearing a paired maintenance stripe, decaying super activity) are
//! returned as [`GateEffect`]s and applied by the network, so each layer only
//! ever writes its own state.

use crate::error::{GateError, Result};
use crate::gate::{GatePhase, GateState, GateType};
use crate::layer::Layer;
use crate::maint_dyn::{MaintDynamics, PfcDyns};
use crate::neuron::NeuronArrays;
use crate::shape::Shape;
use crate::time::{Quarter, QuarterSet, SimTime};

/// When gating takes effect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PfcGateParams {
    /// Quarters at whose end deep is updated from super. Typically one quarter
    /// after the gate source's own gating quarter. Default: {Q2, Q4}
    pub gate_qtr: QuarterSet,
    /// Output gate: transient activation during gating only. Default: false
    pub out_gate: bool,
    /// For output gates, only gate in the first quarter(s) of the trial so the
    /// output can influence performance within the same trial. Default: true
    pub out_q1_only: bool,
}

impl Default for PfcGateParams {
    fn default() -> Self {
        Self {
            gate_qtr: QuarterSet::single(Quarter::Q2).with(Quarter::Q4),
            out_gate: false,
            out_q1_only: true,
        }
    }
}

/// How gated content is held.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PfcMaintParams {
    /// Shape `maint_ge` with the deterministic dynamics table. Set
    /// automatically when a non-empty table is attached.
    pub use_dyn: bool,
    /// Multiplier on the super activation snapshot. Default: 0.8
    pub maint_gain: f32,
    /// On output gating, clear the corresponding maintenance stripe.
    /// Theoretically this should be on, but off works better in practice.
    /// Default: false
    pub out_clear_maint: bool,
    /// Fraction of super activity decayed when a stripe gates or is cleared.
    /// Default: 0.0
    pub clear: f32,
    /// Maximum maintenance duration in gate quarters before auto-clear.
    /// Typically 1 for output gates and 100 for maintenance gates. Default: 100
    pub max_maint: i32,
}

impl Default for PfcMaintParams {
    fn default() -> Self {
        Self {
            use_dyn: false,
            maint_gain: 0.8,
            out_clear_maint: false,
            clear: 0.0,
            max_maint: 100,
        }
    }
}

impl PfcMaintParams {
    pub fn validate(&self) -> Result<()> {
        if self.maint_gain < 0.0 {
            return Err(GateError::InvalidParam {
                name: "maint_gain",
                detail: format!("must be >= 0, got {}", self.maint_gain),
            });
        }
        if !(0.0..=1.0).contains(&self.clear) {
            return Err(GateError::InvalidParam {
                name: "clear",
                detail: format!("must be within [0, 1], got {}", self.clear),
            });
        }
        if self.max_maint < 1 {
            return Err(GateError::InvalidParam {
                name: "max_maint",
                detail: format!("must be >= 1, got {}", self.max_maint),
            });
        }
        Ok(())
    }
}

/// Per-unit PFC values, as read back from [`PfcNeuronArrays`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PfcNeuron {
    /// Activation recorded when the unit's stripe last gated.
    pub act_g: f32,
    /// Maintained value: gained super activation at gating time.
    pub maint: f32,
    /// Maintenance excitatory conductance added to the unit's net input.
    pub maint_ge: f32,
}

/// SoA storage parallel to the layer's unit arrays.
#[derive(Clone, Debug, Default)]
pub struct PfcNeuronArrays {
    pub act_g: Vec<f32>,
    pub maint: Vec<f32>,
    pub maint_ge: Vec<f32>,
}

impl PfcNeuronArrays {
    pub fn new(n: usize) -> Self {
        Self {
            act_g: vec![0.0; n],
            maint: vec![0.0; n],
            maint_ge: vec![0.0; n],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.maint.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.maint.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize) -> PfcNeuron {
        PfcNeuron {
            act_g: self.act_g[i],
            maint: self.maint[i],
            maint_ge: self.maint_ge[i],
        }
    }

    pub fn init(&mut self) {
        self.act_g.fill(0.0);
        self.maint.fill(0.0);
        self.maint_ge.fill(0.0);
    }
}

/// Cross-layer consequence of a gating event, applied by the network.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GateEffect {
    /// Output gate fired: clear the paired maintenance layer's stripe.
    ClearMaint { pool: usize },
    /// Maintenance gate fired: decay this layer's super pool by `frac`.
    DecaySuper { pool: usize, frac: f32 },
}

/// Gating state of a deep PFC layer.
pub struct PfcDeepState {
    pub gate: PfcGateParams,
    pub maint: PfcMaintParams,
    pub dyns: Box<dyn MaintDynamics>,
    pub neurs: PfcNeuronArrays,
    pub gate_states: Vec<GateState>,
    /// Super layer name. Default: this layer's name without the trailing "D".
    pub super_name: Option<String>,
    /// Paired maintenance layer for output gates. Default: "...outD" -> "...mntD".
    pub maint_name: Option<String>,
    pub(crate) super_layer: Option<usize>,
    pub(crate) maint_layer: Option<usize>,
}

impl PfcDeepState {
    pub fn new(gate: PfcGateParams, maint: PfcMaintParams) -> Self {
        let mut st = Self {
            gate,
            maint,
            dyns: Box::new(PfcDyns::new()),
            neurs: PfcNeuronArrays::default(),
            gate_states: Vec::new(),
            super_name: None,
            maint_name: None,
            super_layer: None,
            maint_layer: None,
        };
        st.apply_defaults();
        st
    }

    /// Maintenance-gated layer with default parameters.
    pub fn maint_gate() -> Self {
        Self::new(PfcGateParams::default(), PfcMaintParams::default())
    }

    /// Output-gated layer: Q1-only gating with single-quarter maintenance.
    pub fn out_gate() -> Self {
        Self::new(
            PfcGateParams { out_gate: true, ..PfcGateParams::default() },
            PfcMaintParams::default(),
        )
    }

    /// Attach a dynamics table; enables `use_dyn` when it is non-empty.
    pub fn with_dyns<D: MaintDynamics + 'static>(mut self, dyns: D) -> Self {
        self.dyns = Box::new(dyns);
        self.apply_defaults();
        self
    }

    pub fn with_super(mut self, name: &str) -> Self {
        self.super_name = Some(name.to_string());
        self
    }

    pub fn with_maint(mut self, name: &str) -> Self {
        self.maint_name = Some(name.to_string());
        self
    }

    /// Output gates that only gate early get one quarter of maintenance in Q1.
    pub fn apply_defaults(&mut self) {
        if self.gate.out_gate && self.gate.out_q1_only {
            self.maint.max_maint = 1;
            self.gate.gate_qtr = QuarterSet::single(Quarter::Q1);
        }
        self.maint.use_dyn = !self.dyns.is_empty();
    }

    #[inline]
    pub fn gate_type(&self) -> GateType {
        if self.gate.out_gate {
            GateType::Out
        } else {
            GateType::Maint
        }
    }

    pub(crate) fn build(&mut self, n_units: usize, n_pools: usize) {
        self.neurs = PfcNeuronArrays::new(n_units);
        self.gate_states = vec![GateState::default(); n_pools];
    }

    pub fn init_acts(&mut self) {
        self.neurs.init();
        for gs in &mut self.gate_states {
            gs.init();
        }
    }

    /// Super layer name by convention: drop the trailing "D".
    pub fn super_layer_name(&self, own: &str) -> Option<String> {
        if let Some(n) = &self.super_name {
            return Some(n.clone());
        }
        own.strip_suffix('D').map(str::to_string)
    }

    /// Maintenance layer name by convention: "...outD" -> "...mntD".
    pub fn maint_layer_name(&self, own: &str) -> Option<String> {
        if let Some(n) = &self.maint_name {
            return Some(n.clone());
        }
        own.strip_suffix("outD").map(|base| format!("{base}mntD"))
    }

    /// Record an external gate decision for `pool`.
    pub fn set_gate(&mut self, pool: usize, now: bool, act: f32) -> Result<()> {
        let len = self.gate_states.len();
        let gs = self
            .gate_states
            .get_mut(pool)
            .ok_or(GateError::IndexOutOfRange { index: pool, len })?;
        gs.now = now;
        gs.act = act;
        Ok(())
    }

    /// Update gate counters for gate events this cycle.
    ///
    /// A go decision (`now && act > 0`) resets the stripe to just-gated. Any
    /// stripe at or beyond `max_maint` is then cleared; a go decision in the
    /// same cycle overrides expiry because it has already reset `cnt`.
    pub fn gating(&mut self, time: &SimTime) -> Vec<GateEffect> {
        let mut effects = Vec::new();
        if self.gate.out_gate && self.gate.out_q1_only && time.quarter.index() > 1 {
            return effects;
        }

        let gate_type = self.gate_type();
        for (gi, gs) in self.gate_states.iter_mut().enumerate() {
            if gs.is_gating() {
                gs.cnt = 0;
                match gate_type {
                    GateType::Out => {
                        if self.maint.out_clear_maint {
                            effects.push(GateEffect::ClearMaint { pool: gi });
                        }
                    }
                    GateType::Maint => {
                        if self.maint.clear > 0.0 {
                            effects.push(GateEffect::DecaySuper { pool: gi, frac: self.maint.clear });
                        }
                    }
                }
            }
            if gs.cnt >= self.maint.max_maint {
                gs.cnt = -1;
            }
        }
        effects
    }

    /// Clear an established maintenance stripe (`cnt >= 1`; a stripe that
    /// only just gated is left alone). Zeroes the stripe's maintained values
    /// immediately. Returns the super-decay fraction to apply when cleared.
    pub fn clear_maint_pool(&mut self, pool: usize, shape: &Shape) -> Option<f32> {
        let gs = self.gate_states.get_mut(pool)?;
        if gs.cnt < 1 {
            return None;
        }
        gs.cnt = -1;
        for ni in shape.pool_units(pool) {
            self.neurs.maint[ni] = 0.0;
            self.neurs.maint_ge[ni] = 0.0;
        }
        Some(self.maint.clear)
    }

    /// Advance gate counters at the end of a gate quarter. Active stripes
    /// count up; idle stripes count further down.
    pub fn update_gate_cnt(&mut self, time: &SimTime) {
        if !self.gate.gate_qtr.contains(time.quarter) {
            return;
        }
        for gs in &mut self.gate_states {
            if gs.cnt < 0 {
                gs.cnt = gs.cnt.saturating_sub(1);
            } else {
                gs.cnt = gs.cnt.saturating_add(1);
            }
        }
    }

    /// Recompute maintenance drive at the end of a gate quarter.
    ///
    /// Idle stripes are zeroed. Stripes in their first gated quarter
    /// (`cnt <= 1`) snapshot the super layer's settled activation. Every gate
    /// quarter `maint_ge` is refreshed from `maint`, shaped by the dynamics
    /// table when enabled. Deep rows map onto super rows by
    /// `uy % super_rows`; the row block `uy / super_rows` selects the
    /// dynamics type.
    pub fn deep_maint(
        &mut self,
        time: &SimTime,
        shape: &Shape,
        neurons: &NeuronArrays,
        sup: &Layer,
    ) {
        if !self.gate.gate_qtr.contains(time.quarter) {
            return;
        }
        let nn = shape.units_per_pool();
        let xn = shape.unit_x;
        let syn = sup.shape.unit_y;
        let sxn = sup.shape.unit_x;
        let snn = syn * sxn;

        for ni in 0..neurons.len() {
            if neurons.is_off(ni) {
                continue;
            }
            let ui = ni % nn;
            let pi = ni / nn;
            let uy = ui / xn;
            let ux = ui % xn;

            let cnt = self.gate_states[pi].cnt;
            if cnt < 0 {
                self.neurs.maint[ni] = 0.0;
                self.neurs.maint_ge[ni] = 0.0;
                continue;
            }
            if cnt <= 1 {
                let sy = uy % syn;
                let si = pi * snn + sy * sxn + ux;
                self.neurs.maint[ni] = self.maint.maint_gain * sup.neurons.act[si];
            }
            self.neurs.maint_ge[ni] = if self.maint.use_dyn {
                let dyn_type = uy / syn;
                self.neurs.maint[ni] * self.dyns.evaluate(dyn_type, (cnt - 1) as f32)
            } else {
                self.neurs.maint[ni]
            };
        }
    }

    /// Snapshot current activations of every stripe with a gate decision.
    pub fn rec_gate_act(&mut self, shape: &Shape, neurons: &NeuronArrays) {
        for (gi, gs) in self.gate_states.iter().enumerate() {
            if !gs.now {
                continue;
            }
            for ni in shape.pool_units(gi) {
                if neurons.is_off(ni) {
                    continue;
                }
                self.neurs.act_g[ni] = neurons.act[ni];
            }
        }
    }

    /// Gate decisions are one-shot: consumed at the end of each cycle.
    pub fn clear_now(&mut self) {
        for gs in &mut self.gate_states {
            gs.now = false;
        }
    }

    /// Whether an extra learning pass should run after Q2.
    pub fn do_quarter2_dwt(&self) -> bool {
        self.gate.gate_qtr.contains(Quarter::Q2)
    }

    pub fn phase(&self, pool: usize) -> Option<GatePhase> {
        self.gate_states.get(pool).map(|gs| gs.phase(self.maint.max_maint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerKind;

    fn time_at(q: Quarter) -> SimTime {
        let mut t = SimTime::default();
        t.quarter = q;
        t
    }

    fn built(mut st: PfcDeepState, shape: &Shape) -> PfcDeepState {
        st.build(shape.len(), shape.n_pools());
        st
    }

    #[test]
    fn out_gate_defaults() {
        let st = PfcDeepState::out_gate();
        assert_eq!(st.gate_type(), GateType::Out);
        assert_eq!(st.maint.max_maint, 1);
        assert_eq!(st.gate.gate_qtr, QuarterSet::single(Quarter::Q1));
        assert!(!st.maint.out_clear_maint, "clear-on-output stays off by default");

        let st = PfcDeepState::maint_gate();
        assert_eq!(st.gate_type(), GateType::Maint);
        assert_eq!(st.maint.max_maint, 100);
        assert!(st.gate.gate_qtr.contains(Quarter::Q2));
        assert!(st.gate.gate_qtr.contains(Quarter::Q4));
        assert!(st.do_quarter2_dwt());
    }

    #[test]
    fn dyns_enable_use_dyn() {
        let st = PfcDeepState::maint_gate();
        assert!(!st.maint.use_dyn);
        let st = st.with_dyns(PfcDyns::full_dyn(5.0));
        assert!(st.maint.use_dyn);
    }

    #[test]
    fn naming_conventions() {
        let st = PfcDeepState::out_gate();
        assert_eq!(st.super_layer_name("PFCoutD").as_deref(), Some("PFCout"));
        assert_eq!(st.maint_layer_name("PFCoutD").as_deref(), Some("PFCmntD"));
        assert_eq!(st.maint_layer_name("Other"), None);

        let st = PfcDeepState::maint_gate().with_super("Custom");
        assert_eq!(st.super_layer_name("PFCmntD").as_deref(), Some("Custom"));
    }

    #[test]
    fn go_resets_counter_and_no_go_does_not() {
        let shape = Shape::new(1, 2, 1, 1);
        let mut st = built(PfcDeepState::maint_gate(), &shape);
        st.set_gate(0, true, 1.0).unwrap();
        st.set_gate(1, true, 0.0).unwrap();
        let effects = st.gating(&time_at(Quarter::Q1));
        assert!(effects.is_empty(), "clear = 0 emits no super decay");
        assert_eq!(st.gate_states[0].cnt, 0);
        assert_eq!(st.gate_states[1].cnt, -1);
    }

    #[test]
    fn maint_gate_with_clear_decays_super() {
        let shape = Shape::new(1, 1, 1, 1);
        let mut st = PfcDeepState::maint_gate();
        st.maint.clear = 0.5;
        let mut st = built(st, &shape);
        st.set_gate(0, true, 1.0).unwrap();
        let effects = st.gating(&time_at(Quarter::Q1));
        assert_eq!(effects, vec![GateEffect::DecaySuper { pool: 0, frac: 0.5 }]);
    }

    #[test]
    fn out_gate_requests_maint_clear_only_when_enabled() {
        let shape = Shape::new(1, 1, 1, 1);
        let mut st = built(PfcDeepState::out_gate(), &shape);
        st.set_gate(0, true, 1.0).unwrap();
        assert!(st.gating(&time_at(Quarter::Q1)).is_empty());

        let mut st = PfcDeepState::out_gate();
        st.maint.out_clear_maint = true;
        let mut st = built(st, &shape);
        st.set_gate(0, true, 1.0).unwrap();
        assert_eq!(st.gating(&time_at(Quarter::Q1)), vec![GateEffect::ClearMaint { pool: 0 }]);
    }

    #[test]
    fn out_q1_only_skips_late_quarters() {
        let shape = Shape::new(1, 1, 1, 1);
        let mut st = built(PfcDeepState::out_gate(), &shape);
        st.set_gate(0, true, 1.0).unwrap();
        st.gating(&time_at(Quarter::Q3));
        assert_eq!(st.gate_states[0].cnt, -1);
        st.gating(&time_at(Quarter::Q2));
        assert_eq!(st.gate_states[0].cnt, 0);
    }

    #[test]
    fn counter_counts_both_ways_only_in_gate_quarters() {
        let shape = Shape::new(1, 2, 1, 1);
        let mut st = built(PfcDeepState::maint_gate(), &shape);
        st.gate_states[0].cnt = 0;
        st.update_gate_cnt(&time_at(Quarter::Q1));
        assert_eq!(st.gate_states[0].cnt, 0, "Q1 is not a gate quarter");
        st.update_gate_cnt(&time_at(Quarter::Q2));
        assert_eq!(st.gate_states[0].cnt, 1);
        assert_eq!(st.gate_states[1].cnt, -2);
        st.update_gate_cnt(&time_at(Quarter::Q4));
        assert_eq!(st.gate_states[0].cnt, 2);
        assert_eq!(st.gate_states[1].cnt, -3);
    }

    #[test]
    fn expired_stripe_clears_unless_regated() {
        let shape = Shape::new(1, 2, 1, 1);
        let mut st = PfcDeepState::maint_gate();
        st.maint.max_maint = 3;
        let mut st = built(st, &shape);
        st.gate_states[0].cnt = 3;
        st.gate_states[1].cnt = 3;
        st.set_gate(1, true, 1.0).unwrap();
        st.gating(&time_at(Quarter::Q3));
        assert_eq!(st.gate_states[0].cnt, -1);
        assert_eq!(st.gate_states[1].cnt, 0);
    }

    #[test]
    fn clear_maint_requires_established_maintenance() {
        let shape = Shape::new(1, 2, 1, 2);
        let mut st = built(PfcDeepState::maint_gate(), &shape);
        st.gate_states[0].cnt = 0;
        st.gate_states[1].cnt = 4;
        st.neurs.maint.fill(0.5);
        st.neurs.maint_ge.fill(0.5);

        assert_eq!(st.clear_maint_pool(0, &shape), None);
        assert_eq!(st.gate_states[0].cnt, 0);

        assert_eq!(st.clear_maint_pool(1, &shape), Some(0.0));
        assert_eq!(st.gate_states[1].cnt, -1);
        assert_eq!(&st.neurs.maint[2..4], &[0.0, 0.0]);
        assert_eq!(&st.neurs.maint_ge[2..4], &[0.0, 0.0]);
        assert_eq!(&st.neurs.maint[0..2], &[0.5, 0.5]);

        assert_eq!(st.clear_maint_pool(7, &shape), None);
    }

    #[test]
    fn deep_maint_snapshots_then_holds() {
        let shape = Shape::new(1, 1, 1, 2);
        let mut sup = Layer::new(0, "PFC", shape, LayerKind::Plain);
        sup.neurons.act = vec![0.5, 1.0];
        let deep_neurons = NeuronArrays::new(&shape);
        let mut st = built(PfcDeepState::maint_gate(), &shape);
        let q2 = time_at(Quarter::Q2);

        st.gate_states[0].cnt = 1;
        st.deep_maint(&q2, &shape, &deep_neurons, &sup);
        assert!((st.neurs.maint[0] - 0.4).abs() < 1e-6);
        assert!((st.neurs.maint_ge[1] - 0.8).abs() < 1e-6);

        // later activity changes do not leak into the held value
        sup.neurons.act = vec![0.0, 0.0];
        st.gate_states[0].cnt = 2;
        st.deep_maint(&q2, &shape, &deep_neurons, &sup);
        assert!((st.neurs.maint[0] - 0.4).abs() < 1e-6);

        st.gate_states[0].cnt = -2;
        st.deep_maint(&q2, &shape, &deep_neurons, &sup);
        assert_eq!(st.neurs.maint[0], 0.0);
        assert_eq!(st.neurs.maint_ge[1], 0.0);
    }

    #[test]
    fn deep_maint_applies_dynamics_per_row_block() {
        let sup_shape = Shape::new(1, 1, 1, 1);
        let deep_shape = Shape::new(1, 1, 2, 1);
        let mut sup = Layer::new(0, "PFC", sup_shape, LayerKind::Plain);
        sup.neurons.act = vec![1.0];
        let deep_neurons = NeuronArrays::new(&deep_shape);
        let dyns = PfcDyns(vec![
            crate::maint_dyn::PfcDyn::new(1.0, 0.0, 0.0, "flat"),
            crate::maint_dyn::PfcDyn::new(1.0, 0.0, 4.0, "decay"),
        ]);
        let mut st = built(PfcDeepState::maint_gate().with_dyns(dyns), &deep_shape);
        st.maint.maint_gain = 1.0;
        let q2 = time_at(Quarter::Q2);

        st.gate_states[0].cnt = 1;
        st.deep_maint(&q2, &deep_shape, &deep_neurons, &sup);
        assert!((st.neurs.maint_ge[0] - 1.0).abs() < 1e-6);
        assert!((st.neurs.maint_ge[1] - 1.0).abs() < 1e-6, "t = 0 evaluates to init");

        st.gate_states[0].cnt = 3;
        st.deep_maint(&q2, &deep_shape, &deep_neurons, &sup);
        assert!((st.neurs.maint_ge[0] - 1.0).abs() < 1e-6);
        assert!((st.neurs.maint_ge[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn deep_maint_idle_at_counter_floor() {
        let shape = Shape::new(1, 1, 2, 1);
        let sup_shape = Shape::new(1, 1, 1, 1);
        let mut sup = Layer::new(0, "PFC", sup_shape, LayerKind::Plain);
        sup.neurons.act = vec![1.0];
        let deep_neurons = NeuronArrays::new(&shape);
        let dyns = PfcDyns(vec![
            crate::maint_dyn::PfcDyn::new(1.0, 0.0, 0.0, "flat"),
            crate::maint_dyn::PfcDyn::new(1.0, 0.0, 4.0, "decay"),
        ]);
        let mut st = built(PfcDeepState::maint_gate().with_dyns(dyns), &shape);
        st.neurs.maint = vec![0.7, 0.7];
        st.neurs.maint_ge = vec![0.7, 0.7];

        st.gate_states[0].cnt = i32::MIN;
        st.deep_maint(&time_at(Quarter::Q4), &shape, &deep_neurons, &sup);
        assert_eq!(st.neurs.maint, vec![0.0, 0.0]);
        assert_eq!(st.neurs.maint_ge, vec![0.0, 0.0]);
    }

    #[test]
    fn rec_gate_act_snapshots_gating_pools() {
        let shape = Shape::new(1, 2, 1, 1);
        let mut neurons = NeuronArrays::new(&shape);
        neurons.act = vec![0.3, 0.9];
        let mut st = built(PfcDeepState::maint_gate(), &shape);
        st.set_gate(1, true, 0.0).unwrap();
        st.rec_gate_act(&shape, &neurons);
        assert_eq!(st.neurs.act_g[0], 0.0);
        assert!((st.neurs.act_g[1] - 0.9).abs() < 1e-6);

        st.clear_now();
        assert!(st.gate_states.iter().all(|g| !g.now));
    }

    #[test]
    fn maint_params_validation() {
        assert!(PfcMaintParams::default().validate().is_ok());
        let bad = PfcMaintParams { clear: 1.5, ..PfcMaintParams::default() };
        assert!(matches!(bad.validate(), Err(GateError::InvalidParam { name: "clear", .. })));
        let bad = PfcMaintParams { max_maint: 0, ..PfcMaintParams::default() };
        assert!(bad.validate().is_err());
    }
}
