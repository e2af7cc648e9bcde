//! Network: the layer registry and the cycle / quarter / trial loop.
//!
//! Each cycle runs in two phases separated by a barrier:
//!
//! 1. every layer integrates net input from its projections and settles its
//!    activation;
//! 2. post-settle updates run in dependency order over the settled state:
//!    PV broadcast, matrix dopamine and learning activation, PFC gating
//!    (with its cross-layer effects), gate-activation snapshots, and finally
//!    the one-shot gate decisions are consumed.
//!
//! Paired layers (deep → super, output → maintenance, matrix → thalamus,
//! PV → receivers) are resolved by name once in [`Network::build`]. A missing
//! pair is logged and the dependent step is skipped; a structurally mismatched
//! pair fails the build.

use std::collections::HashMap;

use crate::error::{GateError, Result};
use crate::gate::GateType;
use crate::layer::{Layer, LayerId, LayerKind};
use crate::pfc::{GateEffect, PfcDeepState};
use crate::prjn::{Pattern, PrjnId, PrjnKind, Projection};
use crate::pv::{send_pv_act, PvMonitor};
use crate::shape::Shape;
use crate::time::{Quarter, SimTime};

/// Mutable access to layer `w` alongside shared access to a different layer
/// `r`. Returns `None` for the reader when `r` is absent or equals `w`.
fn split_pair(layers: &mut [Layer], w: usize, r: Option<usize>) -> (&mut Layer, Option<&Layer>) {
    match r {
        Some(r) if r != w => {
            if w < r {
                let (lo, hi) = layers.split_at_mut(r);
                (&mut lo[w], Some(&hi[0]))
            } else {
                let (lo, hi) = layers.split_at_mut(w);
                (&mut hi[0], Some(&lo[r]))
            }
        }
        _ => (&mut layers[w], None),
    }
}

/// Check that a deep layer lines up with its super layer: same pools, same
/// unit columns, and one block of super rows per dynamics type.
fn validate_super(deep: &Layer, sup: &Layer, use_dyn: bool, n_dyns: usize) -> Result<()> {
    if deep.shape.n_pools() != sup.shape.n_pools() {
        return Err(GateError::PoolCountMismatch {
            a: deep.name.clone(),
            a_pools: deep.shape.n_pools(),
            b: sup.name.clone(),
            b_pools: sup.shape.n_pools(),
        });
    }
    if deep.shape.unit_x != sup.shape.unit_x {
        return Err(GateError::ShapeMismatch {
            a: deep.name.clone(),
            b: sup.name.clone(),
            detail: format!("unit columns differ, {} vs {}", deep.shape.unit_x, sup.shape.unit_x),
        });
    }
    let expected = if use_dyn { n_dyns } else { 1 };
    let (deep_rows, super_rows) = (deep.shape.unit_y, sup.shape.unit_y);
    if deep_rows != super_rows * expected {
        return Err(GateError::DynRowMismatch {
            layer: deep.name.clone(),
            super_layer: sup.name.clone(),
            deep_rows,
            super_rows,
            expected,
        });
    }
    Ok(())
}

pub struct Network {
    pub name: String,
    pub layers: Vec<Layer>,
    pub prjns: Vec<Projection>,
    index: HashMap<String, LayerId>,
    built: bool,
}

impl Network {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            layers: Vec::new(),
            prjns: Vec::new(),
            index: HashMap::new(),
            built: false,
        }
    }

    pub fn add_layer(&mut self, name: &str, shape: Shape, kind: LayerKind) -> Result<LayerId> {
        if self.index.contains_key(name) {
            return Err(GateError::DuplicateLayer(name.to_string()));
        }
        let id = self.layers.len();
        self.layers.push(Layer::new(id, name, shape, kind));
        self.index.insert(name.to_string(), id);
        self.built = false;
        Ok(id)
    }

    /// Connect `send` to `recv`. Self-projections are rejected.
    pub fn connect(&mut self, send: &str, recv: &str, pattern: Pattern, kind: PrjnKind) -> Result<PrjnId> {
        let s = self.layer_id(send)?;
        let r = self.layer_id(recv)?;
        if s == r {
            return Err(GateError::InvalidParam {
                name: "projection",
                detail: format!("layer '{send}' cannot project to itself"),
            });
        }
        let id = self.prjns.len();
        self.prjns.push(Projection::new(id, s, r, pattern, kind));
        self.built = false;
        Ok(id)
    }

    /// Register `recv` as a receiver of PV layer `pv`.
    pub fn add_pv_receiver(&mut self, pv: &str, recv: &str) -> Result<()> {
        let pi = self.layer_id(pv)?;
        let ly = &mut self.layers[pi];
        match &mut ly.kind {
            LayerKind::Pv(state) => state.add_receiver(recv),
            _ => return Err(ly.expect_kind("pv")),
        }
        self.built = false;
        Ok(())
    }

    pub fn layer_id(&self, name: &str) -> Result<LayerId> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GateError::UnknownLayer(name.to_string()))
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.index.get(name).map(|&i| &self.layers[i])
    }

    pub fn layer_by_name_mut(&mut self, name: &str) -> Option<&mut Layer> {
        let i = *self.index.get(name)?;
        Some(&mut self.layers[i])
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.get_mut(id)
    }

    pub fn prjn(&self, id: PrjnId) -> Option<&Projection> {
        self.prjns.get(id)
    }

    pub fn prjn_mut(&mut self, id: PrjnId) -> Option<&mut Projection> {
        self.prjns.get_mut(id)
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.built
    }

    fn ensure_built(&self) -> Result<()> {
        if self.built {
            Ok(())
        } else {
            Err(GateError::NotBuilt(self.name.clone()))
        }
    }

    /// Resolve a paired layer by name, logging a miss.
    fn resolve(&self, owner: &str, role: &str, name: &str) -> Option<LayerId> {
        let found = self.index.get(name).copied();
        if found.is_none() {
            log::warn!(
                "[BUILD] {}: {} layer '{}' not found; dependent step will be skipped",
                owner, role, name
            );
        }
        found
    }

    /// Allocate per-layer and per-projection state, resolve paired layers and
    /// validate their structure.
    pub fn build(&mut self) -> Result<()> {
        self.build_pfc()?;
        self.build_matrix()?;
        self.build_pv()?;
        self.build_prjns()?;
        self.built = true;

        let n_syn: usize = self.prjns.iter().map(|p| p.store.total_synapses()).sum();
        log::debug!(
            "[BUILD] {}: {} layers, {} projections, {} synapses",
            self.name, self.layers.len(), self.prjns.len(), n_syn
        );
        Ok(())
    }

    fn build_pfc(&mut self) -> Result<()> {
        for li in 0..self.layers.len() {
            let ly = &self.layers[li];
            let LayerKind::PfcDeep(pfc) = &ly.kind else {
                continue;
            };
            pfc.maint.validate()?;

            let super_idx = match pfc.super_layer_name(&ly.name) {
                Some(nm) => self.resolve(&ly.name, "super", &nm).filter(|&si| si != li),
                None => {
                    log::warn!("[BUILD] {}: no super layer name; maintenance disabled", ly.name);
                    None
                }
            };
            if let Some(si) = super_idx {
                validate_super(ly, &self.layers[si], pfc.maint.use_dyn, pfc.dyns.len())?;
            }

            let maint_idx = if pfc.gate_type() == GateType::Out {
                match pfc.maint_layer_name(&ly.name) {
                    Some(nm) => self.resolve(&ly.name, "maintenance", &nm).filter(|&mi| mi != li),
                    None => None,
                }
            } else {
                None
            };
            if let Some(mi) = maint_idx {
                let mly = &self.layers[mi];
                if mly.as_pfc().map(PfcDeepState::gate_type) != Some(GateType::Maint) {
                    return Err(mly.expect_kind("maint-gate pfc_deep"));
                }
                if mly.shape.n_pools() != ly.shape.n_pools() {
                    return Err(GateError::PoolCountMismatch {
                        a: ly.name.clone(),
                        a_pools: ly.shape.n_pools(),
                        b: mly.name.clone(),
                        b_pools: mly.shape.n_pools(),
                    });
                }
            }

            log::debug!(
                "[BUILD] {}: {} gate, super={:?}, maint={:?}",
                ly.name, pfc.gate_type().name(), super_idx, maint_idx
            );
            let shape = ly.shape;
            if let Some(pfc) = self.layers[li].as_pfc_mut() {
                pfc.build(shape.len(), shape.n_pools());
                pfc.super_layer = super_idx;
                pfc.maint_layer = maint_idx;
            }
        }
        Ok(())
    }

    fn build_matrix(&mut self) -> Result<()> {
        for li in 0..self.layers.len() {
            let ly = &self.layers[li];
            let LayerKind::Matrix(mtx) = &ly.kind else {
                continue;
            };
            mtx.params.validate()?;
            let thal = self
                .resolve(&ly.name, "thalamic", &mtx.params.thal_layer)
                .filter(|&ti| ti != li);
            if let Some(ti) = thal {
                let tly = &self.layers[ti];
                if tly.shape.n_pools() != ly.shape.n_pools() {
                    return Err(GateError::PoolCountMismatch {
                        a: ly.name.clone(),
                        a_pools: ly.shape.n_pools(),
                        b: tly.name.clone(),
                        b_pools: tly.shape.n_pools(),
                    });
                }
            }
            if let Some(mtx) = self.layers[li].as_matrix_mut() {
                mtx.thal = thal;
            }
        }
        Ok(())
    }

    fn build_pv(&mut self) -> Result<()> {
        for li in 0..self.layers.len() {
            let ly = &self.layers[li];
            let LayerKind::Pv(pv) = &ly.kind else {
                continue;
            };
            let mut resolved = Vec::with_capacity(pv.params.receivers.len());
            for nm in &pv.params.receivers {
                let Some(ri) = self.resolve(&ly.name, "PV receiver", nm).filter(|&ri| ri != li) else {
                    continue;
                };
                let rly = &self.layers[ri];
                if rly.len() != ly.len() {
                    return Err(GateError::ShapeMismatch {
                        a: ly.name.clone(),
                        b: rly.name.clone(),
                        detail: format!("PV broadcast needs equal unit counts, {} vs {}", ly.len(), rly.len()),
                    });
                }
                resolved.push(ri);
            }
            for &ri in &resolved {
                self.layers[ri].is_pv_receiver = true;
            }
            if let LayerKind::Pv(pv) = &mut self.layers[li].kind {
                pv.receivers = resolved;
            }
        }
        Ok(())
    }

    fn build_prjns(&mut self) -> Result<()> {
        for pj in &mut self.prjns {
            let send = &self.layers[pj.send];
            let recv = &self.layers[pj.recv];
            if matches!(pj.kind, PrjnKind::Trace(_)) && recv.as_matrix().is_none() {
                return Err(recv.expect_kind("matrix"));
            }
            pj.build(&send.shape, &recv.shape)?;
        }
        Ok(())
    }

    /// Start of a trial: reset the within-trial clock and alpha-max.
    pub fn alpha_cyc_init(&mut self, time: &mut SimTime) {
        time.alpha_cyc_start();
        for ly in &mut self.layers {
            ly.alpha_cyc_init();
        }
    }

    /// Advance one cycle: settle every layer, then run post-settle updates.
    pub fn cycle(&mut self, time: &mut SimTime) -> Result<()> {
        self.ensure_built()?;

        // phase 1
        self.send_ge();
        for ly in &mut self.layers {
            ly.settle(time);
        }

        // phase 2
        self.send_pv(time);
        self.matrix_da_act_lrn(time);
        self.pfc_gating(time);
        for ly in &mut self.layers {
            let Layer { kind, shape, neurons, .. } = ly;
            if let LayerKind::PfcDeep(pfc) = kind {
                pfc.rec_gate_act(shape, neurons);
                pfc.clear_now();
            }
        }

        time.cycle_inc();
        Ok(())
    }

    fn send_ge(&mut self) {
        for ly in &mut self.layers {
            ly.neurons.ge_raw.fill(0.0);
        }
        for pj in &self.prjns {
            let (recv, send) = split_pair(&mut self.layers, pj.recv, Some(pj.send));
            if let Some(send) = send {
                pj.send_ge(&send.neurons.act, &mut recv.neurons.ge_raw);
            }
        }
    }

    fn send_pv(&mut self, time: &SimTime) {
        for pi in 0..self.layers.len() {
            let receivers = match &self.layers[pi].kind {
                LayerKind::Pv(pv) if pv.sends_at(time) => pv.resolved_receivers().to_vec(),
                _ => continue,
            };
            for ri in receivers {
                let (recv, src) = split_pair(&mut self.layers, ri, Some(pi));
                if let Some(src) = src {
                    send_pv_act(&src.neurons, &mut recv.neurons);
                }
            }
        }
    }

    fn matrix_da_act_lrn(&mut self, time: &SimTime) {
        for li in 0..self.layers.len() {
            let thal = match &self.layers[li].kind {
                LayerKind::Matrix(mtx) => mtx.thal,
                _ => continue,
            };
            let (ly, tly) = split_pair(&mut self.layers, li, thal);
            let Layer { kind, neurons, alpha_max_cyc, name, .. } = ly;
            let LayerKind::Matrix(mtx) = kind else {
                continue;
            };
            mtx.da_lrn_from_da();
            match tly {
                Some(tly) => {
                    mtx.act_lrn_from_thal(time, *alpha_max_cyc, neurons, |p| tly.pool_alpha_max(p));
                }
                None => log::debug!("[GATE] {}: no thalamic layer, act_lrn not signed", name),
            }
        }
    }

    fn pfc_gating(&mut self, time: &SimTime) {
        for li in 0..self.layers.len() {
            let Some(pfc) = self.layers[li].as_pfc_mut() else {
                continue;
            };
            let effects = pfc.gating(time);
            let (super_idx, maint_idx) = (pfc.super_layer, pfc.maint_layer);
            for effect in effects {
                match effect {
                    GateEffect::DecaySuper { pool, frac } => {
                        if let Some(si) = super_idx {
                            self.layers[si].decay_pool(pool, frac);
                        }
                    }
                    GateEffect::ClearMaint { pool } => self.clear_maint(li, maint_idx, pool),
                }
            }
        }
    }

    /// Output gate `li` fired on `pool`: clear the paired maintenance stripe
    /// and decay that layer's super pool.
    fn clear_maint(&mut self, li: LayerId, maint_idx: Option<LayerId>, pool: usize) {
        let Some(mi) = maint_idx else {
            log::debug!("[GATE] {}: no maintenance layer to clear", self.layers[li].name);
            return;
        };
        let decay = {
            let Layer { kind, shape, name, .. } = &mut self.layers[mi];
            let LayerKind::PfcDeep(mpfc) = kind else {
                return;
            };
            let Some(frac) = mpfc.clear_maint_pool(pool, shape) else {
                return;
            };
            log::debug!("[GATE] {}: stripe {} cleared by output gate", name, pool);
            mpfc.super_layer.map(|si| (si, frac))
        };
        if let Some((si, frac)) = decay {
            self.layers[si].decay_pool(pool, frac);
        }
    }

    /// End of a quarter: gate counters, then deep maintenance, then advance
    /// the clock to the next quarter.
    pub fn quarter_final(&mut self, time: &mut SimTime) -> Result<()> {
        self.ensure_built()?;
        for li in 0..self.layers.len() {
            let super_idx = match self.layers[li].as_pfc_mut() {
                Some(pfc) => {
                    pfc.update_gate_cnt(time);
                    pfc.super_layer
                }
                None => continue,
            };
            let (ly, sup) = split_pair(&mut self.layers, li, super_idx);
            let Layer { kind, shape, neurons, name, .. } = ly;
            let LayerKind::PfcDeep(pfc) = kind else {
                continue;
            };
            match sup {
                Some(sup) => pfc.deep_maint(time, shape, neurons, sup),
                None => log::debug!("[MAINT] {}: no super layer, maintenance skipped", name),
            }
        }
        time.quarter_inc();
        Ok(())
    }

    /// Whether any PFC layer gates in Q2 and so wants a learning pass then.
    pub fn do_quarter2_dwt(&self) -> bool {
        self.layers.iter().filter_map(Layer::as_pfc).any(|p| p.do_quarter2_dwt())
    }

    /// Compute weight changes on every projection. Returns the number of
    /// synapses changed.
    pub fn dwt(&mut self) -> Result<usize> {
        self.ensure_built()?;
        let mut changed = 0usize;
        for pj in &mut self.prjns {
            let n = pj.dwt(&self.layers[pj.send], &self.layers[pj.recv]);
            if n > 0 {
                log::debug!(
                    "[TRACE] {} -> {}: {} synapses changed",
                    self.layers[pj.send].name, self.layers[pj.recv].name, n
                );
            }
            changed += n;
        }
        Ok(changed)
    }

    pub fn wt_from_dwt(&mut self) {
        for pj in &mut self.prjns {
            pj.wt_from_dwt();
        }
    }

    /// Reset all weights and traces.
    pub fn init_wts(&mut self) {
        for pj in &mut self.prjns {
            pj.init_wts();
        }
    }

    /// Return every layer's activation and gating state to rest.
    pub fn init_acts(&mut self) {
        for ly in &mut self.layers {
            ly.init_acts();
        }
    }

    /// Run cycles until the current quarter is complete, then `quarter_final`.
    pub fn run_quarter(&mut self, time: &mut SimTime) -> Result<()> {
        while !time.quarter_done() {
            self.cycle(time)?;
        }
        self.quarter_final(time)
    }

    /// Run a full trial. With `learn`, weights are updated at the end of the
    /// trial and additionally after Q2 when any PFC layer gates in Q2.
    pub fn run_trial(&mut self, time: &mut SimTime, learn: bool) -> Result<()> {
        self.alpha_cyc_init(time);
        for _ in Quarter::ALL {
            let q = time.quarter;
            self.run_quarter(time)?;
            if learn && q == Quarter::Q2 && self.do_quarter2_dwt() {
                self.dwt()?;
                self.wt_from_dwt();
            }
        }
        if learn {
            self.dwt()?;
            self.wt_from_dwt();
        }
        Ok(())
    }

    /// Record a gate decision for `pool` of PFC layer `layer`. Consumed at
    /// the end of the next cycle.
    pub fn set_gate(&mut self, layer: &str, pool: usize, now: bool, act: f32) -> Result<()> {
        let li = self.layer_id(layer)?;
        let ly = &mut self.layers[li];
        match ly.as_pfc_mut() {
            Some(pfc) => pfc.set_gate(pool, now, act),
            None => Err(ly.expect_kind("pfc_deep")),
        }
    }

    pub fn set_da(&mut self, layer: &str, da: f32) -> Result<()> {
        self.with_matrix(layer, |m| m.da = da)
    }

    pub fn set_ach(&mut self, layer: &str, ach: f32) -> Result<()> {
        self.with_matrix(layer, |m| m.ach = ach)
    }

    fn with_matrix<F>(&mut self, layer: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut crate::matrix::MatrixState),
    {
        let li = self.layer_id(layer)?;
        let ly = &mut self.layers[li];
        match ly.as_matrix_mut() {
            Some(m) => {
                f(m);
                Ok(())
            }
            None => Err(ly.expect_kind("matrix")),
        }
    }

    pub fn apply_ext(&mut self, layer: &str, ext: &[f32]) -> Result<()> {
        let li = self.layer_id(layer)?;
        self.layers[li].apply_ext(ext)
    }

    pub fn set_act(&mut self, layer: &str, act: &[f32]) -> Result<()> {
        let li = self.layer_id(layer)?;
        self.layers[li].set_act(act)
    }

    pub fn pv_monitor_val(&self, layer: &str, what: PvMonitor) -> Result<f32> {
        let ly = &self.layers[self.layer_id(layer)?];
        if ly.as_pv().is_none() {
            return Err(ly.expect_kind("pv"));
        }
        what.eval(ly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::ExternalDynamics;
    use crate::matrix::{DaReceptor, MatrixState};
    use crate::maint_dyn::PfcDyns;
    use crate::pv::{PvParams, PvState};

    fn pfc_net(deep: Shape, sup: Shape) -> Network {
        let mut net = Network::new("test");
        net.add_layer("PFCmnt", sup, LayerKind::Plain).unwrap();
        net.add_layer("PFCmntD", deep, LayerKind::PfcDeep(PfcDeepState::maint_gate())).unwrap();
        net
    }

    #[test]
    fn duplicate_and_unknown_layers() {
        let mut net = Network::new("n");
        net.add_layer("A", Shape::flat(1, 1), LayerKind::Plain).unwrap();
        assert_eq!(
            net.add_layer("A", Shape::flat(1, 1), LayerKind::Plain),
            Err(GateError::DuplicateLayer("A".into()))
        );
        assert!(matches!(
            net.connect("A", "B", Pattern::Full, PrjnKind::Standard),
            Err(GateError::UnknownLayer(_))
        ));
        assert!(net.connect("A", "A", Pattern::Full, PrjnKind::Standard).is_err());
    }

    #[test]
    fn hooks_require_build() {
        let mut net = Network::new("n");
        net.add_layer("A", Shape::flat(1, 1), LayerKind::Plain).unwrap();
        let mut t = SimTime::default();
        assert_eq!(net.cycle(&mut t), Err(GateError::NotBuilt("n".into())));
        net.build().unwrap();
        assert!(net.cycle(&mut t).is_ok());
        assert_eq!(t.cycle, 1);
    }

    #[test]
    fn super_pool_mismatch_fails_build() {
        let mut net = pfc_net(Shape::new(1, 2, 1, 1), Shape::new(1, 3, 1, 1));
        assert!(matches!(net.build(), Err(GateError::PoolCountMismatch { .. })));
    }

    #[test]
    fn super_unit_columns_must_match() {
        let mut net = pfc_net(Shape::new(1, 1, 1, 2), Shape::new(1, 1, 1, 3));
        assert!(matches!(net.build(), Err(GateError::ShapeMismatch { .. })));
    }

    fn out_net(mnt: LayerKind, mnt_shape: Shape, out_shape: Shape) -> Network {
        let mut net = Network::new("n");
        net.add_layer("PFCmnt", mnt_shape, LayerKind::Plain).unwrap();
        net.add_layer("PFCmntD", mnt_shape, mnt).unwrap();
        net.add_layer("PFCout", out_shape, LayerKind::Plain).unwrap();
        net.add_layer("PFCoutD", out_shape, LayerKind::PfcDeep(PfcDeepState::out_gate())).unwrap();
        net
    }

    #[test]
    fn out_gate_pairs_with_maint_gate() {
        let shape = Shape::new(1, 2, 1, 1);
        let mut net = out_net(LayerKind::PfcDeep(PfcDeepState::maint_gate()), shape, shape);
        net.build().unwrap();
        let out = net.layer_by_name("PFCoutD").and_then(Layer::as_pfc).unwrap();
        assert_eq!(out.maint_layer, net.layer_id("PFCmntD").ok());
    }

    #[test]
    fn out_maint_pool_mismatch_fails_build() {
        let mut net = out_net(
            LayerKind::PfcDeep(PfcDeepState::maint_gate()),
            Shape::new(1, 2, 1, 1),
            Shape::new(1, 3, 1, 1),
        );
        assert!(matches!(
            net.build(),
            Err(GateError::PoolCountMismatch { a_pools: 3, b_pools: 2, .. })
        ));
    }

    #[test]
    fn out_maint_layer_must_be_pfc() {
        let shape = Shape::new(1, 2, 1, 1);
        let mut net = out_net(LayerKind::Plain, shape, shape);
        assert!(matches!(
            net.build(),
            Err(GateError::LayerKindMismatch { expected: "maint-gate pfc_deep", found: "plain", .. })
        ));
    }

    #[test]
    fn out_gate_cannot_clear_another_out_gate() {
        let mut net = Network::new("n");
        let shape = Shape::new(1, 2, 1, 1);
        net.add_layer("A", shape, LayerKind::Plain).unwrap();
        net.add_layer("AD", shape, LayerKind::PfcDeep(PfcDeepState::out_gate())).unwrap();
        net.add_layer("B", shape, LayerKind::Plain).unwrap();
        let mut out = PfcDeepState::out_gate().with_maint("AD");
        out.maint.out_clear_maint = true;
        net.add_layer("BD", shape, LayerKind::PfcDeep(out)).unwrap();
        assert!(matches!(
            net.build(),
            Err(GateError::LayerKindMismatch { expected: "maint-gate pfc_deep", found: "pfc_deep", .. })
        ));
    }

    #[test]
    fn out_clear_without_maint_layer_is_soft() {
        let mut net = Network::new("n");
        let shape = Shape::new(1, 2, 1, 1);
        net.add_layer("PFCout", shape, LayerKind::Plain).unwrap();
        let mut out = PfcDeepState::out_gate();
        out.maint.out_clear_maint = true;
        net.add_layer("PFCoutD", shape, LayerKind::PfcDeep(out)).unwrap();
        net.build().unwrap();
        assert_eq!(net.layer_by_name("PFCoutD").and_then(Layer::as_pfc).unwrap().maint_layer, None);

        net.set_gate("PFCoutD", 0, true, 1.0).unwrap();
        let mut t = SimTime::default();
        net.cycle(&mut t).unwrap();
        let out = net.layer_by_name("PFCoutD").and_then(Layer::as_pfc).unwrap();
        assert_eq!(out.gate_states[0].cnt, 0);
        assert_eq!(out.gate_states[1].cnt, -1);
    }

    #[test]
    fn dyn_row_mismatch_fails_build() {
        let mut net = Network::new("n");
        net.add_layer("PFCmnt", Shape::new(1, 1, 1, 2), LayerKind::Plain).unwrap();
        let pfc = PfcDeepState::maint_gate().with_dyns(PfcDyns::full_dyn(5.0));
        net.add_layer("PFCmntD", Shape::new(1, 1, 3, 2), LayerKind::PfcDeep(pfc)).unwrap();
        assert!(matches!(net.build(), Err(GateError::DynRowMismatch { expected: 4, .. })));
    }

    #[test]
    fn missing_super_is_soft() {
        let mut net = Network::new("n");
        net.add_layer("PFCmntD", Shape::flat(1, 1), LayerKind::PfcDeep(PfcDeepState::maint_gate())).unwrap();
        net.build().unwrap();
        let mut t = SimTime::new(1);
        net.set_gate("PFCmntD", 0, true, 1.0).unwrap();
        net.run_quarter(&mut t).unwrap();
        net.run_quarter(&mut t).unwrap();
        let pfc = net.layer_by_name("PFCmntD").and_then(Layer::as_pfc).unwrap();
        assert_eq!(pfc.gate_states[0].cnt, 1);
        assert_eq!(pfc.neurs.maint[0], 0.0);
    }

    #[test]
    fn trace_prjn_must_target_matrix() {
        let mut net = Network::new("n");
        net.add_layer("A", Shape::flat(1, 1), LayerKind::Plain).unwrap();
        net.add_layer("B", Shape::flat(1, 1), LayerKind::Plain).unwrap();
        net.connect("A", "B", Pattern::Full, PrjnKind::trace()).unwrap();
        assert!(matches!(net.build(), Err(GateError::LayerKindMismatch { expected: "matrix", .. })));
    }

    #[test]
    fn pv_broadcast_in_send_quarter_only() {
        let mut net = Network::new("n");
        let shape = Shape::flat(1, 2);
        net.add_layer("PosPV", shape, LayerKind::Pv(PvState::new(PvParams::default()))).unwrap();
        net.add_layer("VThal", shape, LayerKind::Plain).unwrap();
        net.add_layer("MtxGo", shape, LayerKind::Matrix(MatrixState::new(DaReceptor::D1))).unwrap();
        net.add_pv_receiver("PosPV", "MtxGo").unwrap();
        net.add_pv_receiver("PosPV", "Ghost").unwrap();
        net.build().unwrap();
        assert!(net.layer_by_name("MtxGo").map_or(false, |l| l.is_pv_receiver));
        let pv = net.layer_by_name("PosPV").and_then(Layer::as_pv).unwrap();
        assert_eq!(pv.resolved_receivers(), &[2]);

        net.apply_ext("PosPV", &[1.0, 0.3]).unwrap();
        let mut t = SimTime::new(2);
        net.run_quarter(&mut t).unwrap();
        assert_eq!(net.layer_by_name("MtxGo").unwrap().neurons.pv_act, vec![0.0, 0.0]);

        t.quarter = Quarter::Q4;
        net.cycle(&mut t).unwrap();
        let pv_act = &net.layer_by_name("MtxGo").unwrap().neurons.pv_act;
        assert!((pv_act[0] - 1.0).abs() < 1e-6);
        assert!((pv_act[1] - 0.3).abs() < 1e-6);

        let total = net.pv_monitor_val("PosPV", PvMonitor::TotalAct).unwrap();
        assert!((total - 1.3).abs() < 1e-6);
        assert!(net.pv_monitor_val("MtxGo", PvMonitor::TotalAct).is_err());
    }

    #[test]
    fn pv_receiver_shape_checked() {
        let mut net = Network::new("n");
        net.add_layer("PosPV", Shape::flat(1, 2), LayerKind::Pv(PvState::new(PvParams::default()))).unwrap();
        net.add_layer("R", Shape::flat(1, 3), LayerKind::Plain).unwrap();
        net.add_pv_receiver("PosPV", "R").unwrap();
        assert!(matches!(net.build(), Err(GateError::ShapeMismatch { .. })));
    }

    #[test]
    fn matrix_da_derived_each_cycle() {
        let mut net = Network::new("n");
        let shape = Shape::new(1, 2, 1, 1);
        net.add_layer("VThal", shape, LayerKind::Plain).unwrap();
        net.add_layer("MtxGo", shape, LayerKind::Matrix(MatrixState::new(DaReceptor::D1))).unwrap();
        net.add_layer("MtxNo", shape, LayerKind::Matrix(MatrixState::new(DaReceptor::D2))).unwrap();
        net.build().unwrap();
        net.set_da("MtxGo", 0.5).unwrap();
        net.set_da("MtxNo", 0.5).unwrap();
        assert!(net.set_da("VThal", 0.5).is_err());
        let mut t = SimTime::default();
        net.cycle(&mut t).unwrap();
        let go = net.layer_by_name("MtxGo").and_then(Layer::as_matrix).unwrap().da_lrn;
        let no = net.layer_by_name("MtxNo").and_then(Layer::as_matrix).unwrap().da_lrn;
        assert!(go > 0.0 && no < 0.0);
    }

    #[test]
    fn matrix_thal_pool_mismatch_fails_build() {
        let mut net = Network::new("n");
        net.add_layer("VThal", Shape::new(1, 3, 1, 1), LayerKind::Plain).unwrap();
        net.add_layer("MtxGo", Shape::new(1, 2, 1, 1), LayerKind::Matrix(MatrixState::new(DaReceptor::D1)))
            .unwrap();
        assert!(matches!(
            net.build(),
            Err(GateError::PoolCountMismatch { a_pools: 2, b_pools: 3, .. })
        ));
    }

    #[test]
    fn matrix_without_thal_still_derives_da() {
        let mut net = Network::new("n");
        let shape = Shape::new(1, 2, 1, 1);
        net.add_layer("MtxNo", shape, LayerKind::Matrix(MatrixState::new(DaReceptor::D2))).unwrap();
        for ly in &mut net.layers {
            ly.dynamics = Box::new(ExternalDynamics);
            ly.alpha_max_cyc = 0;
        }
        net.build().unwrap();
        assert_eq!(net.layer_by_name("MtxNo").and_then(Layer::as_matrix).unwrap().thal, None);

        net.set_act("MtxNo", &[0.5, 0.5]).unwrap();
        net.set_da("MtxNo", 0.5).unwrap();
        let mut t = SimTime::default();
        net.cycle(&mut t).unwrap();
        let ly = net.layer_by_name("MtxNo").unwrap();
        let mtx = ly.as_matrix().unwrap();
        assert!((mtx.da_lrn + 0.5).abs() < 1e-6);
        assert_eq!(ly.neurons.act_lrn, vec![0.0, 0.0]);
    }

    #[test]
    fn matrix_act_lrn_follows_thal_gate() {
        let mut net = Network::new("n");
        let shape = Shape::new(1, 2, 1, 1);
        net.add_layer("VThal", shape, LayerKind::Plain).unwrap();
        net.add_layer("MtxGo", shape, LayerKind::Matrix(MatrixState::new(DaReceptor::D1))).unwrap();
        for ly in &mut net.layers {
            ly.dynamics = Box::new(ExternalDynamics);
            ly.alpha_max_cyc = 0;
        }
        net.build().unwrap();
        net.set_act("VThal", &[0.9, 0.0]).unwrap();
        net.set_act("MtxGo", &[0.5, 0.5]).unwrap();
        let mut t = SimTime::default();
        net.cycle(&mut t).unwrap();
        let act_lrn = &net.layer_by_name("MtxGo").unwrap().neurons.act_lrn;
        assert!((act_lrn[0] - 0.5).abs() < 1e-6);
        assert!((act_lrn[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn projections_drive_receivers() {
        let mut net = Network::new("n");
        net.add_layer("In", Shape::flat(1, 1), LayerKind::Plain).unwrap();
        net.add_layer("Out", Shape::flat(1, 1), LayerKind::Plain).unwrap();
        net.layer_by_name_mut("In").unwrap().dynamics = Box::new(crate::dynamics::ClampedDynamics);
        net.connect("In", "Out", Pattern::OneToOne, PrjnKind::Standard).unwrap();
        net.build().unwrap();
        net.apply_ext("In", &[1.0]).unwrap();
        let mut t = SimTime::default();
        net.cycle(&mut t).unwrap();
        net.cycle(&mut t).unwrap();
        let out = net.layer_by_name("Out").unwrap();
        assert!((out.neurons.ge_raw[0] - 0.5).abs() < 1e-6);
        assert!(out.neurons.act[0] > 0.0);
    }

    #[test]
    fn gate_input_errors() {
        let mut net = pfc_net(Shape::flat(1, 1), Shape::flat(1, 1));
        net.build().unwrap();
        assert!(matches!(net.set_gate("PFCmnt", 0, true, 1.0), Err(GateError::LayerKindMismatch { .. })));
        assert!(matches!(net.set_gate("PFCmntD", 3, true, 1.0), Err(GateError::IndexOutOfRange { .. })));
        assert!(net.do_quarter2_dwt());
    }
}
