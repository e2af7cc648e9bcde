//! Network inspection and diagnostics.

use crate::gate::GatePhase;
use crate::layer::Layer;
use crate::network::Network;
use crate::pfc::PfcDeepState;
use crate::prjn::Projection;

/// Distribution of a PFC layer's stripes across gate phases.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GateStats {
    pub layer: String,
    pub idle: usize,
    pub just_gated: usize,
    pub maintaining: usize,
    pub expired: usize,
    /// Mean maintenance conductance over all units.
    pub mean_maint_ge: f32,
}

impl GateStats {
    pub fn from_pfc(layer: &str, pfc: &PfcDeepState) -> Self {
        let mut s = Self { layer: layer.to_string(), ..Self::default() };
        for gs in &pfc.gate_states {
            match gs.phase(pfc.maint.max_maint) {
                GatePhase::Idle => s.idle += 1,
                GatePhase::JustGated => s.just_gated += 1,
                GatePhase::Maintaining => s.maintaining += 1,
                GatePhase::Expired => s.expired += 1,
            }
        }
        let n = pfc.neurs.len();
        if n > 0 {
            s.mean_maint_ge = pfc.neurs.maint_ge.iter().sum::<f32>() / n as f32;
        }
        s
    }

    pub fn total(&self) -> usize {
        self.idle + self.just_gated + self.maintaining + self.expired
    }

    /// Stripes currently holding content.
    pub fn active(&self) -> usize {
        self.just_gated + self.maintaining + self.expired
    }
}

impl std::fmt::Display for GateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: IDLE={} GATED={} MAINT={} EXPIRED={} mean MaintGe={:.3}",
            self.layer, self.idle, self.just_gated, self.maintaining, self.expired, self.mean_maint_ge
        )
    }
}

/// Trace magnitudes of one trace projection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TraceStats {
    pub send: String,
    pub recv: String,
    pub n_synapses: usize,
    pub mean_abs_tr: f32,
    pub max_abs_tr: f32,
    pub nonzero: usize,
}

impl TraceStats {
    pub fn from_prjn(pj: &Projection, send: &Layer, recv: &Layer) -> Option<Self> {
        let tr = pj.trace()?;
        let (mean_abs_tr, max_abs_tr, nonzero) = tr.summary();
        Some(Self {
            send: send.name.clone(),
            recv: recv.name.clone(),
            n_synapses: pj.store.total_synapses(),
            mean_abs_tr,
            max_abs_tr,
            nonzero,
        })
    }
}

impl std::fmt::Display for TraceStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}: {} synapses, {} traced, mean |Tr|={:.4}, max |Tr|={:.4}",
            self.send, self.recv, self.n_synapses, self.nonzero, self.mean_abs_tr, self.max_abs_tr
        )
    }
}

/// Summary statistics for a network.
#[derive(Clone, Debug)]
pub struct NetworkStats {
    pub name: String,
    pub n_layers: usize,
    pub n_units: usize,
    pub n_prjns: usize,
    pub n_synapses: usize,
    pub mean_weight: f32,
    pub gates: Vec<GateStats>,
    pub traces: Vec<TraceStats>,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Network '{}': {} layers, {} units, {} projections, {} synapses",
            self.name, self.n_layers, self.n_units, self.n_prjns, self.n_synapses)?;
        writeln!(f, "  Mean weight: {:.3}", self.mean_weight)?;
        for g in &self.gates {
            writeln!(f, "  Gate {}", g)?;
        }
        for t in &self.traces {
            writeln!(f, "  Trace {}", t)?;
        }
        Ok(())
    }
}

impl Network {
    pub fn gate_stats(&self) -> Vec<GateStats> {
        self.layers
            .iter()
            .filter_map(|ly| ly.as_pfc().map(|pfc| GateStats::from_pfc(&ly.name, pfc)))
            .collect()
    }

    pub fn trace_stats(&self) -> Vec<TraceStats> {
        self.prjns
            .iter()
            .filter_map(|pj| TraceStats::from_prjn(pj, &self.layers[pj.send], &self.layers[pj.recv]))
            .collect()
    }

    /// Compute comprehensive network statistics.
    pub fn stats(&self) -> NetworkStats {
        let n_syn: usize = self.prjns.iter().map(|p| p.store.total_synapses()).sum();
        let wt_sum: f32 = self
            .prjns
            .iter()
            .flat_map(|p| p.store.synapses.iter())
            .map(|s| s.wt)
            .sum();
        let mean_weight = if n_syn > 0 { wt_sum / n_syn as f32 } else { 0.0 };

        NetworkStats {
            name: self.name.clone(),
            n_layers: self.layers.len(),
            n_units: self.layers.iter().map(Layer::len).sum(),
            n_prjns: self.prjns.len(),
            n_synapses: n_syn,
            mean_weight,
            gates: self.gate_stats(),
            traces: self.trace_stats(),
        }
    }
}
