//! Projections: weighted connections from a sending layer to a receiving
//! layer, with an optional trace learning rule.

use crate::error::{GateError, Result};
use crate::layer::{Layer, LayerId};
use crate::learn::LearnParams;
use crate::shape::Shape;
use crate::synapse::{Synapse, SynapseStore};
use crate::trace::{Neuromod, TraceParams, TraceState};

/// Index of a projection in its network.
pub type PrjnId = usize;

/// Connectivity pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pattern {
    /// Every sender to every receiver.
    #[default]
    Full,
    /// Sender `i` to receiver `i`. Layers must have equal unit counts.
    OneToOne,
    /// Every unit of sender pool `p` to every unit of receiver pool `p`.
    /// Layers must have equal pool counts.
    PoolOneToOne,
}

impl Pattern {
    /// Enumerate (sender, receiver) unit pairs.
    pub fn connect(self, send: &Shape, recv: &Shape) -> Result<Vec<(u32, u32)>> {
        match self {
            Self::Full => Ok((0..send.len())
                .flat_map(|s| (0..recv.len()).map(move |r| (s as u32, r as u32)))
                .collect()),
            Self::OneToOne => {
                if send.len() != recv.len() {
                    return Err(GateError::ShapeMismatch {
                        a: "sender".to_string(),
                        b: "receiver".to_string(),
                        detail: format!("one-to-one needs equal unit counts, {} vs {}", send.len(), recv.len()),
                    });
                }
                Ok((0..send.len() as u32).map(|i| (i, i)).collect())
            }
            Self::PoolOneToOne => {
                if send.n_pools() != recv.n_pools() {
                    return Err(GateError::PoolCountMismatch {
                        a: "sender".to_string(),
                        a_pools: send.n_pools(),
                        b: "receiver".to_string(),
                        b_pools: recv.n_pools(),
                    });
                }
                let mut pairs = Vec::with_capacity(send.len() * recv.units_per_pool());
                for p in 0..send.n_pools() {
                    for s in send.pool_units(p) {
                        for r in recv.pool_units(p) {
                            pairs.push((s as u32, r as u32));
                        }
                    }
                }
                Ok(pairs)
            }
        }
    }
}

/// Learning rule carried by a projection.
pub enum PrjnKind {
    /// Fixed weights; the learning pass is a no-op.
    Standard,
    /// Dopamine-modulated eligibility-trace learning into a matrix layer.
    Trace(TraceState),
}

impl PrjnKind {
    pub fn trace() -> Self {
        Self::Trace(TraceState::new(TraceParams::default()))
    }

    pub fn trace_with(params: TraceParams) -> Self {
        Self::Trace(TraceState::new(params))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Trace(_) => "trace",
        }
    }
}

pub struct Projection {
    pub id: PrjnId,
    pub send: LayerId,
    pub recv: LayerId,
    pub pattern: Pattern,
    pub kind: PrjnKind,
    pub learn: LearnParams,
    /// Initial weight of every synapse. Default: 0.5
    pub wt_init: f32,
    /// Multiplier on this projection's contribution to net input. Default: 1.0
    pub wt_scale: f32,
    pub store: SynapseStore,
}

impl Projection {
    pub fn new(id: PrjnId, send: LayerId, recv: LayerId, pattern: Pattern, kind: PrjnKind) -> Self {
        let learn = match kind {
            PrjnKind::Trace(_) => LearnParams::trace_defaults(),
            PrjnKind::Standard => LearnParams::default(),
        };
        Self {
            id,
            send,
            recv,
            pattern,
            kind,
            learn,
            wt_init: 0.5,
            wt_scale: 1.0,
            store: SynapseStore::default(),
        }
    }

    pub fn trace(&self) -> Option<&TraceState> {
        match &self.kind {
            PrjnKind::Trace(t) => Some(t),
            PrjnKind::Standard => None,
        }
    }

    /// Allocate synapses (and trace state) for the given layer shapes.
    pub(crate) fn build(&mut self, send: &Shape, recv: &Shape) -> Result<()> {
        self.learn.validate()?;
        let edges = self
            .pattern
            .connect(send, recv)?
            .into_iter()
            .map(|(s, r)| (s, Synapse::new(r, self.wt_init)))
            .collect();
        self.store = SynapseStore::from_edges(send.len() as u32, edges);
        if let PrjnKind::Trace(tr) = &mut self.kind {
            tr.build(self.store.total_synapses());
        }
        Ok(())
    }

    /// Add this projection's weighted input into the receiver's `ge_raw`.
    pub fn send_ge(&self, send_act: &[f32], recv_ge_raw: &mut [f32]) {
        for (si, &act) in send_act.iter().enumerate() {
            if act == 0.0 {
                continue;
            }
            let sa = act * self.wt_scale;
            for sy in self.store.outgoing(si) {
                recv_ge_raw[sy.recv as usize] += sa * sy.wt;
            }
        }
    }

    /// Learning pass. Returns the number of synapses changed.
    pub fn dwt(&mut self, send: &Layer, recv: &Layer) -> usize {
        let PrjnKind::Trace(tr) = &mut self.kind else {
            return 0;
        };
        let Some(mtx) = recv.as_matrix() else {
            return 0;
        };
        let nm = Neuromod { da: mtx.da, da_lrn: mtx.da_lrn, ach: mtx.ach };
        tr.dwt(&self.learn, &mut self.store, &send.neurons.act_lrn, &recv.neurons.act_lrn, nm)
    }

    pub fn wt_from_dwt(&mut self) {
        self.learn.wt_from_dwt(&mut self.store.synapses);
    }

    /// Reset weights to `wt_init` and clear all learning state.
    pub fn init_wts(&mut self) {
        for sy in &mut self.store.synapses {
            sy.wt = self.wt_init;
            sy.clear_learning();
        }
        if let PrjnKind::Trace(tr) = &mut self.kind {
            tr.clear_trace();
        }
    }
}
