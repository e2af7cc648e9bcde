//! Dopamine-modulated eligibility-trace learning for gating projections.
//!
//! Co-activity of sender and receiver (`ntr = recv.act_lrn * send.act_lrn`)
//! accumulates into a per-synapse trace `tr`. Dopamine converts the trace into
//! a weight change; acetylcholine decays it. Two timing policies:
//!
//! - current-trial DA: `tr += ntr`, `dwt = da_lrn * tr`, decay
//! - delayed DA: `dwt = da_lrn * tr`, decay, `tr += ntr`
//!
//! With delayed DA, at least one full trial separates the activity that
//! created eligibility from the dopamine that consumes it.

use crate::learn::LearnParams;
use crate::synapse::SynapseStore;

/// Trace timing and decay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceParams {
    /// Current-trial DA can drive learning: the trace is updated before the
    /// DA-driven dwt. Otherwise DA applies to the prior trace. Default: true
    pub cur_trl_da: bool,
    /// Multiplier on ACh for decaying prior traces. The decay never exceeds 1.
    /// Default: 2.0
    pub decay: f32,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self { cur_trl_da: true, decay: 2.0 }
    }
}

impl TraceParams {
    /// Fraction of the trace removed per learning pass.
    #[inline]
    pub fn ach_decay(&self, ach: f32) -> f32 {
        (ach * self.decay).min(1.0)
    }
}

/// Per-synapse trace state, parallel to the projection's synapse array.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TraceSyn {
    /// Accumulated eligibility trace.
    pub tr: f32,
    /// Contribution computed on the most recent learning pass.
    pub ntr: f32,
}

/// Neuromodulator values of the receiving layer for one learning pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Neuromod {
    /// Raw dopamine; learning only happens when non-zero.
    pub da: f32,
    /// Effective learning dopamine (gains and receptor polarity applied).
    pub da_lrn: f32,
    pub ach: f32,
}

/// Trace learning state of one projection.
#[derive(Clone, Debug, Default)]
pub struct TraceState {
    pub params: TraceParams,
    pub syns: Vec<TraceSyn>,
}

impl TraceState {
    pub fn new(params: TraceParams) -> Self {
        Self { params, syns: Vec::new() }
    }

    pub(crate) fn build(&mut self, n_syns: usize) {
        self.syns = vec![TraceSyn::default(); n_syns];
    }

    pub fn clear_trace(&mut self) {
        for t in &mut self.syns {
            *t = TraceSyn::default();
        }
    }

    /// Compute weight changes for every synapse of `store`.
    ///
    /// Accumulates `lrate * dwt` into each synapse's `dwt`. Returns the number
    /// of synapses that received a non-zero change.
    pub fn dwt(
        &mut self,
        learn: &LearnParams,
        store: &mut SynapseStore,
        send_act_lrn: &[f32],
        recv_act_lrn: &[f32],
        nm: Neuromod,
    ) -> usize {
        if !learn.learn {
            return 0;
        }
        let ach_dk = self.params.ach_decay(nm.ach);
        let cur_trl_da = self.params.cur_trl_da;
        let mut changed = 0usize;

        for si in 0..store.n_senders() {
            let range = store.row(si);
            let syns = &mut store.synapses[range.clone()];
            let trsyns = &mut self.syns[range];
            let sact = send_act_lrn[si];

            for (sy, trsy) in syns.iter_mut().zip(trsyns.iter_mut()) {
                let mut tr = trsy.tr;
                let ntr = recv_act_lrn[sy.recv as usize] * sact;
                let mut dwt = 0.0;

                if cur_trl_da {
                    tr += ntr;
                }
                if nm.da != 0.0 {
                    dwt = nm.da_lrn * tr;
                }
                tr -= ach_dk * tr;
                if !cur_trl_da {
                    tr += ntr;
                }
                trsy.tr = tr;
                trsy.ntr = ntr;

                let mut norm = 1.0;
                if learn.norm.on {
                    norm = learn.norm.norm_from_abs_dwt(&mut sy.norm, dwt.abs());
                } else {
                    // diagnostic mirror of the trace in the unused accumulators
                    sy.norm = ntr;
                    sy.moment = tr;
                }
                if learn.momentum.on {
                    dwt = norm * learn.momentum.moment_from_dwt(&mut sy.moment, dwt);
                } else {
                    dwt *= norm;
                }
                if dwt != 0.0 {
                    changed += 1;
                }
                sy.dwt += learn.lrate * dwt;
            }

            if learn.norm.on {
                let max_norm = syns.iter().fold(0.0f32, |m, sy| m.max(sy.norm));
                for sy in syns.iter_mut() {
                    sy.norm = max_norm;
                }
            }
        }
        changed
    }

    /// Mean and max |tr| and the count of non-zero traces.
    pub fn summary(&self) -> (f32, f32, usize) {
        if self.syns.is_empty() {
            return (0.0, 0.0, 0);
        }
        let mut sum = 0.0f32;
        let mut max = 0.0f32;
        let mut nonzero = 0usize;
        for t in &self.syns {
            let a = t.tr.abs();
            sum += a;
            max = max.max(a);
            if t.tr != 0.0 {
                nonzero += 1;
            }
        }
        (sum / self.syns.len() as f32, max, nonzero)
    }
}
