//! Deterministic maintenance dynamics for deep PFC stripes.
//!
//! A deep layer may carry extra unit rows, one block of super-layer rows per
//! dynamics type. Each type scales the maintained drive as a function of how
//! many gate quarters have elapsed since gating, giving flat, decaying,
//! ramping or ramp-then-decay profiles.

/// Evaluates the maintenance profile of dynamics type `dyn_type` at `t`
/// gated quarters after the gating event.
pub trait MaintDynamics: Send + Sync {
    fn evaluate(&self, dyn_type: usize, t: f32) -> f32;

    /// Number of dynamics types (rows blocks in the deep layer).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One maintenance profile.
#[derive(Clone, Debug, PartialEq)]
pub struct PfcDyn {
    /// Value at the moment gating starts. Must be > 0 when used.
    pub init: f32,
    /// Linear rise time constant in gate quarters (0 = no rise).
    /// With both rise and decay, rise comes first.
    pub rise_tau: f32,
    /// Linear decay time constant in gate quarters (0 = no decay).
    pub decay_tau: f32,
    pub desc: String,
}

impl PfcDyn {
    pub fn new(init: f32, rise_tau: f32, decay_tau: f32, desc: &str) -> Self {
        Self { init, rise_tau, decay_tau, desc: desc.to_string() }
    }

    /// Profile value at time `t`, clamped to [0.001, 1].
    pub fn value(&self, t: f32) -> f32 {
        let mut val = self.init;
        if t <= 0.0 {
            return val;
        }
        if self.rise_tau > 0.0 && self.decay_tau > 0.0 {
            if t >= self.rise_tau {
                val = 1.0 - (t - self.rise_tau) / self.decay_tau;
            } else {
                val = self.init + (1.0 - self.init) * (t / self.rise_tau);
            }
        } else if self.rise_tau > 0.0 {
            val = self.init + (1.0 - self.init) * (t / self.rise_tau);
        } else if self.decay_tau > 0.0 {
            val = self.init - self.init * (t / self.decay_tau);
        }
        val.clamp(0.001, 1.0)
    }
}

/// Ordered table of profiles, indexed by dynamics type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PfcDyns(pub Vec<PfcDyn>);

impl PfcDyns {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// A single flat maintained profile.
    pub fn maint_only() -> Self {
        Self(vec![PfcDyn::new(1.0, 0.0, 0.0, "maintained: flat")])
    }

    /// The four canonical profiles with time constant `tau`.
    pub fn full_dyn(tau: f32) -> Self {
        Self(vec![
            PfcDyn::new(1.0, 0.0, 0.0, "maintained: flat"),
            PfcDyn::new(1.0, 0.0, tau, "phasic: decays over time"),
            PfcDyn::new(0.1, tau, 0.0, "ramping: rises over time"),
            PfcDyn::new(0.1, tau, tau, "ramp-decay: rises then falls"),
        ])
    }

    pub fn push(&mut self, d: PfcDyn) {
        self.0.push(d);
    }
}

impl MaintDynamics for PfcDyns {
    /// Out-of-range types evaluate to 1 (no modulation).
    fn evaluate(&self, dyn_type: usize, t: f32) -> f32 {
        self.0.get(dyn_type).map_or(1.0, |d| d.value(t))
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Dynamics defined by a closure, for strategies that are not table-driven.
pub struct FnDynamics<F> {
    n_types: usize,
    f: F,
}

impl<F> FnDynamics<F>
where
    F: Fn(usize, f32) -> f32 + Send + Sync,
{
    pub fn new(n_types: usize, f: F) -> Self {
        Self { n_types, f }
    }
}

impl<F> MaintDynamics for FnDynamics<F>
where
    F: Fn(usize, f32) -> f32 + Send + Sync,
{
    fn evaluate(&self, dyn_type: usize, t: f32) -> f32 {
        (self.f)(dyn_type, t)
    }

    fn len(&self) -> usize {
        self.n_types
    }
}
