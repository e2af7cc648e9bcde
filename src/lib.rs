//! # gatepool
//!
//! Gated working-memory substrate for basal-ganglia / prefrontal circuits.
//!
//! Provides PFC stripes that gate on external go decisions and hold their
//! super layer's activity as sustained deep maintenance, striatal matrix
//! layers that turn raw dopamine into a signed learning signal, and
//! dopamine-modulated eligibility-trace learning on the projections into
//! them. A primary-value layer broadcasts reward activity straight into its
//! receivers.
//!
//! The network advances one cycle at a time under caller control: every layer
//! settles, then the gating and neuromodulatory updates run over the settled
//! state. Quarter and trial hooks drive counter updates, maintenance and
//! learning.

pub mod dynamics;
pub mod error;
pub mod gate;
pub mod layer;
pub mod learn;
pub mod maint_dyn;
pub mod matrix;
pub mod network;
pub mod neuron;
pub mod pfc;
pub mod prjn;
pub mod pv;
pub mod shape;
pub mod stats;
pub mod synapse;
pub mod time;
pub mod trace;
pub mod vars;


pub use dynamics::{ActDynamics, ClampedDynamics, ExternalDynamics, RateCodeDynamics};
pub use error::{GateError, Result};
pub use gate::{GatePhase, GateState, GateType};
pub use layer::{Layer, LayerId, LayerKind};
pub use learn::{DWtNormParams, LearnParams, MomentumParams};
pub use maint_dyn::{FnDynamics, MaintDynamics, PfcDyn, PfcDyns};
pub use matrix::{DaReceptor, MatrixParams, MatrixState};
pub use network::Network;
pub use neuron::NeuronArrays;
pub use pfc::{GateEffect, PfcDeepState, PfcGateParams, PfcMaintParams, PfcNeuron, PfcNeuronArrays};
pub use prjn::{Pattern, PrjnId, PrjnKind, Projection};
pub use pv::{PvMonitor, PvParams, PvState};
pub use shape::{PoolRange, Shape};
pub use stats::{GateStats, NetworkStats, TraceStats};
pub use synapse::{Synapse, SynapseStore};
pub use time::{Quarter, QuarterSet, SimTime};
pub use trace::{Neuromod, TraceParams, TraceState, TraceSyn};
