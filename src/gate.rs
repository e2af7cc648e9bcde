//! Per-stripe gate state.
//!
//! `now` and `act` are written by an upstream gate-decision source (a
//! GPi/thalamus stage outside this crate). `cnt` is owned by the PFC layer's
//! gating state machine:
//!
//! | cnt                  | phase        |
//! |----------------------|--------------|
//! | `< 0`                | Idle         |
//! | `0`                  | JustGated    |
//! | `1 .. max_maint`     | Maintaining  |
//! | `>= max_maint`       | Expired      |

/// Role of a PFC layer's stripes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GateType {
    /// Robust maintenance: stripes hold content until cleared or expired.
    #[default]
    Maint,
    /// Output gating: transient activation during gating only.
    Out,
}

impl GateType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Maint => "maint",
            Self::Out => "out",
        }
    }
}

/// Coarse lifecycle phase derived from `cnt`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GatePhase {
    Idle,
    JustGated,
    Maintaining,
    Expired,
}

impl GatePhase {
    #[inline]
    pub fn classify(cnt: i32, max_maint: i32) -> Self {
        if cnt < 0 {
            Self::Idle
        } else if cnt >= max_maint {
            Self::Expired
        } else if cnt == 0 {
            Self::JustGated
        } else {
            Self::Maintaining
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateState {
    /// A gating decision is active this cycle.
    pub now: bool,
    /// Gating drive magnitude; only meaningful when `now`.
    pub act: f32,
    /// -1 = idle/cleared, 0 = just gated, >0 = quarters since gating.
    /// Keeps decreasing while idle so idle duration is observable.
    pub cnt: i32,
}

impl Default for GateState {
    fn default() -> Self {
        Self { now: false, act: 0.0, cnt: -1 }
    }
}

impl GateState {
    pub fn init(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn phase(&self, max_maint: i32) -> GatePhase {
        GatePhase::classify(self.cnt, max_maint)
    }

    /// Whether this cycle carries a go decision.
    #[inline]
    pub fn is_gating(&self) -> bool {
        self.now && self.act > 0.0
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.cnt < 0
    }
}
