//! Simulation clock: cycles grouped into four quarters per trial.
//!
//! A trial is one alpha cycle (~100ms). Each quarter runs `cycles_per_quarter`
//! cycles. Gating counters and deep maintenance update at quarter boundaries;
//! neuromodulator derivation runs every cycle.

/// One of the four fixed phases of a trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Quarter {
    Q1 = 0,
    Q2 = 1,
    Q3 = 2,
    Q4 = 3,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Zero-based index (Q1 = 0).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Self::Q1),
            1 => Some(Self::Q2),
            2 => Some(Self::Q3),
            3 => Some(Self::Q4),
            _ => None,
        }
    }

    /// Following quarter, wrapping Q4 back to Q1.
    #[inline]
    pub const fn next(self) -> Self {
        match self {
            Self::Q1 => Self::Q2,
            Self::Q2 => Self::Q3,
            Self::Q3 => Self::Q4,
            Self::Q4 => Self::Q1,
        }
    }
}

/// Bit set of quarters, e.g. the quarters in which gating takes effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct QuarterSet(u8);

impl QuarterSet {
    pub const EMPTY: Self = Self(0);

    #[inline]
    pub const fn single(q: Quarter) -> Self {
        Self(1 << q as u8)
    }

    /// Builder-style insert.
    #[inline]
    pub const fn with(self, q: Quarter) -> Self {
        Self(self.0 | (1 << q as u8))
    }

    #[inline]
    pub fn insert(&mut self, q: Quarter) {
        self.0 |= 1 << q as u8;
    }

    #[inline]
    pub fn remove(&mut self, q: Quarter) {
        self.0 &= !(1 << q as u8);
    }

    #[inline]
    pub const fn contains(self, q: Quarter) -> bool {
        self.0 & (1 << q as u8) != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Quarter> {
        Quarter::ALL.into_iter().filter(move |q| self.contains(*q))
    }
}

impl FromIterator<Quarter> for QuarterSet {
    fn from_iter<I: IntoIterator<Item = Quarter>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for q in iter {
            set.insert(q);
        }
        set
    }
}

/// Position of the simulation within the cycle / quarter / trial hierarchy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimTime {
    /// Cycle within the current trial (reset at trial start).
    pub cycle: u32,
    /// Total cycles since the clock was created.
    pub cycle_tot: u64,
    /// Current quarter.
    pub quarter: Quarter,
    /// Cycle within the current quarter.
    pub quarter_cycle: u32,
    /// Completed trials.
    pub trial: u64,
    /// Cycles per quarter. Default: 25
    pub cycles_per_quarter: u32,
}

impl SimTime {
    pub fn new(cycles_per_quarter: u32) -> Self {
        Self {
            cycle: 0,
            cycle_tot: 0,
            quarter: Quarter::Q1,
            quarter_cycle: 0,
            trial: 0,
            cycles_per_quarter: cycles_per_quarter.max(1),
        }
    }

    /// Reset the within-trial counters at the start of a trial.
    pub fn alpha_cyc_start(&mut self) {
        self.cycle = 0;
        self.quarter = Quarter::Q1;
        self.quarter_cycle = 0;
    }

    /// Advance one cycle.
    pub fn cycle_inc(&mut self) {
        self.cycle += 1;
        self.cycle_tot += 1;
        self.quarter_cycle += 1;
    }

    /// Advance to the next quarter. Leaving Q4 completes the trial.
    pub fn quarter_inc(&mut self) {
        self.quarter_cycle = 0;
        if self.quarter == Quarter::Q4 {
            self.trial += 1;
            self.cycle = 0;
        }
        self.quarter = self.quarter.next();
    }

    /// Whether the current quarter has run all of its cycles.
    #[inline]
    pub fn quarter_done(&self) -> bool {
        self.quarter_cycle >= self.cycles_per_quarter
    }
}

impl Default for SimTime {
    fn default() -> Self {
        Self::new(25)
    }
}
