//! Synapse data structures with CSR storage by sending unit.
//!
//! Each synapse carries a float weight, its pending weight change and the two
//! per-synapse learning accumulators (`norm`, `moment`). Stored in CSR
//! (Compressed Sparse Row) format so the learning pass walks every outgoing
//! synapse of a sender as one contiguous slice, which is what the per-sender
//! norm aggregation needs.

/// A single synapse.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Synapse {
    /// Receiving unit index within the receiving layer.
    pub recv: u32,
    /// Weight in [0, 1].
    pub wt: f32,
    /// Pending weight change, applied and zeroed by `wt_from_dwt`.
    pub dwt: f32,
    /// Running max |dwt| for normalization. On trace projections with
    /// normalization off, mirrors the synapse's `ntr`.
    pub norm: f32,
    /// Momentum accumulator. On trace projections with normalization off,
    /// mirrors the synapse's `tr`.
    pub moment: f32,
}

impl Synapse {
    pub fn new(recv: u32, wt: f32) -> Self {
        Self { recv, wt, ..Self::default() }
    }

    /// Reset learning state, keeping weight and target.
    #[inline]
    pub fn clear_learning(&mut self) {
        self.dwt = 0.0;
        self.norm = 0.0;
        self.moment = 0.0;
    }
}

/// Compressed Sparse Row synapse storage.
///
/// All outgoing synapses for sender `i` are at indices `row_ptr[i]..row_ptr[i+1]`
/// in the `synapses` array. Flat synapse indices are stable for the lifetime
/// of the store.
#[derive(Clone, Debug, Default)]
pub struct SynapseStore {
    /// Index into `synapses` for each sender. Length = n_senders + 1.
    pub row_ptr: Vec<u32>,
    /// All synapses, grouped contiguously by sender.
    pub synapses: Vec<Synapse>,
}

impl SynapseStore {
    /// Build CSR from a list of (sender, Synapse) pairs.
    ///
    /// The pairs do NOT need to be sorted. The sort is stable, so synapses of
    /// one sender keep their insertion order. Senders beyond `n_senders` are
    /// dropped.
    pub fn from_edges(n_senders: u32, mut edges: Vec<(u32, Synapse)>) -> Self {
        let n = n_senders as usize;
        edges.retain(|(src, _)| (*src as usize) < n);
        edges.sort_by_key(|(src, _)| *src);

        let mut row_ptr = vec![0u32; n + 1];
        for (src, _) in &edges {
            row_ptr[*src as usize + 1] += 1;
        }
        for i in 1..=n {
            row_ptr[i] += row_ptr[i - 1];
        }

        let synapses = edges.into_iter().map(|(_, syn)| syn).collect();
        Self { row_ptr, synapses }
    }

    /// Range of flat synapse indices owned by `sender`.
    #[inline]
    pub fn row(&self, sender: usize) -> std::ops::Range<usize> {
        self.row_ptr[sender] as usize..self.row_ptr[sender + 1] as usize
    }

    #[inline]
    pub fn outgoing(&self, sender: usize) -> &[Synapse] {
        &self.synapses[self.row(sender)]
    }

    #[inline]
    pub fn total_synapses(&self) -> usize {
        self.synapses.len()
    }

    #[inline]
    pub fn n_senders(&self) -> usize {
        self.row_ptr.len().saturating_sub(1)
    }
}
