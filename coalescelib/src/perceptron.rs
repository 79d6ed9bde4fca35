use crate::cache::MesiState;

/// Fixed odd mixing constant, the 32-bit golden ratio
const HASH_MIX: u64 = 0x9e37_79b9;

/// Maps a (pc, sharers, state) signature to a weight-table index
///
/// Pure function: same inputs always produce the same index. Sharer count and
/// coherence state are shifted into disjoint bit ranges before mixing so that
/// accesses differing only in coherence behaviour still land on different
/// weights with high probability
///
/// Collisions are expected and acceptable; they are the mechanism by which
/// unrelated PCs share learned behaviour, not an error
///
/// # Examples
///
/// ```
/// use coalescelib::cache::MesiState;
/// use coalescelib::perceptron::signature_index;
/// let idx = signature_index(0xF00D, 4, MesiState::Modified, 4096);
/// assert!(idx < 4096);
/// assert_eq!(idx, signature_index(0xF00D, 4, MesiState::Modified, 4096));
/// ```
pub fn signature_index(pc: u64, sharers: u32, state: MesiState, table_size: usize) -> usize {
    let mut h = pc;
    h ^= (sharers as u64) << 4;
    h ^= (state as u64) << 8;
    ((h ^ HASH_MIX) % table_size as u64) as usize
}

/// A table of saturating signed weights indexed by hashed signature
///
/// One weight per index, hardware-width `i8`, all zero at construction. The
/// table is the only mutable state shared across sets: every set of the owning
/// policy reads and trains the same weights. There is no reset; weights persist
/// for the lifetime of the brain
pub struct PerceptronBrain {
    weights: Vec<i8>,
}

impl PerceptronBrain {
    /// `table_size` must be positive; the validated simulator path guarantees
    /// this, direct callers must uphold it themselves
    pub fn new(table_size: usize) -> Self {
        debug_assert!(table_size > 0, "weight table must have at least one entry");
        Self {
            weights: vec![0; table_size],
        }
    }

    /// Read-only reuse-confidence score for a signature
    ///
    /// Higher means stronger predicted reuse; a very negative score marks the
    /// signature as predicted-dead. Safe to call repeatedly, no mutation
    pub fn predict(&self, pc: u64, sharers: u32, state: MesiState) -> i32 {
        self.weights[signature_index(pc, sharers, state, self.weights.len())] as i32
    }

    /// Adjusts the weight for a signature toward a training signal
    ///
    /// `positive` is the reward on a confirmed hit; the penalty signal is
    /// applied to eviction victims. Saturates at the `i8` bounds, never wraps
    pub fn train(&mut self, pc: u64, sharers: u32, state: MesiState, positive: bool) {
        let idx = signature_index(pc, sharers, state, self.weights.len());
        let w = &mut self.weights[idx];
        *w = if positive {
            w.saturating_add(1)
        } else {
            w.saturating_sub(1)
        };
    }
}
