use std::collections::VecDeque;

use crate::cache::MesiState;

/// Diagnostic record of one eviction from a sampled set: the victim's original
/// signature plus the adjusted vote that selected it
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EvictionRecord {
    pub pc: u64,
    pub sharers: u32,
    pub state: MesiState,
    pub vote: i32,
}

/// Tracks which sets bear the cost of training
///
/// Sampling is fixed at construction from a deterministic modulus rule, so a
/// given geometry always trains on the same sets. Sampled sets additionally
/// retain a short ring of recent eviction records for inspection; the ring is
/// diagnostic only and has no effect on victim selection
pub struct SetSampler {
    sampled: Vec<bool>,
    rings: Vec<VecDeque<EvictionRecord>>,
    capacity: usize,
}

impl SetSampler {
    pub fn new(num_sets: usize, sampling_modulus: usize, ring_capacity: usize) -> Self {
        let sampled = (0..num_sets).map(|s| s % sampling_modulus == 0).collect();
        Self {
            sampled,
            rings: vec![VecDeque::with_capacity(ring_capacity); num_sets],
            capacity: ring_capacity,
        }
    }

    pub fn is_sampled(&self, set: usize) -> bool {
        self.sampled[set]
    }

    /// Appends an eviction record to a sampled set's ring, dropping the oldest
    /// entry once the ring is full
    pub fn record_eviction(&mut self, set: usize, record: EvictionRecord) {
        let ring = &mut self.rings[set];
        if ring.len() == self.capacity {
            let _ = ring.pop_front();
        }
        ring.push_back(record);
    }

    /// Recent evictions for a set, oldest first
    pub fn evictions(&self, set: usize) -> impl Iterator<Item = &EvictionRecord> {
        self.rings[set].iter()
    }
}
