use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::cache::{CacheLine, MesiState};
use crate::config::{CacheConfig, PolicyConfig};
use crate::perceptron::PerceptronBrain;
use crate::sampler::{EvictionRecord, SetSampler};

/// A generic trait for implementing new replacement policies. Can be used to
/// parameterise a Simulator.
pub trait ReplacementPolicy {
    /// Updates the policy when a line is hit
    ///
    /// Called exactly once per hit, before the line is reused. Must not change
    /// which line is hit, only bookkeeping, and for learned policies, training.
    /// `line` is the resident line's state, carrying the signature that
    /// originally installed it
    ///
    /// Not applicable for some policies, a default which does nothing is provided
    fn update_on_hit(&mut self, _set: usize, _way: usize, _line: &CacheLine) {}

    /// Updates the policy after a new line has been installed into `way` on a
    /// miss
    ///
    /// Not applicable for some policies, a default which does nothing is provided
    fn update_on_miss(&mut self, _set: usize, _way: usize) {}

    /// Used by the simulator to pick the way to overwrite when a miss needs a
    /// slot
    ///
    /// Implementations must return an invalid way if one exists, regardless of
    /// the eviction heuristic, and must return an index within `0..lines.len()`.
    /// The returned index is a commitment; the simulator overwrites that way
    /// unconditionally
    ///
    /// # Arguments
    ///
    /// * `set`: The cache set being filled
    /// * `lines`: The set's current lines, indexed by way
    /// * `pc`, `sharers`, `state`: The signature of the incoming access
    ///
    /// returns: usize
    fn find_victim(
        &mut self,
        set: usize,
        lines: &[CacheLine],
        pc: u64,
        sharers: u32,
        state: MesiState,
    ) -> usize;

    /// Human-readable policy name used in reports
    fn name(&self) -> &'static str;
}

/// Least Recently Used replacement policy
///
/// Keeps a per-set permutation of rank values 0..ways, 0 being most recently
/// used. Touching a way re-inserts it at rank 0 and shifts every way that was
/// more recent down by one, so ranks always remain a permutation and the
/// victim (rank ways-1) is unique
pub struct LeastRecentlyUsed {
    // Flat num_sets * ways, rank of each way within its set. Full-width so
    // the permutation holds for any associativity the configuration allows
    ranks: Vec<usize>,
    ways: usize,
}

impl LeastRecentlyUsed {
    pub fn new(num_sets: usize, ways: usize) -> Self {
        let mut ranks = vec![0; num_sets * ways];
        for set in 0..num_sets {
            for w in 0..ways {
                ranks[set * ways + w] = w;
            }
        }
        Self { ranks, ways }
    }

    fn promote(&mut self, set: usize, way: usize) {
        let base = set * self.ways;
        let old = self.ranks[base + way];
        for w in 0..self.ways {
            if self.ranks[base + w] < old {
                self.ranks[base + w] += 1;
            }
        }
        self.ranks[base + way] = 0;
    }

    #[cfg(test)]
    pub(crate) fn rank(&self, set: usize, way: usize) -> usize {
        self.ranks[set * self.ways + way]
    }
}

impl ReplacementPolicy for LeastRecentlyUsed {
    fn update_on_hit(&mut self, set: usize, way: usize, _line: &CacheLine) {
        self.promote(set, way);
    }

    fn update_on_miss(&mut self, set: usize, way: usize) {
        self.promote(set, way);
    }

    fn find_victim(
        &mut self,
        set: usize,
        lines: &[CacheLine],
        _pc: u64,
        _sharers: u32,
        _state: MesiState,
    ) -> usize {
        if let Some(w) = lines.iter().position(|l| !l.valid) {
            return w;
        }
        let base = set * self.ways;
        // Ranks form a permutation, exactly one way holds the maximum
        (0..self.ways)
            .find(|&w| self.ranks[base + w] == self.ways - 1)
            .unwrap_or(0)
    }

    fn name(&self) -> &'static str {
        "LRU"
    }
}

/// Static Re-Reference Interval Prediction replacement policy
///
/// Keeps a 2-bit re-reference value per way: 0 means immediate re-reference
/// expected, 3 means distant. Hits promote to 0; fresh installs start at 2
/// rather than 3, protecting newly inserted lines slightly more than long-idle
/// ones
pub struct ReReferenceInterval {
    rrpv: Vec<u8>,
    ways: usize,
}

const RRPV_DISTANT: u8 = 3;
const RRPV_LONG: u8 = 2;

impl ReReferenceInterval {
    pub fn new(num_sets: usize, ways: usize) -> Self {
        Self {
            rrpv: vec![RRPV_DISTANT; num_sets * ways],
            ways,
        }
    }

    #[cfg(test)]
    pub(crate) fn rrpv(&self, set: usize, way: usize) -> u8 {
        self.rrpv[set * self.ways + way]
    }
}

impl ReplacementPolicy for ReReferenceInterval {
    fn update_on_hit(&mut self, set: usize, way: usize, _line: &CacheLine) {
        self.rrpv[set * self.ways + way] = 0;
    }

    fn update_on_miss(&mut self, set: usize, way: usize) {
        self.rrpv[set * self.ways + way] = RRPV_LONG;
    }

    fn find_victim(
        &mut self,
        set: usize,
        lines: &[CacheLine],
        _pc: u64,
        _sharers: u32,
        _state: MesiState,
    ) -> usize {
        if let Some(w) = lines.iter().position(|l| !l.valid) {
            return w;
        }
        let base = set * self.ways;
        // Scan for a distant way; if none, age every way and rescan. At least
        // one way reaches 3 within (3 - min rrpv) iterations, so this terminates
        loop {
            for w in 0..self.ways {
                if self.rrpv[base + w] == RRPV_DISTANT {
                    return w;
                }
            }
            for w in 0..self.ways {
                if self.rrpv[base + w] < RRPV_DISTANT {
                    self.rrpv[base + w] += 1;
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "SRRIP"
    }
}

/// The coherence-aware learned replacement policy
///
/// Each occupied way on a miss is scored by the perceptron's reuse prediction
/// for the signature that installed it, then adjusted upward when evicting the
/// line would be coherence-expensive: a large bonus for Modified lines (costly
/// writeback) and a smaller one for widely shared lines (costly invalidation
/// broadcast). The minimum adjusted vote is evicted, lowest way index winning
/// ties
///
/// Training happens only on sampled sets: hits reward the hit line's own
/// signature, evictions punish the victim's
pub struct CoherenceAware {
    brain: Rc<RefCell<PerceptronBrain>>,
    sampler: SetSampler,
    modified_bonus: i32,
    sharer_threshold: u32,
    shared_bonus: i32,
}

impl CoherenceAware {
    /// Creates the policy with a brain of its own, the canonical arrangement
    pub fn new(config: &CacheConfig) -> Self {
        let brain = Rc::new(RefCell::new(PerceptronBrain::new(config.weight_table_size)));
        Self::with_brain(config, brain)
    }

    /// Creates the policy around an existing brain, allowing a driver to keep
    /// a handle on the weight table or evaluate one brain across runs. The
    /// weight table is not designed for concurrent mutation; the handle must
    /// stay on one thread
    pub fn with_brain(config: &CacheConfig, brain: Rc<RefCell<PerceptronBrain>>) -> Self {
        Self {
            brain,
            sampler: SetSampler::new(
                config.num_sets,
                config.sampling_modulus,
                config.sampler_capacity,
            ),
            modified_bonus: config.modified_bonus,
            sharer_threshold: config.sharer_threshold,
            shared_bonus: config.shared_bonus,
        }
    }

    pub fn brain(&self) -> Rc<RefCell<PerceptronBrain>> {
        Rc::clone(&self.brain)
    }

    pub fn sampler(&self) -> &SetSampler {
        &self.sampler
    }

    /// Reuse prediction plus the coherence-cost adjustments
    fn vote(&self, brain: &PerceptronBrain, line: &CacheLine) -> i32 {
        let mut vote = brain.predict(line.pc, line.sharers, line.state);
        if line.state == MesiState::Modified {
            vote += self.modified_bonus;
        }
        if line.sharers > self.sharer_threshold {
            vote += self.shared_bonus;
        }
        vote
    }
}

impl ReplacementPolicy for CoherenceAware {
    fn update_on_hit(&mut self, set: usize, _way: usize, line: &CacheLine) {
        // Reward reuse with the signature that installed the line, not the
        // incoming access's signature
        if self.sampler.is_sampled(set) {
            self.brain
                .borrow_mut()
                .train(line.pc, line.sharers, line.state, true);
        }
    }

    // Bookkeeping for a miss already happened in find_victim; the learned
    // policy keeps no per-way recency or interval metadata

    fn find_victim(
        &mut self,
        set: usize,
        lines: &[CacheLine],
        _pc: u64,
        _sharers: u32,
        _state: MesiState,
    ) -> usize {
        // Empty slots are free, no scoring or training
        if let Some(w) = lines.iter().position(|l| !l.valid) {
            return w;
        }
        let mut victim = 0;
        let mut min_vote = i32::MAX;
        {
            let brain = self.brain.borrow();
            for (w, line) in lines.iter().enumerate() {
                let vote = self.vote(&brain, line);
                if vote < min_vote {
                    min_vote = vote;
                    victim = w;
                }
            }
        }
        if self.sampler.is_sampled(set) {
            let line = &lines[victim];
            debug!(
                "set {set}: evicting way {victim} (pc {:#x}, sharers {}, {:?}) with vote {min_vote}",
                line.pc, line.sharers, line.state
            );
            self.sampler.record_eviction(
                set,
                EvictionRecord {
                    pc: line.pc,
                    sharers: line.sharers,
                    state: line.state,
                    vote: min_vote,
                },
            );
            // Evicting it is an implicit judgment that it was not worth keeping
            self.brain
                .borrow_mut()
                .train(line.pc, line.sharers, line.state, false);
        }
        victim
    }

    fn name(&self) -> &'static str {
        "COALESCE"
    }
}

/// Enum for the three policies provided by the library
///
/// Using trait objects in Rust reduces boilerplate, but it is completely
/// opaque to the compiler, and we would be de-referencing on every access in
/// the trace. Explicitly branching on all implementations lets the compiler
/// reason about the concrete types, perform function inlining etc
pub enum GenericPolicy {
    LeastRecentlyUsed(LeastRecentlyUsed),
    ReReferenceInterval(ReReferenceInterval),
    CoherenceAware(CoherenceAware),
}

impl GenericPolicy {
    /// Builds the configured policy variant for a given cache geometry
    pub fn from_config(kind: PolicyConfig, config: &CacheConfig) -> Self {
        match kind {
            PolicyConfig::LeastRecentlyUsed => Self::from(LeastRecentlyUsed::new(
                config.num_sets,
                config.ways_per_set,
            )),
            PolicyConfig::ReReferenceInterval => Self::from(ReReferenceInterval::new(
                config.num_sets,
                config.ways_per_set,
            )),
            PolicyConfig::CoherenceAware => Self::from(CoherenceAware::new(config)),
        }
    }
}

impl From<LeastRecentlyUsed> for GenericPolicy {
    fn from(value: LeastRecentlyUsed) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<ReReferenceInterval> for GenericPolicy {
    fn from(value: ReReferenceInterval) -> Self {
        Self::ReReferenceInterval(value)
    }
}

impl From<CoherenceAware> for GenericPolicy {
    fn from(value: CoherenceAware) -> Self {
        Self::CoherenceAware(value)
    }
}

impl ReplacementPolicy for GenericPolicy {
    fn update_on_hit(&mut self, set: usize, way: usize, line: &CacheLine) {
        match self {
            GenericPolicy::LeastRecentlyUsed(p) => p.update_on_hit(set, way, line),
            GenericPolicy::ReReferenceInterval(p) => p.update_on_hit(set, way, line),
            GenericPolicy::CoherenceAware(p) => p.update_on_hit(set, way, line),
        }
    }

    fn update_on_miss(&mut self, set: usize, way: usize) {
        match self {
            GenericPolicy::LeastRecentlyUsed(p) => p.update_on_miss(set, way),
            GenericPolicy::ReReferenceInterval(p) => p.update_on_miss(set, way),
            GenericPolicy::CoherenceAware(p) => p.update_on_miss(set, way),
        }
    }

    fn find_victim(
        &mut self,
        set: usize,
        lines: &[CacheLine],
        pc: u64,
        sharers: u32,
        state: MesiState,
    ) -> usize {
        match self {
            GenericPolicy::LeastRecentlyUsed(p) => p.find_victim(set, lines, pc, sharers, state),
            GenericPolicy::ReReferenceInterval(p) => p.find_victim(set, lines, pc, sharers, state),
            GenericPolicy::CoherenceAware(p) => p.find_victim(set, lines, pc, sharers, state),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            GenericPolicy::LeastRecentlyUsed(p) => p.name(),
            GenericPolicy::ReReferenceInterval(p) => p.name(),
            GenericPolicy::CoherenceAware(p) => p.name(),
        }
    }
}
