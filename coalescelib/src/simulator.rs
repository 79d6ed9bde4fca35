use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::{CacheLine, MesiState};
use crate::config::{CacheConfig, ConfigError};
use crate::replacement_policies::ReplacementPolicy;

/// Byte offset bits stripped from an address before set selection
const LINE_OFFSET_BITS: u32 = 6;

/// A set-associative cache simulator, parameterised by a replacement policy
///
/// The general approach here is to have one solid implementation which is easy
/// to maintain and expand with more replacement policies without compromising
/// too much on performance. We rely on Rust's monomorphisation and the
/// inlining of the policy functions, which should be close to on par with
/// writing specialised implementations for each policy
///
/// Every access is processed to completion before the next is issued; the
/// simulator is strictly sequential and keeps no asynchronous state
pub struct Simulator<P: ReplacementPolicy> {
    lines: Vec<CacheLine>,
    policy: P,
    num_sets: usize,
    ways: usize,
    stats: CacheStats,
}

/// Monotonic counters for one simulator instance. Reset only by constructing a
/// new instance
#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Hits on lines that were Modified or held by more than one core, a proxy
    /// for avoided coherence transactions
    pub coherence_wins: u64,
}

impl CacheStats {
    /// Hit rate over all accesses so far, or `None` before any access has been
    /// issued. Guarding the zero-access case here keeps division by zero out
    /// of every report path
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        if total == 0 {
            None
        } else {
            Some(self.hits as f64 / total as f64)
        }
    }
}

/// The result for one policy run. Can be serialised to the report output format
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct PolicyReport {
    pub name: String,
    pub stats: CacheStats,
}

impl fmt::Display for PolicyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stats.hit_rate() {
            Some(rate) => write!(
                f,
                "{:<15} | Hit Rate: {:.2}% | Coherence Wins: {}",
                self.name,
                rate * 100.0,
                self.stats.coherence_wins
            ),
            None => write!(
                f,
                "{:<15} | Hit Rate: no data | Coherence Wins: {}",
                self.name, self.stats.coherence_wins
            ),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A policy broke its contract. Treated as fatal rather than clamped;
    /// silent clamping would corrupt eviction statistics
    #[error("policy returned victim way {way} outside 0..{ways} for set {set}")]
    VictimOutOfRange { set: usize, way: usize, ways: usize },
}

impl<P: ReplacementPolicy> Simulator<P> {
    /// Creates a simulator for a given geometry, with all lines invalid
    ///
    /// Fails fast on a degenerate configuration; no state is allocated first
    pub fn new(config: &CacheConfig, policy: P) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            lines: vec![CacheLine::default(); config.total_lines()],
            policy,
            num_sets: config.num_sets,
            ways: config.ways_per_set,
            stats: CacheStats::default(),
        })
    }

    /// Maps an address to its set index. Fixed for the simulator's lifetime
    fn set_index(&self, addr: u64) -> usize {
        ((addr >> LINE_OFFSET_BITS) % self.num_sets as u64) as usize
    }

    /// Issues one access and resolves it to completion
    ///
    /// On a hit the policy's bookkeeping runs and the coherence-win counter is
    /// bumped when the hit avoided a costly transaction (line Modified, or
    /// held by more than one core). On a miss the policy picks a victim way,
    /// which is overwritten wholesale with the incoming line
    ///
    /// returns: Ok(true) on a hit, Ok(false) on a miss
    pub fn access(
        &mut self,
        addr: u64,
        pc: u64,
        sharers: u32,
        state: MesiState,
    ) -> Result<bool, SimulationError> {
        let set = self.set_index(addr);
        let base = set * self.ways;
        let tag = addr;
        // Only search the relevant set
        for w in 0..self.ways {
            let line = self.lines[base + w];
            if line.valid && line.tag == tag {
                self.stats.hits += 1;
                self.policy.update_on_hit(set, w, &line);
                if line.state == MesiState::Modified || line.sharers > 1 {
                    self.stats.coherence_wins += 1;
                }
                return Ok(true);
            }
        }
        self.stats.misses += 1;
        let victim = self
            .policy
            .find_victim(set, &self.lines[base..base + self.ways], pc, sharers, state);
        if victim >= self.ways {
            return Err(SimulationError::VictimOutOfRange {
                set,
                way: victim,
                ways: self.ways,
            });
        }
        self.lines[base + victim] = CacheLine {
            valid: true,
            tag,
            pc,
            sharers,
            state,
        };
        self.policy.update_on_miss(set, victim);
        Ok(false)
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Snapshot of one set's lines, indexed by way
    pub fn set_lines(&self, set: usize) -> &[CacheLine] {
        let base = set * self.ways;
        &self.lines[base..base + self.ways]
    }

    /// Builds the report row for this run
    pub fn report(&self) -> PolicyReport {
        PolicyReport {
            name: self.policy.name().to_string(),
            stats: self.stats.clone(),
        }
    }
}
