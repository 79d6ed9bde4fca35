use serde::Deserialize;
use thiserror::Error;

/// A full comparison configuration: the cache geometry plus the synthetic
/// workload, usually resulting from parsing JSON. Both halves default to the
/// reference values, so an empty object `{}` is a valid configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    pub cache: CacheConfig,
    pub workload: WorkloadConfig,
}

/// Geometry and tuning for a single simulated cache
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub num_sets: usize,
    pub ways_per_set: usize,
    /// Number of perceptron weight entries, shared across all sets
    pub weight_table_size: usize,
    /// A set is sampled when `set % sampling_modulus == 0`
    pub sampling_modulus: usize,
    /// Eviction records retained per sampled set, oldest-first drop
    pub sampler_capacity: usize,
    /// Added to a way's vote when its line is Modified. Deliberately larger
    /// than the typical learned-weight spread: writeback cost acts as a floor
    /// the learner cannot override through ordinary reuse training
    pub modified_bonus: i32,
    /// Sharer count above which the shared bonus applies
    pub sharer_threshold: u32,
    /// Added to a way's vote when its line is held by many cores
    pub shared_bonus: i32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            num_sets: 64,
            ways_per_set: 8,
            weight_table_size: 4096,
            sampling_modulus: 32,
            sampler_capacity: 8,
            modified_bonus: 60,
            sharer_threshold: 2,
            shared_bonus: 30,
        }
    }
}

impl CacheConfig {
    /// Rejects degenerate geometry before any state is allocated
    ///
    /// There is no default substitution; a non-positive dimension is a caller
    /// bug and the simulation refuses to start
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_sets == 0 {
            return Err(ConfigError::NonPositive("num_sets"));
        }
        if self.ways_per_set == 0 {
            return Err(ConfigError::NonPositive("ways_per_set"));
        }
        if self.weight_table_size == 0 {
            return Err(ConfigError::NonPositive("weight_table_size"));
        }
        if self.sampling_modulus == 0 {
            return Err(ConfigError::NonPositive("sampling_modulus"));
        }
        if self.sampler_capacity == 0 {
            return Err(ConfigError::NonPositive("sampler_capacity"));
        }
        Ok(())
    }

    pub fn total_lines(&self) -> usize {
        self.num_sets * self.ways_per_set
    }
}

/// The replacement policy - lru, srrip, or coalesce
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum PolicyConfig {
    #[serde(alias = "lru")]
    LeastRecentlyUsed,
    #[serde(alias = "srrip")]
    ReReferenceInterval,
    #[serde(alias = "coalesce")]
    CoherenceAware,
}

impl PolicyConfig {
    /// All policies, in the order the comparison report lists them
    pub const ALL: [PolicyConfig; 3] = [
        PolicyConfig::LeastRecentlyUsed,
        PolicyConfig::ReReferenceInterval,
        PolicyConfig::CoherenceAware,
    ];
}

/// Shape of the two-phase synthetic trace
///
/// Each epoch issues a scanner phase (strictly increasing fresh addresses,
/// never expected to be reused) followed by a hot-line ping-pong phase
/// (cyclic accesses to a small address range, coherence-expensive to evict)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    pub epochs: usize,
    /// Scanner accesses per epoch
    pub scan_length: usize,
    /// Address offset between consecutive epochs' scan windows
    pub scan_stride: u64,
    /// Upper bound on per-access random address perturbation in the scanner
    /// phase. Zero (the default) makes the trace fully deterministic
    pub scan_jitter: u64,
    /// First scanner address
    pub scan_base: u64,
    pub scanner_pc: u64,
    /// Number of distinct hot addresses
    pub hot_lines: u64,
    /// Hot-phase accesses per epoch
    pub hot_repeats: usize,
    pub hot_pc: u64,
    pub hot_sharers: u32,
    /// Seed for the workload's explicitly seeded generator
    pub seed: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            scan_length: 600,
            scan_stride: 100,
            scan_jitter: 0,
            scan_base: 1000,
            scanner_pc: 0xBAD,
            hot_lines: 16,
            hot_repeats: 400,
            hot_pc: 0xF00D,
            hot_sharers: 4,
            seed: 0,
        }
    }
}

impl WorkloadConfig {
    /// Rejects a workload that cannot be generated, before any trace is built
    ///
    /// A hot phase of zero distinct addresses has no cyclic access to issue;
    /// it is only acceptable when the hot phase is empty altogether
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hot_repeats > 0 && self.hot_lines == 0 {
            return Err(ConfigError::NonPositive("hot_lines"));
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("configuration field {0} must be positive")]
    NonPositive(&'static str),
}
