//! # CoalesceLib
//!
//! Coalescelib is a library for evaluating cache-line replacement policies under
//! coherence pressure
//!
//! It provides a set-associative cache simulator which can be parameterised by a
//! replacement policy, two deterministic baselines (LRU and SRRIP), a learned
//! coherence-aware policy backed by a perceptron weight table, and a workload
//! driver which compares all three over a synthetic trace
//!
//! While designed to accommodate high performance, it prioritises flexibility,
//! being easy to maintain and expand with new policies

/// Contains the cache line representation and the MESI coherence states
pub mod cache;

/// Contains definitions for the JSON configuration format, covering both the
/// cache geometry and the synthetic workload
pub mod config;

/// Contains the signature hash and the perceptron weight table used by the
/// learned policy
pub mod perceptron;

/// Contains the provided replacement policies, with a trait for implementing
/// custom replacement policies
pub mod replacement_policies;

/// Contains the sampled-set tracker which restricts training to a deterministic
/// subset of sets
pub mod sampler;

/// Contains the simulator used to drive a cache configuration over an access
/// stream and collect statistics
pub mod simulator;

/// Contains the synthetic workload generator and the three-policy comparison
/// driver
pub mod workload;
