use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cache::{Access, MesiState};
use crate::config::{CacheConfig, PolicyConfig, WorkloadConfig};
use crate::replacement_policies::GenericPolicy;
use crate::simulator::{PolicyReport, SimulationError, Simulator};

/// Builds the two-phase synthetic trace
///
/// Each epoch issues a scanner phase of strictly increasing fresh addresses
/// (one fixed PC, zero sharers, Exclusive; never expected to be reused, pure
/// cache pollution) followed by a hot-line ping-pong phase cycling over a
/// small address range (a different fixed PC, several sharers, Modified;
/// expected to be reused and coherence-expensive to evict)
///
/// The generator is explicitly seeded and passed in, so a given configuration
/// always produces the same trace. Jitter only perturbs scanner addresses and
/// defaults to zero
pub fn generate_trace(config: &WorkloadConfig, rng: &mut StdRng) -> Vec<Access> {
    let mut trace =
        Vec::with_capacity(config.epochs * (config.scan_length + config.hot_repeats));
    for epoch in 0..config.epochs {
        let scan_window = config.scan_base + epoch as u64 * config.scan_stride;
        for i in 0..config.scan_length {
            let jitter = if config.scan_jitter == 0 {
                0
            } else {
                rng.gen_range(0..config.scan_jitter)
            };
            trace.push(Access {
                addr: scan_window + i as u64 + jitter * config.scan_length as u64,
                pc: config.scanner_pc,
                sharers: 0,
                state: MesiState::Exclusive,
            });
        }
        for k in 0..config.hot_repeats {
            trace.push(Access {
                addr: k as u64 % config.hot_lines,
                pc: config.hot_pc,
                sharers: config.hot_sharers,
                state: MesiState::Modified,
            });
        }
    }
    trace
}

/// Runs one policy over a trace on a fresh simulator
pub fn run_policy(
    cache: &CacheConfig,
    kind: PolicyConfig,
    trace: &[Access],
) -> Result<PolicyReport, SimulationError> {
    let policy = GenericPolicy::from_config(kind, cache);
    let mut simulator = Simulator::new(cache, policy)?;
    for access in trace {
        let _ = simulator.access(access.addr, access.pc, access.sharers, access.state)?;
    }
    let report = simulator.report();
    info!("{report}");
    Ok(report)
}

/// Drives all three policies over the same synthetic trace and collects one
/// report per policy, in the order of [`PolicyConfig::ALL`]
///
/// Each policy gets an independently constructed simulator; the learned policy
/// gets a brain of its own, so runs do not contaminate each other
pub fn run_comparison(
    cache: &CacheConfig,
    workload: &WorkloadConfig,
) -> Result<Vec<PolicyReport>, SimulationError> {
    workload.validate()?;
    let mut rng = StdRng::seed_from_u64(workload.seed);
    let trace = generate_trace(workload, &mut rng);
    info!(
        "comparing {} policies over {} accesses",
        PolicyConfig::ALL.len(),
        trace.len()
    );
    PolicyConfig::ALL
        .iter()
        .map(|&kind| run_policy(cache, kind, &trace))
        .collect()
}
