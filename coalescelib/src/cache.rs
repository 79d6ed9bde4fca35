use serde::{Deserialize, Serialize};

/// MESI coherence state of a resident line
///
/// The discriminant values are mixed into the signature hash, so differing
/// states land in different weight-table regions with high probability
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MesiState {
    #[default]
    Invalid = 0,
    Shared = 1,
    Exclusive = 2,
    Modified = 3,
}

/// One cache slot
///
/// Owned exclusively by the set it belongs to. Lines are created invalid at
/// construction, overwritten wholesale on a miss install, and never partially
/// mutated. Recency and re-reference metadata live inside the policies rather
/// than on the line, so the line itself is policy-neutral
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CacheLine {
    pub valid: bool,
    /// Address identity, compared during lookup. The full address is used as
    /// the tag; set selection already ignores the line-offset bits
    pub tag: u64,
    /// Instruction address that installed the line, the PC half of its signature
    pub pc: u64,
    /// Number of cores holding a copy, a proxy for invalidation cost on eviction
    pub sharers: u32,
    pub state: MesiState,
}

/// A single memory access in a trace: the address plus the signature of the
/// requesting instruction
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Access {
    pub addr: u64,
    pub pc: u64,
    pub sharers: u32,
    pub state: MesiState,
}
