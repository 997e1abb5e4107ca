//! Types for representing events recovered from simulator trace logs.

/// Something that happened at a particular cycle and instruction address.
pub trait TraceEvent {
    /// The cycle count at which this event was logged.
    fn timestamp(&self) -> u64;

    /// The program counter value associated with this event.
    fn pc(&self) -> u64;

    /// Return this event as a `(timestamp, pc)` point.
    fn point(&self) -> TracePoint {
        TracePoint { timestamp: self.timestamp(), pc: self.pc() }
    }
}

/// A `(timestamp, pc)` pair, the unit handed to reporting tools.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TracePoint {
    pub timestamp: u64,
    pub pc: u64,
}
impl std::fmt::Display for TracePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:x},{:x}", self.timestamp, self.pc)
    }
}

/// A resolved control-flow instruction from the branch unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BranchEvent {
    pub timestamp: u64,

    /// Set for conditional branches.
    pub is_branch: bool,

    /// Set for `jal` and `jalr`.
    pub is_jump: bool,

    /// The resolved direction.
    pub taken: bool,

    pub pc: u64,
}
impl BranchEvent {
    /// Returns 'true' for a conditional branch that was taken.
    pub fn is_taken_branch(&self) -> bool {
        self.is_branch && self.taken
    }

    /// Returns 'true' for a conditional branch that fell through.
    pub fn is_not_taken_branch(&self) -> bool {
        self.is_branch && !self.taken
    }
}
impl TraceEvent for BranchEvent {
    fn timestamp(&self) -> u64 { self.timestamp }
    fn pc(&self) -> u64 { self.pc }
}

/// An instruction entering the pipeline.
///
/// Whether or not the instruction eventually retired is unknown until the
/// decode stream has been correlated against the writeback stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodeEvent {
    pub timestamp: u64,
    pub pc: u64,

    /// `Some(true)` once matched with a writeback, `Some(false)` when no
    /// writeback could be found.
    pub retired: Option<bool>,
}
impl DecodeEvent {
    pub fn new(timestamp: u64, pc: u64) -> Self {
        Self { timestamp, pc, retired: None }
    }

    /// Record a classification for this instruction.
    ///
    /// The first classification sticks; returns the value that is in effect
    /// afterwards.
    pub fn classify(&mut self, retired: bool) -> bool {
        *self.retired.get_or_insert(retired)
    }

    /// Returns 'true' if this instruction has been classified.
    pub fn is_classified(&self) -> bool {
        self.retired.is_some()
    }

    /// Returns 'true' if this instruction was classified as squashed.
    pub fn is_speculative(&self) -> bool {
        self.retired == Some(false)
    }

    /// Returns 'true' if this instruction was classified as retired.
    pub fn is_retired(&self) -> bool {
        self.retired == Some(true)
    }
}
impl TraceEvent for DecodeEvent {
    fn timestamp(&self) -> u64 { self.timestamp }
    fn pc(&self) -> u64 { self.pc }
}

/// An instruction whose result was committed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WritebackEvent {
    pub timestamp: u64,
    pub pc: u64,
}
impl WritebackEvent {
    pub fn new(timestamp: u64, pc: u64) -> Self {
        Self { timestamp, pc }
    }
}
impl TraceEvent for WritebackEvent {
    fn timestamp(&self) -> u64 { self.timestamp }
    fn pc(&self) -> u64 { self.pc }
}

/// A request observed on the memory interface.
///
/// `address` is a data address, so these events are not subject to the
/// instruction address floor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MemoryEvent {
    pub timestamp: u64,
    pub command: u64,
    pub address: u64,
}
impl TraceEvent for MemoryEvent {
    fn timestamp(&self) -> u64 { self.timestamp }
    fn pc(&self) -> u64 { self.address }
}
