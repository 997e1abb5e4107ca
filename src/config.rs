//! Per-invocation configuration for the pipeline.

/// Instructions below this address belong to the bootrom and reset vector.
pub const ADDRESS_FLOOR: u64 = 0x8000_1000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Events with a program counter below this value are discarded.
    pub address_floor: u64,

    /// Explicit upper bound on decode/writeback timestamps.
    /// When `None`, the last timestamp in the branch stream is used.
    pub time_horizon: Option<u64>,
}
impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            address_floor: ADDRESS_FLOOR,
            time_horizon: None,
        }
    }
}
impl PipelineConfig {
    pub fn new() -> Self { Self::default() }

    pub fn with_address_floor(mut self, floor: u64) -> Self {
        self.address_floor = floor;
        self
    }

    pub fn with_time_horizon(mut self, horizon: u64) -> Self {
        self.time_horizon = Some(horizon);
        self
    }

    /// Returns 'true' if some address is in the region of interest.
    pub fn in_range(&self, pc: u64) -> bool {
        pc >= self.address_floor
    }

    /// Pick the horizon used to truncate decode/writeback streams.
    /// An explicit horizon wins over one observed in the branch stream.
    pub fn horizon(&self, observed: Option<u64>) -> Option<u64> {
        self.time_horizon.or(observed)
    }
}
