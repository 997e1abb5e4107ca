//! Synthetic pipeline traces with a known set of squashed instructions.

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::event::*;

/// Knobs for [SyntheticTrace::generate].
#[derive(Copy, Clone, Debug)]
pub struct SynthConfig {
    /// Address of the first instruction.
    pub base: u64,

    /// Number of distinct instructions; each one is 4 bytes.
    pub num_pcs: usize,

    /// Number of decoded instructions.
    pub len: usize,

    /// Probability that any decoded instruction is squashed.
    pub squash_prob: f64,

    /// Upper bound on cycles between decode and writeback (at least 1).
    pub max_latency: u64,

    /// Every `branch_stride`-th instruction is a conditional branch.
    pub branch_stride: usize,
}
impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            base: 0x8000_1000,
            num_pcs: 16,
            len: 1024,
            squash_prob: 0.2,
            max_latency: 8,
            branch_stride: 4,
        }
    }
}

/// Decode and writeback streams generated together, plus the branches
/// resolved along the way.
pub struct SyntheticTrace {
    pub decodes: Vec<DecodeEvent>,
    pub writebacks: Vec<WritebackEvent>,
    pub branches: Vec<BranchEvent>,

    /// For each entry in `decodes`, whether it was generated as squashed.
    pub squashed: Vec<bool>,
}

impl SyntheticTrace {
    /// Generate a trace. The same config and seed always produce the same
    /// trace.
    ///
    /// At most one instruction is decoded per cycle. Writebacks happen in
    /// decode order, at least one cycle after the decode.
    pub fn generate(cfg: &SynthConfig, seed: u64) -> Self {
        assert!(cfg.num_pcs > 0 && cfg.max_latency > 0 && cfg.branch_stride > 0);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut res = Self {
            decodes: Vec::with_capacity(cfg.len),
            writebacks: Vec::new(),
            branches: Vec::new(),
            squashed: Vec::with_capacity(cfg.len),
        };

        let mut cycle: u64 = 0;
        let mut last_retire: u64 = 0;
        for _ in 0..cfg.len {
            cycle += rng.gen_range(1..=2u64);
            let idx = rng.gen_range(0..cfg.num_pcs);
            let pc  = cfg.base + 4 * idx as u64;
            let squashed = rng.gen_bool(cfg.squash_prob);

            res.decodes.push(DecodeEvent::new(cycle, pc));
            res.squashed.push(squashed);
            if squashed {
                continue;
            }

            let retire = (cycle + rng.gen_range(1..=cfg.max_latency))
                .max(last_retire);
            last_retire = retire;
            res.writebacks.push(WritebackEvent::new(retire, pc));

            if idx % cfg.branch_stride == 0 {
                res.branches.push(BranchEvent {
                    timestamp: retire,
                    is_branch: true,
                    is_jump: false,
                    taken: rng.gen_bool(0.5),
                    pc,
                });
            }
        }

        // A final jump marks the end of the run.
        let end = cycle.max(last_retire);
        res.branches.push(BranchEvent {
            timestamp: end,
            is_branch: false,
            is_jump: true,
            taken: true,
            pc: cfg.base + 4 * cfg.num_pcs as u64,
        });
        res
    }

    pub fn num_squashed(&self) -> usize {
        self.squashed.iter().filter(|s| **s).count()
    }

    /// Render the branch stream as branch-resolution log lines.
    pub fn branch_log(&self) -> Vec<String> {
        self.branches.iter().map(|b| {
            format!("{:016x} 0 {} {} {} 0 {:016x}",
                b.timestamp, b.taken as u8, b.is_branch as u8, b.is_jump as u8, b.pc)
        }).collect()
    }

    /// Render decodes and writebacks as a single commit log, interleaved by
    /// timestamp.
    pub fn commit_log(&self) -> Vec<String> {
        let mut lines: Vec<(u64, String)> = Vec::new();
        for d in self.decodes.iter() {
            lines.push((d.timestamp, format!("DECODE,{:x},{:x}", d.timestamp, d.pc)));
        }
        for w in self.writebacks.iter() {
            lines.push((w.timestamp,
                format!("0x{:016x} 3 0x{:016x} (0x00000013)", w.timestamp, w.pc)));
        }
        lines.sort_by_key(|(ts, _)| *ts);
        lines.into_iter().map(|(_, line)| line).collect()
    }
}
