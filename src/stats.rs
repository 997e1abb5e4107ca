//! Helpers for collecting statistics over a classified decode stream.

use std::collections::*;
use bitvec::prelude::*;
use itertools::*;

use crate::event::*;

/// Container for per-address speculation statistics.
pub struct SpeculationStats {
    /// Per-instruction data (indexed by program counter value).
    pub data: BTreeMap<u64, PcData>,

    /// Number of classified decodes that retired.
    pub global_retired: usize,

    /// Number of classified decodes.
    pub global_decodes: usize,
}
impl SpeculationStats {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            global_retired: 0,
            global_decodes: 0,
        }
    }

    /// Collect statistics from a classified decode stream.
    /// Unclassified decodes are ignored.
    pub fn from_decodes<'a>(decodes: impl IntoIterator<Item = &'a DecodeEvent>)
        -> Self
    {
        let mut res = Self::new();
        for decode in decodes {
            res.update(decode);
        }
        res
    }

    /// Record a single classified decode.
    pub fn update(&mut self, decode: &DecodeEvent) {
        let retired = match decode.retired {
            Some(retired) => retired,
            None => return,
        };
        self.global_decodes += 1;
        if retired { self.global_retired += 1; }

        let data = self.get_mut(decode.pc);
        data.occ += 1;
        data.pat.push(retired);
        if retired { data.retired += 1; }
    }

    /// Return the global speculation rate.
    pub fn speculation_rate(&self) -> f64 {
        if self.global_decodes == 0 {
            return 0.0;
        }
        self.global_speculative() as f64 / self.global_decodes as f64
    }

    /// Return the global count of squashed decodes.
    pub fn global_speculative(&self) -> usize {
        self.global_decodes - self.global_retired
    }

    /// Returns a reference to data collected for a particular address.
    pub fn get(&self, pc: u64) -> Option<&PcData> {
        self.data.get(&pc)
    }

    /// Returns a mutable reference to data collected for a particular
    /// address. Creates a new entry if one doesn't already exist.
    pub fn get_mut(&mut self, pc: u64) -> &mut PcData {
        self.data.entry(pc).or_insert_with(PcData::new)
    }

    /// Returns the number of unique decoded instructions.
    pub fn num_unique(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of instructions that never retired.
    pub fn num_never_retired(&self) -> usize {
        self.data.values().filter(|e| e.is_never_retired()).count()
    }

    /// Returns the number of instructions that were squashed at least once.
    pub fn num_ever_squashed(&self) -> usize {
        self.data.values().filter(|e| e.speculative() != 0).count()
    }

    /// Return at most `n` addresses, ordered by the number of times they
    /// were squashed (most first, lowest address breaking ties).
    pub fn most_speculated(&self, n: usize) -> Vec<(u64, &PcData)> {
        self.data.iter()
            .filter(|(_, s)| s.speculative() != 0)
            .sorted_by(|x, y| {
                y.1.speculative().cmp(&x.1.speculative()).then(x.0.cmp(y.0))
            })
            .take(n)
            .map(|(pc, s)| (*pc, s))
            .collect()
    }
}

/// Container for per-address statistics.
pub struct PcData {
    /// Number of times this instruction was decoded.
    pub occ: usize,

    /// Number of times this instruction retired.
    pub retired: usize,

    /// Record of every classification in decode order ('true' for retired).
    pub pat: BitVec,
}
impl PcData {
    pub fn new() -> Self {
        Self {
            occ: 0,
            retired: 0,
            pat: BitVec::new(),
        }
    }

    /// Number of times this instruction was squashed.
    pub fn speculative(&self) -> usize {
        self.occ - self.retired
    }

    pub fn speculation_rate(&self) -> f64 {
        self.speculative() as f64 / self.occ as f64
    }

    pub fn is_always_retired(&self) -> bool {
        self.pat.count_ones() == self.pat.len()
    }

    pub fn is_never_retired(&self) -> bool {
        self.pat.count_zeros() == self.pat.len()
    }

    /// Length of the longest streak of consecutive squashes.
    pub fn longest_squash_run(&self) -> usize {
        self.pat.iter().by_vals()
            .group_by(|retired| *retired)
            .into_iter()
            .filter(|(retired, _)| !retired)
            .map(|(_, run)| run.count())
            .max()
            .unwrap_or(0)
    }
}
