//! Views handed to plotting/reporting tools.

use std::io::Write;
use itertools::*;

use crate::event::*;

/// The classified decode stream split into retired and speculative points,
/// alongside the branch stream. All views are ordered by timestamp.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Projection {
    /// Decoded instructions that retired.
    pub retired: Vec<TracePoint>,

    /// Decoded instructions that were squashed.
    pub speculative: Vec<TracePoint>,

    pub branches: Vec<BranchEvent>,
}

impl Projection {
    /// Split classified decodes. Unclassified decodes appear in neither view.
    pub fn new(decodes: &[DecodeEvent], branches: Vec<BranchEvent>) -> Self {
        let (retired, speculative): (Vec<TracePoint>, Vec<TracePoint>) = decodes.iter()
            .filter(|d| d.is_classified())
            .partition_map(|d| {
                if d.is_retired() {
                    Either::Left(d.point())
                } else {
                    Either::Right(d.point())
                }
            });
        let branches = branches.into_iter()
            .sorted_by_key(|b| b.timestamp)
            .collect();

        Self {
            retired: Self::ordered(retired),
            speculative: Self::ordered(speculative),
            branches,
        }
    }

    fn ordered(mut pts: Vec<TracePoint>) -> Vec<TracePoint> {
        pts.sort_by_key(|p| p.timestamp);
        pts
    }

    /// Conditional branches that were taken.
    pub fn taken(&self) -> Vec<TracePoint> {
        self.branch_points(BranchEvent::is_taken_branch)
    }

    /// Conditional branches that were not taken.
    pub fn not_taken(&self) -> Vec<TracePoint> {
        self.branch_points(BranchEvent::is_not_taken_branch)
    }

    /// Unconditional jumps.
    pub fn jumps(&self) -> Vec<TracePoint> {
        self.branch_points(|b| b.is_jump)
    }

    fn branch_points(&self, f: impl Fn(&BranchEvent) -> bool) -> Vec<TracePoint> {
        self.branches.iter().filter(|&b| f(b)).map(|b| b.point()).collect()
    }

    /// Write one view as `timestamp,pc` rows (both in hex).
    pub fn write_points(points: &[TracePoint], mut w: impl Write)
        -> std::io::Result<()>
    {
        for p in points {
            writeln!(w, "{}", p)?;
        }
        Ok(())
    }
}
