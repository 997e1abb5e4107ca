//! Running every stage, from raw log lines to a [Projection].

use std::path::Path;
use tracing::info;

use crate::config::*;
use crate::correlate::*;
use crate::error::*;
use crate::event::*;
use crate::normalize::*;
use crate::parse::*;
use crate::project::*;
use crate::trace::*;

/// Everything produced by one pipeline invocation.
pub struct PipelineOutput {
    pub correlation: Correlation,
    pub projection: Projection,

    /// The horizon used to truncate the decode/writeback streams.
    pub horizon: Option<u64>,

    pub branch_stats: ParseStats,
    pub decode_stats: ParseStats,
    pub writeback_stats: ParseStats,
}

pub struct Pipeline {
    cfg: PipelineConfig,
}
impl Pipeline {
    pub fn new(cfg: PipelineConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &PipelineConfig { &self.cfg }

    /// Run over in-memory lines.
    ///
    /// The decode and writeback streams may come from the same log, in which
    /// case the same lines can be passed twice.
    pub fn run<S: AsRef<str>>(&self,
        branch_lines: impl IntoIterator<Item = S>,
        decode_lines: impl IntoIterator<Item = S>,
        writeback_lines: impl IntoIterator<Item = S>,
    ) -> PipelineOutput
    {
        let floor = self.cfg.address_floor;

        let mut branch_parser = BranchParser::new(branch_lines.into_iter(), floor);
        let branches: Vec<BranchEvent> = branch_parser.by_ref().collect();

        let mut decode_parser = DecodeParser::new(decode_lines.into_iter(), floor);
        let mut writeback_parser = WritebackParser::new(writeback_lines.into_iter(), floor);

        let horizon = self.cfg.horizon(max_timestamp(&branches));
        let (decodes, writebacks) = normalize(
            decode_parser.by_ref(), writeback_parser.by_ref(), horizon
        );

        self.finish(branches, decodes, writebacks, horizon,
            [branch_parser.stats(), decode_parser.stats(), writeback_parser.stats()])
    }

    /// Run over a branch-resolution log and a commit log carrying both the
    /// decode and writeback streams.
    pub fn run_files(&self, branch_log: impl AsRef<Path>,
        commit_log: impl AsRef<Path>) -> Result<PipelineOutput>
    {
        let floor = self.cfg.address_floor;
        let commit_log = commit_log.as_ref();

        let mut branch_parser = BranchParser::new(LogReader::open(branch_log)?, floor);
        let branches: Vec<BranchEvent> = branch_parser.by_ref().collect();
        let branch_stats = branch_parser.stats();
        branch_parser.into_inner().finish()?;
        info!(branches = branches.len(), "parsed branch log");

        // The horizon has to be known before the other streams are truncated.
        let horizon = self.cfg.horizon(max_timestamp(&branches));

        let mut decode_parser = DecodeParser::new(LogReader::open(commit_log)?, floor);
        let decodes = truncate_sorted(decode_parser.by_ref(), horizon);
        let decode_stats = decode_parser.stats();
        decode_parser.into_inner().finish()?;

        let mut writeback_parser = WritebackParser::new(LogReader::open(commit_log)?, floor);
        let writebacks = truncate_sorted(writeback_parser.by_ref(), horizon);
        let writeback_stats = writeback_parser.stats();
        writeback_parser.into_inner().finish()?;

        info!(?horizon, decodes = decodes.len(), writebacks = writebacks.len(),
            "parsed commit log");

        Ok(self.finish(branches, decodes, writebacks, horizon,
            [branch_stats, decode_stats, writeback_stats]))
    }

    fn finish(&self,
        branches: Vec<BranchEvent>,
        decodes: Vec<DecodeEvent>,
        writebacks: Vec<WritebackEvent>,
        horizon: Option<u64>,
        stats: [ParseStats; 3],
    ) -> PipelineOutput
    {
        let correlation = correlate(decodes, writebacks);
        let projection = Projection::new(&correlation.decodes, branches);
        let [branch_stats, decode_stats, writeback_stats] = stats;
        PipelineOutput {
            correlation,
            projection,
            horizon,
            branch_stats,
            decode_stats,
            writeback_stats,
        }
    }
}
impl Default for Pipeline {
    fn default() -> Self { Self::new(PipelineConfig::default()) }
}
