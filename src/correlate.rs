//! Matching decoded instructions against retired instructions.
//!
//! A decoded instruction retired if some writeback for the same program
//! counter happens strictly later. Each writeback can vouch for exactly one
//! decode, and each decode claims the earliest writeback still available for
//! its address. A loop body decoded `n` times therefore needs `n` writebacks
//! before every iteration counts as retired.
//!
//! Writebacks are grouped into one FIFO per address up front. Decodes are then
//! visited in timestamp order, and each one only ever looks at the head of
//! its own queue. Since decode timestamps never go backwards, a head that is
//! not strictly after the current decode can't match any later decode either
//! and is thrown out for good. Every writeback is touched at most twice.

use std::collections::*;
use tracing::info;

use crate::event::*;

/// Pending writebacks, grouped by program counter and ordered by timestamp.
#[derive(Clone, Debug, Default)]
pub struct WritebackIndex {
    queues: BTreeMap<u64, VecDeque<WritebackEvent>>,
    len: usize,
}
impl WritebackIndex {
    pub fn new(writebacks: impl IntoIterator<Item = WritebackEvent>) -> Self {
        let mut sorted: Vec<WritebackEvent> = writebacks.into_iter().collect();
        sorted.sort_by_key(|w| w.timestamp);

        let mut res = Self::default();
        for wb in sorted {
            res.queues.entry(wb.pc).or_default().push_back(wb);
            res.len += 1;
        }
        res
    }

    /// Number of writebacks still pending across all addresses.
    pub fn len(&self) -> usize { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Number of distinct addresses with at least one pending writeback.
    pub fn num_addresses(&self) -> usize {
        self.queues.values().filter(|q| !q.is_empty()).count()
    }

    /// Number of writebacks still pending for a particular address.
    pub fn pending(&self, pc: u64) -> usize {
        self.queues.get(&pc).map_or(0, |q| q.len())
    }

    /// Take the earliest writeback for `pc` that happened strictly after
    /// `after`.
    ///
    /// Writebacks for `pc` at or before `after` are removed from the index
    /// and pushed onto `stale`. Callers must present non-decreasing values
    /// of `after` for any one address.
    pub fn claim(&mut self, pc: u64, after: u64,
        stale: &mut Vec<WritebackEvent>) -> Option<WritebackEvent>
    {
        let queue = self.queues.get_mut(&pc)?;
        while let Some(head) = queue.front() {
            if head.timestamp > after {
                break;
            }
            stale.push(*head);
            queue.pop_front();
            self.len -= 1;
        }
        let res = queue.pop_front();
        if res.is_some() {
            self.len -= 1;
        }
        res
    }

    /// Consume the index, returning every pending writeback in timestamp
    /// order.
    pub fn into_pending(self) -> Vec<WritebackEvent> {
        let mut res: Vec<WritebackEvent> = self.queues.into_values()
            .flatten()
            .collect();
        res.sort_by_key(|w| w.timestamp);
        res
    }
}

/// A decode paired with the writeback that proves it retired.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Match {
    /// Index into [Correlation::decodes].
    pub decode: usize,
    pub writeback: WritebackEvent,
}

/// The result of correlating a decode stream with a writeback stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Correlation {
    /// Every decode, in timestamp order, with `retired` set.
    pub decodes: Vec<DecodeEvent>,

    /// Decode/writeback pairs, in the order they were made.
    pub matches: Vec<Match>,

    /// Writebacks that never matched a decode, in timestamp order.
    pub orphans: Vec<WritebackEvent>,
}
impl Correlation {
    pub fn num_decodes(&self) -> usize { self.decodes.len() }

    pub fn num_retired(&self) -> usize {
        self.decodes.iter().filter(|d| d.is_retired()).count()
    }

    pub fn num_speculative(&self) -> usize {
        self.decodes.iter().filter(|d| d.is_speculative()).count()
    }

    /// Fraction of decoded instructions that never retired.
    pub fn speculation_rate(&self) -> f64 {
        if self.decodes.is_empty() {
            return 0.0;
        }
        self.num_speculative() as f64 / self.decodes.len() as f64
    }

    /// Return the decode and writeback making up some [Match].
    pub fn pair<'a>(&'a self, m: &'a Match) -> (&'a DecodeEvent, &'a WritebackEvent) {
        (&self.decodes[m.decode], &m.writeback)
    }
}

/// Classify every decode as retired or speculative.
///
/// Decodes are stably sorted by timestamp before matching, so decodes that
/// share a timestamp are served in input order: for two decodes of the same
/// instruction in the same cycle, the first one listed gets the earlier
/// writeback. Decodes that already carry a classification keep it and don't
/// claim a writeback.
pub fn correlate(
    decodes: impl IntoIterator<Item = DecodeEvent>,
    writebacks: impl IntoIterator<Item = WritebackEvent>,
) -> Correlation
{
    let mut decodes: Vec<DecodeEvent> = decodes.into_iter().collect();
    decodes.sort_by_key(|d| d.timestamp);

    let mut index = WritebackIndex::new(writebacks);
    let num_writebacks = index.len();

    let mut matches = Vec::new();
    let mut orphans = Vec::new();
    for (idx, decode) in decodes.iter_mut().enumerate() {
        if decode.is_classified() {
            continue;
        }
        match index.claim(decode.pc, decode.timestamp, &mut orphans) {
            Some(writeback) => {
                decode.classify(true);
                matches.push(Match { decode: idx, writeback });
            },
            None => {
                decode.classify(false);
            },
        }
    }

    orphans.extend(index.into_pending());
    orphans.sort_by_key(|w| w.timestamp);

    let res = Correlation { decodes, matches, orphans };
    info!(
        decodes = res.num_decodes(),
        writebacks = num_writebacks,
        retired = res.num_retired(),
        speculative = res.num_speculative(),
        orphans = res.orphans.len(),
        "correlated streams"
    );
    res
}

#[cfg(test)]
mod test {
    use super::*;

    const A: u64 = 0x8000_1010;
    const B: u64 = 0x8000_1014;

    fn d(timestamp: u64, pc: u64) -> DecodeEvent { DecodeEvent::new(timestamp, pc) }
    fn w(timestamp: u64, pc: u64) -> WritebackEvent { WritebackEvent::new(timestamp, pc) }

    fn classes(c: &Correlation) -> Vec<Option<bool>> {
        c.decodes.iter().map(|d| d.retired).collect()
    }

    #[test]
    fn later_writeback_retires() {
        let c = correlate(vec![d(10, A)], vec![w(15, A)]);
        assert_eq!(classes(&c), vec![Some(true)]);
        assert_eq!(c.matches, vec![Match { decode: 0, writeback: w(15, A) }]);
        assert!(c.orphans.is_empty());
    }

    #[test]
    fn earlier_writeback_is_stale() {
        let c = correlate(vec![d(10, A)], vec![w(5, A)]);
        assert_eq!(classes(&c), vec![Some(false)]);
        assert!(c.matches.is_empty());
        assert_eq!(c.orphans, vec![w(5, A)]);
    }

    #[test]
    fn same_cycle_never_matches() {
        let c = correlate(vec![d(10, A)], vec![w(10, A), w(10, A)]);
        assert_eq!(classes(&c), vec![Some(false)]);
        assert_eq!(c.orphans.len(), 2);
    }

    #[test]
    fn one_writeback_one_decode() {
        let c = correlate(vec![d(1, A), d(2, A)], vec![w(3, A)]);
        assert_eq!(classes(&c), vec![Some(true), Some(false)]);
        assert_eq!(c.pair(&c.matches[0]), (&c.decodes[0], &w(3, A)));
    }

    #[test]
    fn pair_outlives_match_borrow() {
        let c = correlate(vec![d(1, A), d(2, B)], vec![w(4, B), w(3, A)]);
        let pairs: Vec<(&DecodeEvent, &WritebackEvent)> = c.matches.iter()
            .map(|m| c.pair(m))
            .collect();
        assert_eq!(pairs, vec![(&c.decodes[0], &w(3, A)), (&c.decodes[1], &w(4, B))]);
    }

    #[test]
    fn loop_body_pairs_in_order() {
        let decodes = vec![d(1, A), d(4, A), d(7, A)];
        let wbs = vec![w(3, A), w(6, A), w(9, A)];
        let c = correlate(decodes, wbs);
        assert_eq!(classes(&c), vec![Some(true); 3]);
        let ts: Vec<u64> = c.matches.iter().map(|m| m.writeback.timestamp).collect();
        assert_eq!(ts, vec![3, 6, 9]);
    }

    #[test]
    fn nearest_forward_writeback_wins() {
        // Writebacks listed out of order still pair nearest-first.
        let c = correlate(vec![d(5, A), d(7, A)], vec![w(8, A), w(6, A)]);
        let ts: Vec<u64> = c.matches.iter().map(|m| m.writeback.timestamp).collect();
        assert_eq!(ts, vec![6, 8]);
    }

    #[test]
    fn addresses_are_independent() {
        let c = correlate(vec![d(1, A), d(2, B)], vec![w(3, B), w(4, A)]);
        assert_eq!(classes(&c), vec![Some(true), Some(true)]);
        assert_eq!(c.matches[0].writeback, w(4, A));
        assert_eq!(c.matches[1].writeback, w(3, B));
    }

    #[test]
    fn same_cycle_decodes_use_input_order() {
        // Two decodes of A in cycle 2; the first listed gets the writeback.
        let c = correlate(
            vec![DecodeEvent { timestamp: 2, pc: A, retired: None },
                 DecodeEvent { timestamp: 2, pc: A, retired: None },
                 d(1, B)],
            vec![w(3, A)],
        );
        assert_eq!(c.decodes[0].pc, B);
        assert_eq!(classes(&c), vec![Some(false), Some(true), Some(false)]);
        assert_eq!(c.matches, vec![Match { decode: 1, writeback: w(3, A) }]);
    }

    #[test]
    fn leftovers_are_orphans() {
        let c = correlate(vec![d(5, A)], vec![w(9, A), w(1, A), w(7, B), w(6, A)]);
        assert_eq!(c.matches[0].writeback, w(6, A));
        assert_eq!(c.orphans, vec![w(1, A), w(7, B), w(9, A)]);
    }

    #[test]
    fn empty_streams() {
        let c = correlate(Vec::new(), vec![w(1, A)]);
        assert!(c.decodes.is_empty());
        assert_eq!(c.orphans, vec![w(1, A)]);
        assert_eq!(c.speculation_rate(), 0.0);

        let c = correlate(vec![d(1, A), d(2, B)], Vec::new());
        assert_eq!(classes(&c), vec![Some(false), Some(false)]);
        assert_eq!(c.speculation_rate(), 1.0);
    }

    #[test]
    fn rerun_is_a_no_op() {
        let decodes = vec![d(1, A), d(2, A), d(2, B), d(4, A)];
        let wbs = vec![w(3, A), w(3, B), w(5, A)];
        let first = correlate(decodes.clone(), wbs.clone());
        let again = correlate(decodes, wbs.clone());
        assert_eq!(first, again);

        let rerun = correlate(first.decodes.clone(), wbs);
        assert_eq!(rerun.decodes, first.decodes);
        assert!(rerun.matches.is_empty());
    }

    #[test]
    fn classified_decodes_are_kept() {
        let mut pre = d(1, A);
        pre.classify(false);
        let c = correlate(vec![pre, d(2, A)], vec![w(3, A)]);
        assert_eq!(classes(&c), vec![Some(false), Some(true)]);
        assert_eq!(c.matches[0].decode, 1);
    }

    #[test]
    fn index_bookkeeping() {
        let mut idx = WritebackIndex::new(vec![w(1, A), w(5, A), w(2, B)]);
        assert_eq!(idx.len(), 3);
        assert_eq!(idx.num_addresses(), 2);
        assert_eq!(idx.pending(A), 2);

        let mut stale = Vec::new();
        assert_eq!(idx.claim(A, 3, &mut stale), Some(w(5, A)));
        assert_eq!(stale, vec![w(1, A)]);
        assert_eq!(idx.claim(A, 6, &mut stale), None);
        assert_eq!(idx.claim(0x8000_2000, 0, &mut stale), None);
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.num_addresses(), 1);
        assert_eq!(idx.into_pending(), vec![w(2, B)]);
    }
}
