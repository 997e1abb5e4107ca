//! Aligning decode/writeback streams to the branch stream.
//!
//! Simulations stop after some number of resolved branches, so the branch log
//! is always the shortest. Anything decoded or written back after the last
//! resolved branch is noise.

use tracing::info;

use crate::event::*;

/// Return the last timestamp observed in a stream.
pub fn max_timestamp<'a, E: TraceEvent + 'a>(
    events: impl IntoIterator<Item = &'a E>
) -> Option<u64>
{
    events.into_iter().map(|e| e.timestamp()).max()
}

/// Drop events after `horizon` (if any) and stably sort by timestamp.
///
/// Events sharing a timestamp stay in arrival order.
pub fn truncate_sorted<E: TraceEvent>(
    events: impl IntoIterator<Item = E>,
    horizon: Option<u64>,
) -> Vec<E>
{
    let mut res: Vec<E> = events.into_iter()
        .filter(|e| horizon.map_or(true, |h| e.timestamp() <= h))
        .collect();
    res.sort_by_key(|e| e.timestamp());
    res
}

/// Normalize a decode stream and a writeback stream against a common
/// horizon.
pub fn normalize(
    decodes: impl IntoIterator<Item = DecodeEvent>,
    writebacks: impl IntoIterator<Item = WritebackEvent>,
    horizon: Option<u64>,
) -> (Vec<DecodeEvent>, Vec<WritebackEvent>)
{
    let decodes = truncate_sorted(decodes, horizon);
    let writebacks = truncate_sorted(writebacks, horizon);
    info!(?horizon, decodes = decodes.len(), writebacks = writebacks.len(),
        "normalized streams");
    (decodes, writebacks)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn truncates_and_sorts() {
        let wbs = vec![
            WritebackEvent::new(9, 0x8000_1000),
            WritebackEvent::new(3, 0x8000_1004),
            WritebackEvent::new(12, 0x8000_1008),
            WritebackEvent::new(10, 0x8000_100c),
        ];
        let res = truncate_sorted(wbs, Some(10));
        let ts: Vec<u64> = res.iter().map(|e| e.timestamp).collect();
        assert_eq!(ts, vec![3, 9, 10]);
    }

    #[test]
    fn ties_keep_arrival_order() {
        let decodes = vec![
            DecodeEvent::new(5, 0xa),
            DecodeEvent::new(1, 0xb),
            DecodeEvent::new(5, 0xc),
            DecodeEvent::new(5, 0xd),
        ];
        let (d, w) = normalize(decodes, Vec::new(), None);
        let pcs: Vec<u64> = d.iter().map(|e| e.pc).collect();
        assert_eq!(pcs, vec![0xb, 0xa, 0xc, 0xd]);
        assert!(w.is_empty());
    }

    #[test]
    fn horizon_from_branches() {
        let branches = [
            BranchEvent { timestamp: 4, is_branch: true, is_jump: false, taken: false, pc: 1 },
            BranchEvent { timestamp: 8, is_branch: false, is_jump: true, taken: true, pc: 2 },
        ];
        assert_eq!(max_timestamp(&branches), Some(8));
        let empty: [BranchEvent; 0] = [];
        assert_eq!(max_timestamp(&empty), None);
    }
}
