//! Parsers for the text logs dumped by a BOOM simulation.
//!
//! Each log is a stream of lines, and each kind of event is recognized by
//! some marker on the line:
//!
//! - branch resolution: the line starts with a decimal digit
//! - decode: the line contains `DECODE`
//! - writeback: the line starts with `0x`
//! - memory request: the line starts with `MT`
//!
//! Lines that look like they belong to a stream but don't have the right
//! shape are dropped and counted in [ParseStats]. Nothing in here is fatal.

use std::marker::PhantomData;
use tracing::trace;

use crate::event::*;

/// Parse a hexadecimal token, with or without a leading `0x`.
pub fn parse_hex(tok: &str) -> Option<u64> {
    let digits = tok.strip_prefix("0x")
        .or_else(|| tok.strip_prefix("0X"))
        .unwrap_or(tok);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Parse a decimal flag. Anything nonzero is 'true'.
fn parse_flag(tok: &str) -> Option<bool> {
    if tok.is_empty() || !tok.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tok.parse::<u64>().ok().map(|x| x != 0)
}

/// Split a line on commas and/or whitespace.
fn delimited_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
}

/// Selects one of the event streams carried by the logs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Branch,
    Decode,
    Writeback,
    Memory,
}
impl EventKind {
    /// Returns 'true' if a line carries the marker for this kind of event.
    pub fn accepts(&self, line: &str) -> bool {
        match self {
            Self::Branch => line.as_bytes().first()
                .map_or(false, |b| b.is_ascii_digit()),
            Self::Decode => line.contains("DECODE"),
            Self::Writeback => line.starts_with("0x"),
            Self::Memory => line.starts_with("MT"),
        }
    }
}
impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Self::Branch => "branch",
            Self::Decode => "decode",
            Self::Writeback => "writeback",
            Self::Memory => "memory",
        };
        write!(f, "{}", s)
    }
}
impl std::str::FromStr for EventKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "branch" => Ok(Self::Branch),
            "decode" => Ok(Self::Decode),
            "writeback" | "wb" => Ok(Self::Writeback),
            "memory" | "mem" => Ok(Self::Memory),
            _ => Err(format!("unknown event kind '{}'", s)),
        }
    }
}

/// An event that can be recovered from a single log line.
pub trait LogRecord: Sized {
    /// The stream this record belongs to.
    const KIND: EventKind;

    /// Parse the fields of a line that carries the marker for [Self::KIND].
    /// Returns `None` when the line is malformed.
    fn parse_line(line: &str) -> Option<Self>;

    /// The instruction address checked against the address floor, if any.
    fn address(&self) -> Option<u64>;
}

impl LogRecord for BranchEvent {
    const KIND: EventKind = EventKind::Branch;

    /// `tsc _ taken is_br is_jal is_jalr pc`
    fn parse_line(line: &str) -> Option<Self> {
        let f: Vec<&str> = line.split_whitespace().collect();
        if f.len() != 7 {
            return None;
        }
        let timestamp = parse_hex(f[0])?;
        let taken     = parse_flag(f[2])?;
        let is_branch = parse_flag(f[3])?;
        let is_jal    = parse_flag(f[4])?;
        let is_jalr   = parse_flag(f[5])?;
        let pc        = parse_hex(f[6])?;
        Some(Self { timestamp, is_branch, is_jump: is_jal | is_jalr, taken, pc })
    }

    fn address(&self) -> Option<u64> { Some(self.pc) }
}

impl LogRecord for DecodeEvent {
    const KIND: EventKind = EventKind::Decode;

    /// `DECODE,tsc,pc`
    fn parse_line(line: &str) -> Option<Self> {
        let f: Vec<&str> = delimited_fields(line).collect();
        if f.len() != 3 {
            return None;
        }
        Some(Self::new(parse_hex(f[1])?, parse_hex(f[2])?))
    }

    fn address(&self) -> Option<u64> { Some(self.pc) }
}

impl LogRecord for WritebackEvent {
    const KIND: EventKind = EventKind::Writeback;

    /// `tsc _ pc ...`
    fn parse_line(line: &str) -> Option<Self> {
        let mut f = delimited_fields(line);
        let timestamp = parse_hex(f.next()?)?;
        let _ = f.next()?;
        let pc = parse_hex(f.next()?)?;
        Some(Self::new(timestamp, pc))
    }

    fn address(&self) -> Option<u64> { Some(self.pc) }
}

impl LogRecord for MemoryEvent {
    const KIND: EventKind = EventKind::Memory;

    /// `MT tsc cmd _ _ addr ...`
    fn parse_line(line: &str) -> Option<Self> {
        let f: Vec<&str> = line.split_whitespace().collect();
        if f.len() < 6 {
            return None;
        }
        Some(Self {
            timestamp: parse_hex(f[1])?,
            command: parse_hex(f[2])?,
            address: parse_hex(f[5])?,
        })
    }

    fn address(&self) -> Option<u64> { None }
}

/// Counters describing what happened to each line a parser has seen.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Total number of lines read.
    pub lines: usize,

    /// Lines that became events.
    pub accepted: usize,

    /// Lines with the right marker but a bad field count or bad field.
    pub malformed: usize,

    /// Well-formed events discarded by the address floor.
    pub below_floor: usize,

    /// Lines belonging to some other stream.
    pub ignored: usize,
}

/// A lazy, single-pass parser producing one kind of event from a stream of
/// lines.
///
/// The event kind is selected with the type parameter `E`, ie.
/// `LogParser::<_, DecodeEvent>::new(lines, floor)`.
pub struct LogParser<I, E> {
    lines: I,
    floor: u64,
    stats: ParseStats,
    _kind: PhantomData<E>,
}
impl<I, E: LogRecord> LogParser<I, E> {
    pub fn new(lines: I, floor: u64) -> Self {
        Self {
            lines,
            floor,
            stats: ParseStats::default(),
            _kind: PhantomData,
        }
    }

    /// Return the counters collected so far.
    pub fn stats(&self) -> ParseStats { self.stats }

    /// Give back the underlying line source.
    pub fn into_inner(self) -> I { self.lines }
}

impl<I, S, E> Iterator for LogParser<I, E>
where I: Iterator<Item = S>,
      S: AsRef<str>,
      E: LogRecord,
{
    type Item = E;
    fn next(&mut self) -> Option<E> {
        for line in self.lines.by_ref() {
            let line = line.as_ref().trim_end();
            self.stats.lines += 1;

            if !E::KIND.accepts(line) {
                self.stats.ignored += 1;
                continue;
            }

            let event = match E::parse_line(line) {
                Some(event) => event,
                None => {
                    trace!(kind = %E::KIND, %line, "dropping malformed line");
                    self.stats.malformed += 1;
                    continue;
                },
            };

            if event.address().map_or(false, |pc| pc < self.floor) {
                self.stats.below_floor += 1;
                continue;
            }

            self.stats.accepted += 1;
            return Some(event);
        }
        None
    }
}

pub type BranchParser<I>    = LogParser<I, BranchEvent>;
pub type DecodeParser<I>    = LogParser<I, DecodeEvent>;
pub type WritebackParser<I> = LogParser<I, WritebackEvent>;
pub type MemoryParser<I>    = LogParser<I, MemoryEvent>;

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ADDRESS_FLOOR;

    #[test]
    fn hex_tokens() {
        assert_eq!(parse_hex("ff"), Some(0xff));
        assert_eq!(parse_hex("0x80001000"), Some(0x8000_1000));
        assert_eq!(parse_hex("0X10"), Some(0x10));
        assert_eq!(parse_hex("0x"), None);
        assert_eq!(parse_hex(""), None);
        assert_eq!(parse_hex("+1"), None);
        assert_eq!(parse_hex("zz"), None);
        assert_eq!(parse_hex("1_0"), None);
        assert_eq!(parse_hex("10000000000000000"), None);
    }

    #[test]
    fn branch_lines() {
        let lines = [
            "1a 0 1 1 0 0 80001010",
            "1b 0 0 0 1 0 80001020",
            "1c 0 1 0 0 1 80001030",
            "[boot] hello",
            "1d 0 1 1 0 0",
            "1e 0 x 1 0 0 80001040",
            "1f 0 1 1 0 0 00001000",
            "20 0 2 1 0 3 80001050",
        ];
        let mut p = BranchParser::new(lines.iter(), ADDRESS_FLOOR);
        let events: Vec<BranchEvent> = p.by_ref().collect();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], BranchEvent {
            timestamp: 0x1a, is_branch: true, is_jump: false, taken: true, pc: 0x8000_1010,
        });
        assert!(events[1].is_jump && !events[1].is_branch && !events[1].taken);
        assert!(events[2].is_jump && events[2].taken);
        assert!(events[3].taken && events[3].is_branch && events[3].is_jump);
        assert_eq!(p.stats(), ParseStats {
            lines: 8, accepted: 4, malformed: 2, below_floor: 1, ignored: 1,
        });
    }

    #[test]
    fn decode_lines() {
        let lines = [
            "DECODE,0a,80001010",
            "DECODE, 0b, 0x80001014",
            "DECODE 0c 80001018",
            "DECODE,0d",
            "DECODE,zz,80001018",
            "DECODE,0e,1000",
            "0x10 1 80001010",
        ];
        let mut p = DecodeParser::new(lines.iter(), ADDRESS_FLOOR);
        let events: Vec<DecodeEvent> = p.by_ref().collect();
        let pts: Vec<_> = events.iter().map(|e| (e.timestamp, e.pc)).collect();
        assert_eq!(pts, vec![
            (0x0a, 0x8000_1010), (0x0b, 0x8000_1014), (0x0c, 0x8000_1018),
        ]);
        assert!(events.iter().all(|e| e.retired.is_none()));
        let stats = p.stats();
        assert_eq!(stats.malformed, 2);
        assert_eq!(stats.below_floor, 1);
        assert_eq!(stats.ignored, 1);
    }

    #[test]
    fn writeback_lines() {
        let lines = [
            "0x20 3 0x80001010 DASM(00000013)",
            "0x21,3,80001014,extra,fields",
            "0x22 3",
            "0x23 3 0x00000100",
            "DECODE,0a,80001010",
            "",
        ];
        let mut p = WritebackParser::new(lines.iter(), ADDRESS_FLOOR);
        let events: Vec<WritebackEvent> = p.by_ref().collect();
        assert_eq!(events, vec![
            WritebackEvent::new(0x20, 0x8000_1010),
            WritebackEvent::new(0x21, 0x8000_1014),
        ]);
        let stats = p.stats();
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.below_floor, 1);
        assert_eq!(stats.ignored, 2);
    }

    #[test]
    fn memory_lines_skip_floor() {
        let lines = [
            "MT 10 1 0 0 00002000 more",
            "MT 11 2 0 0",
        ];
        let mut p = MemoryParser::new(lines.iter(), ADDRESS_FLOOR);
        let events: Vec<MemoryEvent> = p.by_ref().collect();
        assert_eq!(events, vec![
            MemoryEvent { timestamp: 0x10, command: 1, address: 0x2000 },
        ]);
        assert_eq!(p.stats().malformed, 1);
    }

    #[test]
    fn markers_need_no_leading_space() {
        let lines = [" 1a 0 1 1 0 0 80001010", "1b 0 1 1 0 0 80001014\r"];
        let mut p = BranchParser::new(lines.iter(), ADDRESS_FLOOR);
        let events: Vec<BranchEvent> = p.by_ref().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].pc, 0x8000_1014);
        assert_eq!(p.stats().ignored, 1);

        let lines = ["  0x20 3 0x80001010", "0x21 3 0x80001014  "];
        let mut p = WritebackParser::new(lines.iter(), ADDRESS_FLOOR);
        let events: Vec<WritebackEvent> = p.by_ref().collect();
        assert_eq!(events, vec![WritebackEvent::new(0x21, 0x8000_1014)]);
        assert_eq!(p.stats().ignored, 1);
    }

    #[test]
    fn kind_names() {
        for kind in [EventKind::Branch, EventKind::Decode,
                     EventKind::Writeback, EventKind::Memory]
        {
            assert_eq!(kind.to_string().parse::<EventKind>(), Ok(kind));
        }
        assert!("fetch".parse::<EventKind>().is_err());
    }
}
