use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Minutes since local midnight.
pub type Minute = u16;

/// Exclusive upper bound of a day in minutes.
pub const DAY_END: Minute = 24 * 60;

/// Half-open `[start, end)` span of minutes within one day.
///
/// Block lists are kept normalized everywhere: sorted ascending by start,
/// non-overlapping, with touching blocks merged. `end == other.start` means
/// the blocks are disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(Minute, Minute)", into = "(Minute, Minute)")]
pub struct TimeBlock {
    start: Minute,
    end: Minute,
}

impl TimeBlock {
    pub fn new(start: Minute, end: Minute) -> Result<Self, DomainError> {
        if end <= start || end > DAY_END {
            return Err(DomainError::InvalidTimeBlock);
        }
        Ok(Self { start, end })
    }

    /// Clamps an untrusted pair into the day; `None` when nothing remains.
    pub fn from_raw(start: i64, end: i64) -> Option<Self> {
        let start = start.clamp(0, DAY_END as i64) as Minute;
        let end = end.clamp(0, DAY_END as i64) as Minute;
        (end > start).then_some(Self { start, end })
    }

    pub fn start(&self) -> Minute {
        self.start
    }

    pub fn end(&self) -> Minute {
        self.end
    }

    pub fn minutes(&self) -> u16 {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &TimeBlock) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &TimeBlock) -> bool {
        self.start <= other.start && self.end >= other.end
    }
}

impl TryFrom<(Minute, Minute)> for TimeBlock {
    type Error = DomainError;

    fn try_from((start, end): (Minute, Minute)) -> Result<Self, Self::Error> {
        TimeBlock::new(start, end)
    }
}

impl From<TimeBlock> for (Minute, Minute) {
    fn from(block: TimeBlock) -> (Minute, Minute) {
        (block.start, block.end)
    }
}

// Internal constructor for spans the algebra has already proven valid.
fn block(start: Minute, end: Minute) -> TimeBlock {
    debug_assert!(start < end && end <= DAY_END);
    TimeBlock { start, end }
}

/// Display window `[startHour*60, min(24, max(endHour, startHour+1))*60)`.
pub(crate) fn day_window(start_hour: u8, end_hour: u8) -> TimeBlock {
    let start_hour = start_hour.min(23) as u16;
    let end_hour = (end_hour as u16).clamp(start_hour + 1, 24);
    block(start_hour * 60, end_hour * 60)
}

/// Sorts and merges a block list into normalized form. Idempotent.
pub fn normalize(mut blocks: Vec<TimeBlock>) -> Vec<TimeBlock> {
    blocks.sort_by_key(|b| (b.start, b.end));
    let mut out: Vec<TimeBlock> = Vec::with_capacity(blocks.len());
    for b in blocks {
        match out.last_mut() {
            Some(last) if b.start <= last.end => {
                if b.end > last.end {
                    last.end = b.end;
                }
            }
            _ => out.push(b),
        }
    }
    out
}

/// Normalizes raw integer pairs from an untrusted source, dropping whatever
/// clamps away to nothing.
pub fn normalize_raw(raw: &[(i64, i64)]) -> Vec<TimeBlock> {
    normalize(raw.iter().filter_map(|&(s, e)| TimeBlock::from_raw(s, e)).collect())
}

/// Intersection of two normalized lists. Output is normalized by
/// construction: pieces inherit the ascending order of both inputs.
pub fn intersect(a: &[TimeBlock], b: &[TimeBlock]) -> Vec<TimeBlock> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let start = a[i].start.max(b[j].start);
        let end = a[i].end.min(b[j].end);
        if start < end {
            out.push(block(start, end));
        }
        // Advance whichever block ends first.
        if a[i].end < b[j].end {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

/// Removes `cut` from `base` (both normalized). A cut strictly inside a base
/// block splits it in two.
pub fn subtract(base: &[TimeBlock], cut: &[TimeBlock]) -> Vec<TimeBlock> {
    let mut out = Vec::new();
    let mut ci = 0;
    for b in base {
        let mut cursor = b.start;
        while ci < cut.len() && cut[ci].end <= cursor {
            ci += 1;
        }
        let mut k = ci;
        while k < cut.len() && cut[k].start < b.end {
            if cut[k].start > cursor {
                out.push(block(cursor, cut[k].start));
            }
            cursor = cursor.max(cut[k].end);
            if cursor >= b.end {
                break;
            }
            k += 1;
        }
        if cursor < b.end {
            out.push(block(cursor, b.end));
        }
    }
    out
}

/// Right-pads every block's end by `buffer` minutes (tutor recovery time),
/// capped at end of day, then renormalizes since pads may bridge gaps.
pub fn apply_buffer(booked: Vec<TimeBlock>, buffer: Minute) -> Vec<TimeBlock> {
    normalize(
        booked
            .into_iter()
            .map(|b| block(b.start, DAY_END.min(b.end.saturating_add(buffer))))
            .collect(),
    )
}

/// True when one block in `blocks` wholly contains `span`.
pub fn covers(blocks: &[TimeBlock], span: TimeBlock) -> bool {
    blocks.iter().any(|b| b.contains(&span))
}

pub fn overlaps_any(blocks: &[TimeBlock], span: TimeBlock) -> bool {
    blocks.iter().any(|b| b.overlaps(&span))
}
