//! Buffer manager statistics and diagnostic dumps.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::common::{FileId, FrameId, PageId};

/// Cumulative counters kept by the buffer manager.
///
/// Atomic so they can be read without taking the pool lock. Counters are
/// independent of each other, so `Relaxed` ordering is enough.
#[derive(Debug, Default)]
pub struct BufferPoolStats {
    /// Page requests served (reads, hit or miss, and allocations).
    pub accesses: AtomicU64,

    /// Pages read from a page store on a miss.
    pub disk_reads: AtomicU64,

    /// Pages written back to a page store.
    pub disk_writes: AtomicU64,

    /// Resident pages pushed out by the clock to make room.
    pub evictions: AtomicU64,
}

impl BufferPoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_access(&self) {
        self.accesses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_disk_read(&self) {
        self.disk_reads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_disk_write(&self) {
        self.disk_writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Non-atomic copy for display or comparison.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accesses: self.accesses.load(Ordering::Relaxed),
            disk_reads: self.disk_reads.load(Ordering::Relaxed),
            disk_writes: self.disk_writes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.accesses.store(0, Ordering::Relaxed);
        self.disk_reads.store(0, Ordering::Relaxed);
        self.disk_writes.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time copy of [`BufferPoolStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub accesses: u64,
    pub disk_reads: u64,
    pub disk_writes: u64,
    pub evictions: u64,
}

impl StatsSnapshot {
    /// Fraction of accesses served without a disk read (0.0 to 1.0).
    ///
    /// Allocations count as accesses without a read, so they count as hits.
    pub fn hit_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.accesses.saturating_sub(self.disk_reads) as f64 / self.accesses as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accesses:{} diskreads:{} diskwrites:{} evictions:{} hit_rate:{:.2}%",
            self.accesses,
            self.disk_reads,
            self.disk_writes,
            self.evictions,
            self.hit_rate() * 100.0
        )
    }
}

/// State of one frame as captured by [`PoolDump`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    pub frame_id: FrameId,
    pub file: Option<FileId>,
    /// Name reported by the owning page store, if the file is still open.
    pub filename: Option<String>,
    pub page_no: PageId,
    pub valid: bool,
    pub dirty: bool,
    pub ref_bit: bool,
    pub pin_count: u32,
}

/// Diagnostic listing of every frame in the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolDump {
    pub frames: Vec<FrameInfo>,
    pub valid_frames: usize,
}

impl fmt::Display for FrameInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameNo:{} ", self.frame_id.0)?;
        match (&self.filename, self.file) {
            (Some(name), _) => write!(f, "file:{} pageNo:{} ", name, self.page_no.0)?,
            (None, Some(file)) => write!(f, "file:{} pageNo:{} ", file, self.page_no.0)?,
            (None, None) => write!(f, "file:NULL ")?,
        }
        write!(
            f,
            "valid:{} pinCnt:{} dirty:{} refbit:{}",
            self.valid as u8, self.pin_count, self.dirty as u8, self.ref_bit as u8
        )
    }
}

impl fmt::Display for PoolDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for info in &self.frames {
            writeln!(f, "{}", info)?;
        }
        writeln!(f, "Total Number of Valid Frames:{}", self.valid_frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = BufferPoolStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
        assert_eq!(stats.snapshot().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = BufferPoolStats::new();
        for _ in 0..10 {
            stats.record_access();
        }
        for _ in 0..3 {
            stats.record_disk_read();
        }

        assert_eq!(stats.snapshot().hit_rate(), 0.7);
    }

    #[test]
    fn test_stats_reset() {
        let stats = BufferPoolStats::new();
        stats.record_access();
        stats.record_disk_write();
        stats.record_eviction();

        stats.reset();

        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_snapshot_display() {
        let snapshot = StatsSnapshot {
            accesses: 80,
            disk_reads: 20,
            disk_writes: 5,
            evictions: 4,
        };
        let display = format!("{}", snapshot);

        assert!(display.contains("accesses:80"));
        assert!(display.contains("diskreads:20"));
        assert!(display.contains("75.00%"));
    }

    #[test]
    fn test_dump_display() {
        let dump = PoolDump {
            frames: vec![
                FrameInfo {
                    frame_id: FrameId::new(0),
                    file: Some(FileId::new(0)),
                    filename: Some("a.db".to_string()),
                    page_no: PageId::new(4),
                    valid: true,
                    dirty: true,
                    ref_bit: false,
                    pin_count: 2,
                },
                FrameInfo {
                    frame_id: FrameId::new(1),
                    file: None,
                    filename: None,
                    page_no: PageId::INVALID,
                    valid: false,
                    dirty: false,
                    ref_bit: false,
                    pin_count: 0,
                },
            ],
            valid_frames: 1,
        };

        let text = format!("{}", dump);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "FrameNo:0 file:a.db pageNo:4 valid:1 pinCnt:2 dirty:1 refbit:0",
                "FrameNo:1 file:NULL valid:0 pinCnt:0 dirty:0 refbit:0",
                "Total Number of Valid Frames:1",
            ]
        );
    }
}
