//! Configuration constants for the buffer manager.

/// Size of a page in bytes (4KB).
///
/// Matches the OS page size on most systems, so a page maps onto a single
/// aligned block for I/O.
pub const PAGE_SIZE: usize = 4096;

/// Pool size used when the caller has no better number.
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Initial capacity of the page table for a pool of `pool_size` frames.
///
/// Roughly 1.2 entries per frame, rounded down to even and then made odd.
#[inline]
pub fn page_table_capacity(pool_size: usize) -> usize {
    ((pool_size as f64 * 1.2) as usize & !1) + 1
}
