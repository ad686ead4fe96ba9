//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache between callers and page stores.
//! It holds a fixed number of frames, each caching one page.
//!
//! # Components
//! - [`BufferManager`] - The facade: read, allocate, flush, dispose
//! - [`PageHandle`] - RAII pin on a resident page
//! - [`DescriptorTable`] / [`FrameDescriptor`] - Per-frame bookkeeping
//! - [`PageTable`] - `(file, page)` to frame index
//! - [`replacer`] - CLOCK replacement
//! - [`BufferPoolStats`] / [`PoolDump`] - Counters and diagnostics

mod buffer_manager;
mod descriptor;
mod page_handle;
mod page_table;
pub mod replacer;
mod stats;

pub use buffer_manager::BufferManager;
pub use descriptor::{DescriptorTable, FrameDescriptor};
pub use page_handle::PageHandle;
pub use page_table::PageTable;
pub use stats::{BufferPoolStats, FrameInfo, PoolDump, StatsSnapshot};
