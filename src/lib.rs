//! clockpool - a buffer manager for disk-based storage engines.
//!
//! Every page access goes through a fixed pool of in-memory frames. The
//! manager decides which pages stay resident (CLOCK, second chance), never
//! evicts a pinned page, and writes dirty pages back before their frame is
//! reused.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  BufferManager (buffer/)                    │
//! │   read_page / alloc_page / flush_file / dispose_page        │
//! │         │                 │                  │              │
//! │   PageTable       ClockReplacer       DescriptorTable       │
//! │  (File,Page)→F    sweeps frames       pin / dirty / ref     │
//! │         └──────── pool: RwLock<Page> per frame ─────┘       │
//! └─────────────────────────────────────────────────────────────┘
//!                              ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │           PageStore (storage/), one per registered file     │
//! │              DiskManager  |  MemoryStore                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Identifiers, configuration, `Error`
//! - [`buffer`] - Buffer manager, frame bookkeeping, replacement
//! - [`storage`] - Pages and page stores
//!
//! # Quick Start
//! ```
//! use clockpool::{BufferManager, MemoryStore};
//!
//! let bpm = BufferManager::new(8);
//! let file = bpm.add_file(MemoryStore::new("scratch"));
//!
//! let handle = bpm.alloc_page(file).unwrap();
//! let page_no = handle.page_no();
//! handle.write().as_mut_slice()[0] = 0xAB;
//! handle.unpin(true).unwrap();
//!
//! let handle = bpm.read_page(file, page_no).unwrap();
//! assert_eq!(handle.read().as_slice()[0], 0xAB);
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

pub use common::config::PAGE_SIZE;
pub use common::{Error, FileId, FrameId, PageId, Result};

pub use buffer::{BufferManager, BufferPoolStats, PageHandle, PoolDump, StatsSnapshot};
pub use storage::{DiskManager, MemoryStore, Page, PageStore};
