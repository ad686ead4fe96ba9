//! Page table - maps resident `(file, page)` pairs to frames.

use std::collections::HashMap;

use crate::common::config::page_table_capacity;
use crate::common::{FileId, FrameId, PageId};

/// Index from page identity to the frame holding it.
///
/// A miss is an ordinary outcome, so [`lookup`](Self::lookup) returns an
/// `Option` rather than an error.
#[derive(Debug, Default)]
pub struct PageTable {
    entries: HashMap<(FileId, PageId), FrameId>,
}

impl PageTable {
    /// Table sized for a pool of `pool_size` frames.
    pub fn new(pool_size: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(page_table_capacity(pool_size)),
        }
    }

    #[inline]
    pub fn lookup(&self, file: FileId, page_no: PageId) -> Option<FrameId> {
        self.entries.get(&(file, page_no)).copied()
    }

    /// Map `(file, page_no)` to `frame_id`. Returns the previous frame if the
    /// page was already mapped, which callers treat as corruption.
    pub fn insert(&mut self, file: FileId, page_no: PageId, frame_id: FrameId) -> Option<FrameId> {
        self.entries.insert((file, page_no), frame_id)
    }

    pub fn remove(&mut self, file: FileId, page_no: PageId) -> Option<FrameId> {
        self.entries.remove(&(file, page_no))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
