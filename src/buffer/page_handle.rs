//! RAII handle for a pinned page.
//!
//! A [`PageHandle`] is the only way to reach page bytes in the pool. It owns
//! exactly one pin; the pin is returned either explicitly with
//! [`PageHandle::unpin`] or when the handle is dropped. Lock guards handed out
//! by [`read`](PageHandle::read) and [`write`](PageHandle::write) borrow the
//! handle, so they cannot outlive the pin.

use std::cell::Cell;

use log::warn;
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use super::buffer_manager::BufferManager;
use crate::common::{FileId, FrameId, PageId, Result};
use crate::storage::{Page, PageStore};

/// A pinned page in the buffer pool.
///
/// # Example
/// ```ignore
/// let handle = bpm.read_page(file, page_no)?;
/// let first = handle.read().as_slice()[0];
/// handle.write().as_mut_slice()[1] = first; // remembers the write
/// handle.unpin(false)?;                     // still marked dirty
/// ```
///
/// Holding a `read()` guard and asking for `write()` on a handle to the same
/// page from the same thread deadlocks, as with any `RwLock`.
pub struct PageHandle<'a, S: PageStore> {
    bpm: &'a BufferManager<S>,
    file: FileId,
    page_no: PageId,
    frame_id: FrameId,
    /// Set by `write()`; forces the release to mark the frame dirty.
    modified: Cell<bool>,
    released: bool,
}

impl<'a, S: PageStore> PageHandle<'a, S> {
    /// Wrap a pin the manager has already taken.
    pub(crate) fn new(
        bpm: &'a BufferManager<S>,
        file: FileId,
        page_no: PageId,
        frame_id: FrameId,
    ) -> Self {
        Self {
            bpm,
            file,
            page_no,
            frame_id,
            modified: Cell::new(false),
            released: false,
        }
    }

    #[inline]
    pub fn file(&self) -> FileId {
        self.file
    }

    #[inline]
    pub fn page_no(&self) -> PageId {
        self.page_no
    }

    /// Frame holding the page. Stable for as long as the handle lives.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Shared access to the page bytes.
    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.bpm.frame_page(self.frame_id).read()
    }

    /// Exclusive access to the page bytes. The page will be marked dirty
    /// when this handle is released.
    pub fn write(&self) -> RwLockWriteGuard<'_, Page> {
        self.modified.set(true);
        self.bpm.frame_page(self.frame_id).write()
    }

    /// Whether `write()` has been called on this handle.
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified.get()
    }

    /// Give the pin back, marking the page dirty if `dirty` is set or the
    /// page was written through this handle.
    ///
    /// # Errors
    /// Reports whatever the manager's unpin reports. With handles as the
    /// only route to a pin, an error here means the pool state is corrupt.
    pub fn unpin(mut self, dirty: bool) -> Result<()> {
        self.released = true;
        self.bpm
            .unpin_page(self.file, self.page_no, dirty || self.is_modified())
    }
}

impl<S: PageStore> Drop for PageHandle<'_, S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self
            .bpm
            .unpin_page(self.file, self.page_no, self.is_modified())
        {
            warn!(
                "failed to release {} of {} held in {}: {}",
                self.page_no, self.file, self.frame_id, err
            );
        }
    }
}
