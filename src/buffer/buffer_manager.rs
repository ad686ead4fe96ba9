//! Buffer Manager - the page caching layer.
//!
//! The [`BufferManager`] provides:
//! - Page caching between page stores and memory
//! - Pin-based reference counting through [`PageHandle`]
//! - CLOCK replacement with write-back of dirty victims
//! - File-scoped flush and page disposal

use std::collections::HashMap;

use log::{debug, trace, warn};
use parking_lot::{Mutex, RwLock};

use crate::buffer::descriptor::{DescriptorTable, FrameDescriptor};
use crate::buffer::page_table::PageTable;
use crate::buffer::replacer::{Claim, ClockReplacer};
use crate::buffer::{BufferPoolStats, FrameInfo, PageHandle, PoolDump};
use crate::common::config::DEFAULT_POOL_SIZE;
use crate::common::{Error, FileId, FrameId, PageId, Result};
use crate::storage::{DiskManager, Page, PageStore};

/// Everything guarded by the pool lock.
///
/// Lookup, clock sweep, eviction and pin-count changes all happen while this
/// is held, so a frame cannot be chosen as a victim between observing its
/// pin count as zero and evicting it.
pub(crate) struct PoolState<S> {
    pub(crate) descriptors: DescriptorTable,
    pub(crate) page_table: PageTable,
    clock: ClockReplacer,
    files: HashMap<FileId, S>,
    next_file_id: u32,
}

/// Manages a fixed pool of frames caching pages from registered files.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                       BufferManager                          │
/// │  state: Mutex<PoolState>                                     │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐     │
/// │  │ page_table   │  │  descriptors: one per frame       │     │
/// │  │(File,Page)→F │─▶│  [Desc0] [Desc1] [Desc2] ...      │     │
/// │  └──────────────┘  └───────────────────────────────────┘     │
/// │  ┌──────────────┐  ┌──────────────────────────┐              │
/// │  │ clock hand   │  │ files: FileId → S        │              │
/// │  └──────────────┘  └──────────────────────────┘              │
/// │  pool: Vec<RwLock<Page>>  (index-aligned with descriptors)   │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `state`: one `Mutex` for the page table, descriptors, clock hand and
///   page stores. Page store I/O runs under it.
/// - `pool`: a `RwLock` per frame, only reached through a [`PageHandle`]
///   or while the frame is unpinned and the state lock is held.
/// - `stats`: atomic counters.
///
/// Lock order is always `state` then a frame lock.
///
/// # Usage
/// ```ignore
/// let bpm = BufferManager::new(10);
/// let file = bpm.add_file(DiskManager::create("test.db")?);
///
/// let handle = bpm.alloc_page(file)?;
/// let page_no = handle.page_no();
/// handle.write().as_mut_slice()[0] = 0xAB;
/// handle.unpin(true)?;
///
/// let handle = bpm.read_page(file, page_no)?;
/// assert_eq!(handle.read().as_slice()[0], 0xAB);
/// ```
pub struct BufferManager<S: PageStore = DiskManager> {
    pool: Vec<RwLock<Page>>,
    state: Mutex<PoolState<S>>,
    stats: BufferPoolStats,
    pool_size: usize,
}

impl<S: PageStore> BufferManager<S> {
    /// Create a buffer manager with `pool_size` frames.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        Self {
            pool: (0..pool_size).map(|_| RwLock::new(Page::new())).collect(),
            state: Mutex::new(PoolState {
                descriptors: DescriptorTable::new(pool_size),
                page_table: PageTable::new(pool_size),
                clock: ClockReplacer::new(pool_size),
                files: HashMap::new(),
                next_file_id: 0,
            }),
            stats: BufferPoolStats::new(),
            pool_size,
        }
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// Register a page store and return the id that names it from now on.
    pub fn add_file(&self, store: S) -> FileId {
        let mut state = self.state.lock();
        let file = FileId::new(state.next_file_id);
        state.next_file_id += 1;
        debug!("registered {} as {}", store.filename(), file);
        state.files.insert(file, store);
        file
    }

    /// Flush the file out of the pool (as [`flush_file`](Self::flush_file))
    /// and hand its page store back.
    pub fn close_file(&self, file: FileId) -> Result<S> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        self.flush_file_locked(state, file)?;
        state.files.remove(&file).ok_or(Error::UnknownFile(file))
    }

    /// Run `f` against a registered page store.
    pub fn with_store<R>(&self, file: FileId, f: impl FnOnce(&S) -> R) -> Result<R> {
        let state = self.state.lock();
        state.files.get(&file).map(f).ok_or(Error::UnknownFile(file))
    }

    // ========================================================================
    // Page access
    // ========================================================================

    /// Pin `page_no` of `file`, reading it from its page store on a miss.
    ///
    /// # Errors
    /// - `Error::BufferExceeded` if the clock sweep finds no frame to claim
    /// - `Error::PageNotFound` if the store has no such page
    /// - `Error::UnknownFile` if `file` is not registered
    /// - I/O errors from the store, including the write-back of a victim
    pub fn read_page(&self, file: FileId, page_no: PageId) -> Result<PageHandle<'_, S>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        Self::store_mut(&mut state.files, file)?;

        if let Some(frame_id) = state.page_table.lookup(file, page_no) {
            let pins = state.descriptors.get_mut(frame_id).pin();
            self.stats.record_access();
            trace!("hit {} of {} in {} (pins: {})", page_no, file, frame_id, pins);
            return Ok(PageHandle::new(self, file, page_no, frame_id));
        }

        let frame_id = self.allocate_frame(state)?;
        let page = Self::store_mut(&mut state.files, file)?.read_page(page_no)?;
        self.install(state, frame_id, file, page_no, &page);

        self.stats.record_access();
        self.stats.record_disk_read();
        debug!("miss {} of {}, loaded into {}", page_no, file, frame_id);

        Ok(PageHandle::new(self, file, page_no, frame_id))
    }

    /// Allocate a new page in `file` and pin it.
    ///
    /// The page number assigned by the store is available from
    /// [`PageHandle::page_no`]. A frame is claimed before the store is asked
    /// for a page, so `BufferExceeded` never leaves an orphaned page behind.
    ///
    /// # Errors
    /// - `Error::BufferExceeded` if the clock sweep finds no frame to claim
    /// - `Error::UnknownFile` if `file` is not registered
    /// - I/O errors from the store
    pub fn alloc_page(&self, file: FileId) -> Result<PageHandle<'_, S>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        Self::store_mut(&mut state.files, file)?;

        let frame_id = self.allocate_frame(state)?;
        let (page_no, page) = Self::store_mut(&mut state.files, file)?.allocate_page()?;
        self.install(state, frame_id, file, page_no, &page);

        self.stats.record_access();
        debug!("allocated {} of {} in {}", page_no, file, frame_id);

        Ok(PageHandle::new(self, file, page_no, frame_id))
    }

    /// Drop one pin on a resident page, marking it dirty if asked.
    ///
    /// Reached through [`PageHandle`] only, so a caller cannot give back a
    /// pin it does not hold.
    ///
    /// # Errors
    /// - `Error::PageNotResident` if the page is not in the pool
    /// - `Error::PageNotPinned` if its pin count is already zero
    pub(crate) fn unpin_page(&self, file: FileId, page_no: PageId, dirty: bool) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(frame_id) = state.page_table.lookup(file, page_no) else {
            return Err(Error::PageNotResident {
                filename: Self::filename_of(&state.files, file),
                page_no,
            });
        };

        let desc = state.descriptors.get_mut(frame_id);
        if desc.unpin().is_none() {
            return Err(Error::PageNotPinned {
                filename: Self::filename_of(&state.files, file),
                page_no,
                frame_id,
            });
        }
        if dirty {
            desc.mark_dirty();
        }

        Ok(())
    }

    // ========================================================================
    // File-scoped operations
    // ========================================================================

    /// Write back and drop every page of `file` from the pool.
    ///
    /// All of the file's frames are checked before anything is written, so a
    /// pinned or inconsistent frame leaves the file's frames untouched.
    ///
    /// # Errors
    /// - `Error::PagePinned` if any page of the file is pinned
    /// - `Error::BadBuffer` if a frame owned by the file is invalid or
    ///   disagrees with the page table
    /// - `Error::UnknownFile` if `file` is not registered
    /// - I/O errors from the store; frames flushed before the failure stay
    ///   flushed, the failing frame stays resident and dirty
    pub fn flush_file(&self, file: FileId) -> Result<()> {
        let mut guard = self.state.lock();
        self.flush_file_locked(&mut guard, file)
    }

    /// Delete a page from its store and drop it from the pool if cached.
    ///
    /// Any unflushed changes to the page are discarded. The store is asked
    /// first; if the deletion fails the cached copy stays resident, dirty bit
    /// and all.
    ///
    /// # Errors
    /// - `Error::PagePinned` if the page is resident and pinned, since live
    ///   handles still point at its frame
    /// - `Error::UnknownFile` if `file` is not registered
    /// - Whatever the store reports for the deletion
    pub fn dispose_page(&self, file: FileId, page_no: PageId) -> Result<()> {
        let mut guard = self.state.lock();
        let PoolState {
            descriptors,
            page_table,
            files,
            ..
        } = &mut *guard;
        let store = Self::store_mut(files, file)?;

        let cached = page_table.lookup(file, page_no);
        if let Some(frame_id) = cached {
            if descriptors.get(frame_id).is_pinned() {
                return Err(Error::PagePinned {
                    filename: store.filename().to_string(),
                    page_no,
                    frame_id,
                });
            }
        }

        store.delete_page(page_no)?;

        if let Some(frame_id) = cached {
            page_table.remove(file, page_no);
            descriptors.get_mut(frame_id).clear();
            debug!("dropped {} of {} from {}", page_no, file, frame_id);
        }
        Ok(())
    }

    /// Write back every dirty, unpinned page in the pool. Pages stay
    /// resident; pinned pages are skipped because their holders may be
    /// writing to them.
    pub fn flush_all_pages(&self) -> Result<()> {
        let mut guard = self.state.lock();
        let PoolState {
            descriptors, files, ..
        } = &mut *guard;

        let dirty: Vec<FrameId> = descriptors
            .iter()
            .filter(|d| d.is_valid() && d.is_dirty() && !d.is_pinned())
            .map(FrameDescriptor::frame_id)
            .collect();

        for frame_id in dirty {
            let desc = descriptors.get_mut(frame_id);
            let (file, page_no) = desc.resident().ok_or_else(|| bad_buffer(desc))?;
            Self::store_mut(files, file)?.write_page(page_no, &self.pool[frame_id.0].read())?;
            desc.clear_dirty();
            self.stats.record_disk_write();
        }

        Ok(())
    }

    // ========================================================================
    // Statistics and introspection
    // ========================================================================

    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Number of frames holding a live page.
    pub fn valid_frame_count(&self) -> usize {
        self.state.lock().descriptors.valid_count()
    }

    pub fn contains_page(&self, file: FileId, page_no: PageId) -> bool {
        self.state.lock().page_table.lookup(file, page_no).is_some()
    }

    /// Pin count of a resident page, `None` if it is not in the pool.
    pub fn pin_count(&self, file: FileId, page_no: PageId) -> Option<u32> {
        let state = self.state.lock();
        let frame_id = state.page_table.lookup(file, page_no)?;
        Some(state.descriptors.get(frame_id).pin_count())
    }

    /// Dirty bit of a resident page, `None` if it is not in the pool.
    pub fn is_dirty(&self, file: FileId, page_no: PageId) -> Option<bool> {
        let state = self.state.lock();
        let frame_id = state.page_table.lookup(file, page_no)?;
        Some(state.descriptors.get(frame_id).is_dirty())
    }

    /// Snapshot of every frame's identity and state bits.
    pub fn dump(&self) -> PoolDump {
        let state = self.state.lock();

        let frames = state
            .descriptors
            .iter()
            .map(|d| FrameInfo {
                frame_id: d.frame_id(),
                file: d.file(),
                filename: d
                    .file()
                    .and_then(|file| state.files.get(&file))
                    .map(|store| store.filename().to_string()),
                page_no: d.page_no(),
                valid: d.is_valid(),
                dirty: d.is_dirty(),
                ref_bit: d.ref_bit(),
                pin_count: d.pin_count(),
            })
            .collect();

        PoolDump {
            frames,
            valid_frames: state.descriptors.valid_count(),
        }
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Page buffer of a frame, for [`PageHandle`].
    #[inline]
    pub(crate) fn frame_page(&self, frame_id: FrameId) -> &RwLock<Page> {
        &self.pool[frame_id.0]
    }

    fn store_mut(files: &mut HashMap<FileId, S>, file: FileId) -> Result<&mut S> {
        files.get_mut(&file).ok_or(Error::UnknownFile(file))
    }

    fn filename_of(files: &HashMap<FileId, S>, file: FileId) -> String {
        files
            .get(&file)
            .map(|store| store.filename().to_string())
            .unwrap_or_else(|| file.to_string())
    }

    /// Claim a frame with the clock, evicting its page if it holds one.
    ///
    /// A dirty victim is written back before its page table entry and
    /// descriptor are dropped. If that write fails the victim stays resident
    /// and dirty.
    fn allocate_frame(&self, state: &mut PoolState<S>) -> Result<FrameId> {
        let PoolState {
            descriptors,
            page_table,
            clock,
            files,
            ..
        } = state;

        let Some(claim) = clock.sweep(descriptors) else {
            debug!("no evictable frame among {}", self.pool_size);
            return Err(Error::BufferExceeded);
        };

        if let Claim::Victim(frame_id) = claim {
            let desc = descriptors.get_mut(frame_id);
            let (file, page_no) = desc.resident().ok_or_else(|| bad_buffer(desc))?;

            if desc.is_dirty() {
                Self::store_mut(files, file)?.write_page(page_no, &self.pool[frame_id.0].read())?;
                self.stats.record_disk_write();
            }
            page_table.remove(file, page_no);
            desc.clear();
            debug_assert!(desc.is_consistent());

            self.stats.record_eviction();
            debug!("evicted {} of {} from {}", page_no, file, frame_id);
        }

        Ok(claim.frame_id())
    }

    /// Fill a claimed frame and make it resident with one pin.
    fn install(
        &self,
        state: &mut PoolState<S>,
        frame_id: FrameId,
        file: FileId,
        page_no: PageId,
        page: &Page,
    ) {
        self.pool[frame_id.0].write().copy_from(page);
        state.descriptors.get_mut(frame_id).set(file, page_no);
        let previous = state.page_table.insert(file, page_no, frame_id);
        debug_assert!(previous.is_none(), "{} of {} mapped twice", page_no, file);
    }

    fn flush_file_locked(&self, state: &mut PoolState<S>, file: FileId) -> Result<()> {
        let PoolState {
            descriptors,
            page_table,
            files,
            ..
        } = state;
        let store = Self::store_mut(files, file)?;

        // Validate every frame of the file before touching any of them
        let mut frames = Vec::new();
        for desc in descriptors.owned_by(file) {
            if desc.is_pinned() {
                return Err(Error::PagePinned {
                    filename: store.filename().to_string(),
                    page_no: desc.page_no(),
                    frame_id: desc.frame_id(),
                });
            }
            if !desc.is_valid() || page_table.lookup(file, desc.page_no()) != Some(desc.frame_id())
            {
                return Err(bad_buffer(desc));
            }
            frames.push(desc.frame_id());
        }

        let mut written = 0;
        for frame_id in &frames {
            let desc = descriptors.get_mut(*frame_id);
            let page_no = desc.page_no();
            if desc.is_dirty() {
                store.write_page(page_no, &self.pool[frame_id.0].read())?;
                desc.clear_dirty();
                self.stats.record_disk_write();
                written += 1;
            }
            page_table.remove(file, page_no);
            desc.clear();
            debug_assert!(desc.is_consistent());
        }

        debug!(
            "flushed {} ({}): {} frames dropped, {} written",
            file,
            store.filename(),
            frames.len(),
            written
        );
        Ok(())
    }
}

fn bad_buffer(desc: &FrameDescriptor) -> Error {
    Error::BadBuffer {
        frame_id: desc.frame_id(),
        dirty: desc.is_dirty(),
        valid: desc.is_valid(),
        ref_bit: desc.ref_bit(),
    }
}

impl<S: PageStore> Default for BufferManager<S> {
    /// A pool of `DEFAULT_POOL_SIZE` frames.
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

impl<S: PageStore> Drop for BufferManager<S> {
    /// Best-effort write-back of every dirty page still in the pool.
    fn drop(&mut self) {
        let Self { pool, state, .. } = self;
        let PoolState {
            descriptors, files, ..
        } = state.get_mut();

        for desc in descriptors.iter() {
            let Some((file, page_no)) = desc.resident() else {
                continue;
            };
            if !desc.is_dirty() {
                continue;
            }
            let Some(store) = files.get_mut(&file) else {
                continue;
            };
            let page = pool[desc.frame_id().0].get_mut();
            if let Err(err) = store.write_page(page_no, page) {
                warn!(
                    "lost write-back of {} of {} on shutdown: {}",
                    page_no,
                    store.filename(),
                    err
                );
            }
        }
    }
}
