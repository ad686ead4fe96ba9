//! Disk Manager - a page store backed by a single file.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::page_store::PageStore;

/// Page store for one database file.
///
/// # File Layout
/// Pages are laid out back to back; page N lives at offset `N × PAGE_SIZE`:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │  ...    │ Page N  │
/// └─────────┴─────────┴─────────┴─────────┘
/// ```
///
/// # Deletion
/// A deleted page keeps its slot in the file so page numbers are never
/// reissued. The deleted set lives in memory only: after a reopen every slot
/// in the file reads back as a live page.
///
/// # Durability
/// Writes and allocations are followed by `fsync()`.
pub struct DiskManager {
    file: File,
    name: String,
    /// Number of page slots in the file, deleted ones included.
    page_count: u32,
    deleted: HashSet<PageId>,
}

impl DiskManager {
    /// Create a new database file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;

        Ok(Self {
            file,
            name: path.as_ref().display().to_string(),
            page_count: 0,
            deleted: HashSet::new(),
        })
    }

    /// Open an existing database file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_ref())?;

        let page_count = (file.metadata()?.len() / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file,
            name: path.as_ref().display().to_string(),
            page_count,
            deleted: HashSet::new(),
        })
    }

    /// Number of page slots in the file, deleted pages included.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Whether `page_no` is allocated and not deleted.
    pub fn is_live(&self, page_no: PageId) -> bool {
        page_no.0 < self.page_count && !self.deleted.contains(&page_no)
    }

    fn check_live(&self, page_no: PageId) -> Result<()> {
        if self.is_live(page_no) {
            Ok(())
        } else {
            Err(Error::PageNotFound {
                filename: self.name.clone(),
                page_no,
            })
        }
    }

    #[inline]
    fn offset(page_no: PageId) -> u64 {
        (page_no.0 as u64) * (PAGE_SIZE as u64)
    }
}

impl PageStore for DiskManager {
    fn read_page(&mut self, page_no: PageId) -> Result<Page> {
        self.check_live(page_no)?;

        self.file.seek(SeekFrom::Start(Self::offset(page_no)))?;
        let mut page = Page::new();
        self.file.read_exact(page.as_mut_slice())?;

        Ok(page)
    }

    fn write_page(&mut self, page_no: PageId, page: &Page) -> Result<()> {
        self.check_live(page_no)?;

        self.file.seek(SeekFrom::Start(Self::offset(page_no)))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?;

        Ok(())
    }

    fn allocate_page(&mut self) -> Result<(PageId, Page)> {
        let page_no = PageId::new(self.page_count);
        let page = Page::new();

        // Extend the file with a zeroed slot
        self.file.seek(SeekFrom::Start(Self::offset(page_no)))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?;

        self.page_count += 1;
        Ok((page_no, page))
    }

    fn delete_page(&mut self, page_no: PageId) -> Result<()> {
        self.check_live(page_no)?;
        self.deleted.insert(page_no);
        Ok(())
    }

    fn filename(&self) -> &str {
        &self.name
    }
}
