//! An in-memory page store.

use std::collections::HashMap;

use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::page_store::PageStore;

/// Page store that keeps every page on the heap.
///
/// Useful for scratch files and for observing the I/O a buffer manager
/// issues: it counts reads and writes.
pub struct MemoryStore {
    name: String,
    pages: HashMap<PageId, Box<Page>>,
    next_page: u32,
    reads: u64,
    writes: u64,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pages: HashMap::new(),
            next_page: 0,
            reads: 0,
            writes: 0,
        }
    }

    /// Number of successful `read_page` calls.
    pub fn read_count(&self) -> u64 {
        self.reads
    }

    /// Number of successful `write_page` calls.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    /// Number of live pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn contains(&self, page_no: PageId) -> bool {
        self.pages.contains_key(&page_no)
    }

    /// Peek at a stored page without counting a read.
    pub fn peek(&self, page_no: PageId) -> Option<&Page> {
        self.pages.get(&page_no).map(|p| &**p)
    }

    fn not_found(&self, page_no: PageId) -> Error {
        Error::PageNotFound {
            filename: self.name.clone(),
            page_no,
        }
    }
}

impl PageStore for MemoryStore {
    fn read_page(&mut self, page_no: PageId) -> Result<Page> {
        let stored = self
            .pages
            .get(&page_no)
            .ok_or_else(|| self.not_found(page_no))?;

        let mut page = Page::new();
        page.copy_from(stored);
        self.reads += 1;
        Ok(page)
    }

    fn write_page(&mut self, page_no: PageId, page: &Page) -> Result<()> {
        match self.pages.get_mut(&page_no) {
            Some(stored) => stored.copy_from(page),
            None => return Err(self.not_found(page_no)),
        }
        self.writes += 1;
        Ok(())
    }

    fn allocate_page(&mut self) -> Result<(PageId, Page)> {
        let page_no = PageId::new(self.next_page);
        self.next_page += 1;
        self.pages.insert(page_no, Box::new(Page::new()));
        Ok((page_no, Page::new()))
    }

    fn delete_page(&mut self, page_no: PageId) -> Result<()> {
        self.pages
            .remove(&page_no)
            .map(|_| ())
            .ok_or_else(|| self.not_found(page_no))
    }

    fn filename(&self) -> &str {
        &self.name
    }
}
