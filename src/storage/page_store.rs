//! The page store contract consumed by the buffer manager.

use crate::common::{PageId, Result};
use crate::storage::page::Page;

/// Durable home of one file's pages.
///
/// The buffer manager owns one store per registered file and calls into it
/// only on a miss, an allocation, a write-back or a disposal. Every call is
/// blocking; the manager holds its pool lock for the duration.
pub trait PageStore {
    /// Read the current contents of `page_no`.
    ///
    /// Fails with `Error::PageNotFound` if the page was never allocated or
    /// has been deleted.
    fn read_page(&mut self, page_no: PageId) -> Result<Page>;

    /// Persist `page` as the new contents of `page_no`.
    fn write_page(&mut self, page_no: PageId, page: &Page) -> Result<()>;

    /// Allocate a brand-new page and return its number and initial contents.
    ///
    /// A page number is never issued twice by the same store.
    fn allocate_page(&mut self) -> Result<(PageId, Page)>;

    /// Release the storage for `page_no`.
    fn delete_page(&mut self, page_no: PageId) -> Result<()>;

    /// Human-readable name, used in diagnostics and error messages.
    fn filename(&self) -> &str;
}
