//! Storage layer - the page store side of the buffer manager.
//!
//! - [`Page`] - The raw 4KB data container
//! - [`PageStore`] - What the buffer manager needs from a file
//! - [`DiskManager`] - File-backed page store
//! - [`MemoryStore`] - Heap-backed page store

mod disk_manager;
mod memory_store;
pub mod page;
mod page_store;

pub use disk_manager::DiskManager;
pub use memory_store::MemoryStore;
pub use page::Page;
pub use page_store::PageStore;
