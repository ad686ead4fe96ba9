//! Error type for the buffer manager.

use thiserror::Error;

use super::{FileId, FrameId, PageId};

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything a buffer manager or page store operation can fail with.
///
/// None of these are retried internally. The operation that detects the
/// condition reports it and leaves recovery to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from a page store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The page store has no such page (never allocated, or deleted).
    #[error("{page_no} not found in file {filename}")]
    PageNotFound { filename: String, page_no: PageId },

    /// The clock hand passed more frames than the pool holds without finding
    /// one to claim: every frame is pinned or was given its second chance
    /// without becoming free. A retry may succeed, since the reference bits
    /// cleared by the failed sweep stay cleared.
    #[error("buffer exceeded: no frame can be freed")]
    BufferExceeded,

    /// Unpin requested on a resident page whose pin count is already zero.
    #[error("{page_no} of file {filename} in {frame_id} is not pinned")]
    PageNotPinned {
        filename: String,
        page_no: PageId,
        frame_id: FrameId,
    },

    /// A page of the file is still pinned, so the file (or page) cannot be
    /// flushed or disposed.
    #[error("{page_no} of file {filename} in {frame_id} is pinned")]
    PagePinned {
        filename: String,
        page_no: PageId,
        frame_id: FrameId,
    },

    /// A frame descriptor disagrees with the rest of the pool state.
    ///
    /// Indicates an earlier invariant violation, not a caller mistake.
    #[error("bad buffer in {frame_id}: dirty={dirty} valid={valid} ref={ref_bit}")]
    BadBuffer {
        frame_id: FrameId,
        dirty: bool,
        valid: bool,
        ref_bit: bool,
    },

    /// Unpin requested on a page that is not in the buffer pool at all.
    #[error("{page_no} of file {filename} is not resident in the buffer pool")]
    PageNotResident { filename: String, page_no: PageId },

    /// The file id was never registered, or was already closed.
    #[error("unknown file: {0}")]
    UnknownFile(FileId),
}
