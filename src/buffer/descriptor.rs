//! Frame descriptors - per-slot bookkeeping for the buffer pool.
//!
//! A [`FrameDescriptor`] records which page a frame holds and the bits the
//! replacement policy and write-back logic need:
//! - `valid`: the frame holds a live page
//! - `ref_bit`: accessed since the clock hand last passed
//! - `dirty`: modified since the last write-back
//! - `pin_count`: number of active holders
//!
//! Descriptors never touch the page table or a page store; the buffer
//! manager orchestrates those.

use crate::common::{FileId, FrameId, PageId};

/// Bookkeeping for one buffer frame.
///
/// Invariant: `!valid` implies `pin_count == 0` and `!dirty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDescriptor {
    frame_id: FrameId,
    file: Option<FileId>,
    page_no: PageId,
    valid: bool,
    ref_bit: bool,
    dirty: bool,
    pin_count: u32,
}

impl FrameDescriptor {
    /// A free descriptor for slot `frame_id`.
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            file: None,
            page_no: PageId::INVALID,
            valid: false,
            ref_bit: false,
            dirty: false,
            pin_count: 0,
        }
    }

    /// Install `(file, page_no)` in this frame: valid, pinned once, referenced
    /// and clean.
    pub fn set(&mut self, file: FileId, page_no: PageId) {
        self.file = Some(file);
        self.page_no = page_no;
        self.valid = true;
        self.ref_bit = true;
        self.dirty = false;
        self.pin_count = 1;
    }

    /// Reset to the free state. Only `frame_id` survives.
    ///
    /// The caller must already have written back the contents and dropped
    /// the page table entry.
    pub fn clear(&mut self) {
        *self = Self::new(self.frame_id);
    }

    /// Record another access: set the reference bit and take a pin.
    #[inline]
    pub fn pin(&mut self) -> u32 {
        self.ref_bit = true;
        self.pin_count += 1;
        self.pin_count
    }

    /// Drop one pin. Returns the new count, or `None` if the count was
    /// already zero (nothing is changed in that case).
    #[inline]
    pub fn unpin(&mut self) -> Option<u32> {
        self.pin_count = self.pin_count.checked_sub(1)?;
        Some(self.pin_count)
    }

    /// Dirty is sticky; only [`clear_dirty`](Self::clear_dirty) resets it.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Called after a successful write-back.
    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Take the second chance away. Returns whether the bit was set.
    #[inline]
    pub fn clear_ref_bit(&mut self) -> bool {
        std::mem::replace(&mut self.ref_bit, false)
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Owning file, `None` for a free frame.
    #[inline]
    pub fn file(&self) -> Option<FileId> {
        self.file
    }

    #[inline]
    pub fn page_no(&self) -> PageId {
        self.page_no
    }

    /// `(file, page_no)` if the frame holds a live page.
    #[inline]
    pub fn resident(&self) -> Option<(FileId, PageId)> {
        match (self.valid, self.file) {
            (true, Some(file)) => Some((file, self.page_no)),
            _ => None,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[inline]
    pub fn ref_bit(&self) -> bool {
        self.ref_bit
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    /// Whether the descriptor honours the free-slot invariant.
    pub fn is_consistent(&self) -> bool {
        self.valid || (self.pin_count == 0 && !self.dirty)
    }

    #[cfg(test)]
    pub(crate) fn force_invalid(&mut self) {
        self.valid = false;
    }
}

/// One descriptor per frame, indexed by [`FrameId`].
#[derive(Debug)]
pub struct DescriptorTable {
    descriptors: Vec<FrameDescriptor>,
}

impl DescriptorTable {
    pub fn new(pool_size: usize) -> Self {
        Self {
            descriptors: (0..pool_size)
                .map(|i| FrameDescriptor::new(FrameId::new(i)))
                .collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    #[inline]
    pub fn get(&self, frame_id: FrameId) -> &FrameDescriptor {
        &self.descriptors[frame_id.0]
    }

    #[inline]
    pub fn get_mut(&mut self, frame_id: FrameId) -> &mut FrameDescriptor {
        &mut self.descriptors[frame_id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameDescriptor> {
        self.descriptors.iter()
    }

    /// Descriptors whose owner is `file`, valid or not.
    pub fn owned_by(&self, file: FileId) -> impl Iterator<Item = &FrameDescriptor> {
        self.descriptors
            .iter()
            .filter(move |d| d.file == Some(file))
    }

    pub fn valid_count(&self) -> usize {
        self.descriptors.iter().filter(|d| d.valid).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> FileId {
        FileId::new(1)
    }

    #[test]
    fn test_new_descriptor_is_free() {
        let d = FrameDescriptor::new(FrameId::new(4));
        assert_eq!(d.frame_id(), FrameId::new(4));
        assert!(!d.is_valid());
        assert!(!d.is_dirty());
        assert!(!d.ref_bit());
        assert_eq!(d.pin_count(), 0);
        assert_eq!(d.resident(), None);
        assert!(d.is_consistent());
    }

    #[test]
    fn test_set() {
        let mut d = FrameDescriptor::new(FrameId::new(0));
        d.set(file(), PageId::new(9));

        assert!(d.is_valid());
        assert!(d.ref_bit());
        assert!(!d.is_dirty());
        assert_eq!(d.pin_count(), 1);
        assert_eq!(d.resident(), Some((file(), PageId::new(9))));
    }

    #[test]
    fn test_clear_keeps_frame_id_only() {
        let mut d = FrameDescriptor::new(FrameId::new(2));
        d.set(file(), PageId::new(9));
        d.mark_dirty();
        d.pin();

        d.clear();

        assert_eq!(d, FrameDescriptor::new(FrameId::new(2)));
    }

    #[test]
    fn test_pin_unpin() {
        let mut d = FrameDescriptor::new(FrameId::new(0));
        d.set(file(), PageId::new(0));
        d.clear_ref_bit();

        assert_eq!(d.pin(), 2);
        assert!(d.ref_bit());
        assert_eq!(d.unpin(), Some(1));
        assert_eq!(d.unpin(), Some(0));
        assert_eq!(d.unpin(), None);
        assert_eq!(d.pin_count(), 0);
    }

    #[test]
    fn test_dirty_is_sticky() {
        let mut d = FrameDescriptor::new(FrameId::new(0));
        d.set(file(), PageId::new(0));
        d.mark_dirty();
        d.unpin();
        assert!(d.is_dirty());

        d.clear_dirty();
        assert!(!d.is_dirty());
    }

    #[test]
    fn test_clear_ref_bit_reports_previous() {
        let mut d = FrameDescriptor::new(FrameId::new(0));
        d.set(file(), PageId::new(0));
        assert!(d.clear_ref_bit());
        assert!(!d.clear_ref_bit());
    }

    #[test]
    fn test_table() {
        let mut table = DescriptorTable::new(3);
        assert_eq!(table.len(), 3);
        assert_eq!(table.valid_count(), 0);

        table.get_mut(FrameId::new(1)).set(file(), PageId::new(5));
        table.get_mut(FrameId::new(2)).set(FileId::new(2), PageId::new(5));

        assert_eq!(table.valid_count(), 2);
        let owned: Vec<FrameId> = table.owned_by(file()).map(|d| d.frame_id()).collect();
        assert_eq!(owned, vec![FrameId::new(1)]);
        for (i, d) in table.iter().enumerate() {
            assert_eq!(d.frame_id(), FrameId::new(i));
        }
    }
}
