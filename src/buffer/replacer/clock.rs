//! CLOCK (second-chance) replacement.
//!
//! The hand sweeps the descriptor table in frame order:
//! - free frame: claim it
//! - reference bit set: clear it and move on (the page's second chance)
//! - pinned: move on
//! - otherwise: that frame is the victim
//!
//! Each frame passed over counts as a busy visit. Once the busy visits exceed
//! the pool size, every frame is either pinned or has spent its second chance
//! without becoming free, and the sweep gives up. The caller may retry: the
//! bits cleared by a failed sweep stay cleared.

use crate::buffer::descriptor::DescriptorTable;
use crate::common::FrameId;

/// What a sweep found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The frame holds nothing; use it as is.
    Free(FrameId),
    /// The frame holds an unpinned, unreferenced page that must be evicted
    /// (written back if dirty, unmapped, cleared) before reuse.
    Victim(FrameId),
}

impl Claim {
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        match *self {
            Claim::Free(frame_id) | Claim::Victim(frame_id) => frame_id,
        }
    }
}

/// The clock hand.
///
/// The hand position persists across sweeps for the lifetime of the pool,
/// and it stays on the frame it hands out, so the next sweep starts by
/// taking that frame's reference bit.
#[derive(Debug)]
pub struct ClockReplacer {
    hand: usize,
    pool_size: usize,
}

impl ClockReplacer {
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");
        Self {
            hand: pool_size - 1,
            pool_size,
        }
    }

    /// Frame currently under the hand.
    #[inline]
    pub fn hand(&self) -> FrameId {
        FrameId::new(self.hand)
    }

    #[inline]
    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.pool_size;
    }

    /// Sweep for a frame. Returns `None` when nothing can be freed.
    ///
    /// Reference bits cleared along the way stay cleared even when the sweep
    /// fails. Never returns a pinned frame.
    pub fn sweep(&mut self, descriptors: &mut DescriptorTable) -> Option<Claim> {
        debug_assert_eq!(descriptors.len(), self.pool_size);

        let mut busy = 0;
        while busy <= self.pool_size {
            let desc = descriptors.get_mut(self.hand());

            if !desc.is_valid() {
                return Some(Claim::Free(desc.frame_id()));
            }

            if desc.clear_ref_bit() || desc.is_pinned() {
                self.advance();
                busy += 1;
                continue;
            }

            return Some(Claim::Victim(desc.frame_id()));
        }

        None
    }
}
