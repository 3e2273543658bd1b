use linked_hash_map::LinkedHashMap;
use parking_lot::Mutex;

use crate::common::types::FrameId;

/// LRU (Least Recently Used) replacement policy over evictable frames.
///
/// Holds exactly the frames that may be victimized: a frame enters on the
/// unpin that drops its pin count to zero and leaves when it is re-pinned
/// or handed out as a victim. The oldest entry goes first.
pub struct LRUReplacer {
    // Insertion-ordered map; the unit values buy O(1) removal on pin.
    frames: Mutex<LinkedHashMap<FrameId, ()>>,
}

impl LRUReplacer {
    pub fn new(pool_size: usize) -> Self {
        Self {
            frames: Mutex::new(LinkedHashMap::with_capacity(pool_size)),
        }
    }

    /// Pop the least recently unpinned frame, if any frame is evictable.
    pub fn victim(&self) -> Option<FrameId> {
        let mut frames = self.frames.lock();
        frames.pop_front().map(|(frame_id, ())| frame_id)
    }

    /// Mark a frame as no longer evictable. No-op if it was not evictable.
    pub fn pin(&self, frame_id: FrameId) {
        let mut frames = self.frames.lock();
        frames.remove(&frame_id);
    }

    /// Mark a frame as evictable. No-op if it already is, so a redundant
    /// call does not refresh the frame's position in the eviction order.
    pub fn unpin(&self, frame_id: FrameId) {
        let mut frames = self.frames.lock();
        if !frames.contains_key(&frame_id) {
            frames.insert(frame_id, ());
        }
    }

    /// Current count of evictable frames.
    pub fn size(&self) -> usize {
        self.frames.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn victim_returns_frames_in_unpin_order() {
        let replacer = LRUReplacer::new(4);
        replacer.unpin(2);
        replacer.unpin(0);
        replacer.unpin(3);

        assert_eq!(replacer.victim(), Some(2));
        assert_eq!(replacer.victim(), Some(0));
        assert_eq!(replacer.victim(), Some(3));
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn pin_removes_frame_from_eviction_order() {
        let replacer = LRUReplacer::new(4);
        replacer.unpin(0);
        replacer.unpin(1);
        replacer.unpin(2);

        replacer.pin(1);

        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.victim(), Some(0));
        assert_eq!(replacer.victim(), Some(2));
    }

    #[test]
    fn pin_of_absent_frame_is_a_noop() {
        let replacer = LRUReplacer::new(4);
        replacer.unpin(0);

        replacer.pin(7);

        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.victim(), Some(0));
    }

    #[test]
    fn redundant_unpin_keeps_original_position() {
        let replacer = LRUReplacer::new(4);
        replacer.unpin(0);
        replacer.unpin(1);
        replacer.unpin(0);

        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.victim(), Some(0));
        assert_eq!(replacer.victim(), Some(1));
    }

    #[test]
    fn empty_replacer_has_no_victim() {
        let replacer = LRUReplacer::new(4);
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.victim(), None);
    }
}
