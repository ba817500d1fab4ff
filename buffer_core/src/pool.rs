//! Fixed-capacity buffer pool
//!
//! Live slots are always contiguous at `[0, len)`. The pool owns the MRU ring
//! and keeps one ring node per live slot; in the idle state the ring's top is
//! the current slot.

use std::collections::HashSet;
use std::path::Path;

use crate::document::DocumentHandle;
use crate::error::{PoolError, PoolResult};
use crate::ring::MruRing;
use crate::slot::Slot;

/// Pool of open buffers
#[derive(Debug)]
pub struct BufferPool {
    /// One entry per capacity position; entries past `length` are vacated
    /// slots that may still hold a reusable document.
    slots: Vec<Slot>,
    length: usize,
    current: usize,
    ring: MruRing,
}

impl BufferPool {
    /// Creates an unallocated pool
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            length: 0,
            current: 0,
            ring: MruRing::new(),
        }
    }

    /// Creates and allocates a pool in one step
    pub fn with_capacity(
        capacity: usize,
        default_document: impl FnOnce() -> DocumentHandle,
    ) -> PoolResult<Self> {
        let mut pool = Self::new();
        pool.allocate(capacity, default_document)?;
        Ok(pool)
    }

    /// One-time initialization
    ///
    /// Slot 0 is bound to the engine's default document, which is only
    /// requested once the configuration has been validated.
    pub fn allocate(
        &mut self,
        capacity: usize,
        default_document: impl FnOnce() -> DocumentHandle,
    ) -> PoolResult<()> {
        if self.is_allocated() {
            return Err(PoolError::AlreadyAllocated);
        }
        if capacity == 0 {
            return Err(PoolError::ZeroCapacity);
        }

        self.slots = Vec::with_capacity(capacity);
        self.slots.push(Slot::with_document(default_document()));
        self.slots.resize_with(capacity, Slot::new);
        self.length = 1;
        self.current = 0;
        self.ring = MruRing::new();
        tracing::debug!(capacity, "buffer pool allocated");
        Ok(())
    }

    pub fn is_allocated(&self) -> bool {
        !self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live slots
    pub fn len(&self) -> usize {
        self.length
    }

    /// True only before allocation; an allocated pool always has a slot
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn has_room(&self) -> bool {
        self.length < self.capacity()
    }

    /// A free slot exists and the pool is not the single-buffer configuration
    pub fn is_buffer_available(&self) -> bool {
        self.capacity() > 1 && self.has_room()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// The current slot
    ///
    /// # Panics
    ///
    /// Panics if the pool has not been allocated.
    pub fn current_slot(&self) -> &Slot {
        &self.slots[self.current]
    }

    /// The current slot, mutably
    ///
    /// # Panics
    ///
    /// Panics if the pool has not been allocated.
    pub fn current_slot_mut(&mut self) -> &mut Slot {
        &mut self.slots[self.current]
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots[..self.length].get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots[..self.length].get_mut(index)
    }

    /// Live slots in physical order
    pub fn slots(&self) -> &[Slot] {
        &self.slots[..self.length]
    }

    pub fn ring(&self) -> &MruRing {
        &self.ring
    }

    /// Opens a new untitled slot at the end of the pool
    ///
    /// The new slot goes to the MRU bottom since it has not been used yet,
    /// and `current` is left alone. When the pool is full this is a no-op
    /// returning the last index; callers check `has_room` first.
    pub fn add(&mut self) -> usize {
        debug_assert!(self.is_allocated(), "add on unallocated pool");
        if !self.has_room() {
            tracing::warn!(capacity = self.capacity(), "buffer pool full, add ignored");
            return self.length.saturating_sub(1);
        }

        self.length += 1;
        let index = self.length - 1;
        self.slots[index].reset();
        let node = self.ring.push_bottom();
        debug_assert_eq!(node, index);
        tracing::debug!(index, len = self.length, "buffer slot added");
        debug_assert!(self.validate());
        index
    }

    /// Removes the current slot, compacting the slots above it
    ///
    /// The removed slot's document moves to the vacated last position so it
    /// is reused by a later `add` and released exactly once at teardown. With
    /// `preserve_z_order` the new current is the most recently used remaining
    /// slot, otherwise the slot now at the same position. A pool with one
    /// live slot resets it in place instead.
    pub fn remove_current(&mut self, preserve_z_order: bool) {
        if self.length == 0 {
            return;
        }
        let removed = self.current;
        if self.length == 1 {
            self.slots[removed].reset();
            tracing::debug!("sole buffer slot reset");
            return;
        }

        self.ring.remove(removed);
        self.slots[removed..self.length].rotate_left(1);
        self.length -= 1;
        self.slots[self.length].reset();

        let preferred = if preserve_z_order {
            self.ring.top()
        } else {
            removed
        };
        self.current = preferred.min(self.length - 1);
        self.ring.set_current(self.current);

        tracing::debug!(
            removed,
            current = self.current,
            len = self.length,
            preserve_z_order,
            "buffer slot removed"
        );
        debug_assert!(self.validate());
    }

    /// Index of the live slot showing `path`
    pub fn index_of(&self, path: impl AsRef<Path>) -> Option<usize> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return None;
        }
        self.slots().iter().position(|slot| slot.path.same_name_as(path))
    }

    /// Switches the current slot, updating the MRU ring
    pub fn set_current(&mut self, index: usize) -> PoolResult<()> {
        if !self.is_allocated() {
            return Err(PoolError::NotAllocated);
        }
        if index >= self.length {
            return Err(PoolError::IndexOutOfRange {
                index,
                len: self.length,
            });
        }
        self.ring.set_current(index);
        self.current = index;
        tracing::trace!(index, cycling = self.ring.is_cycling(), "current buffer set");
        Ok(())
    }

    /// Starts a cycling session: switches stop reordering until it ends
    pub fn begin_cycling(&mut self) {
        self.ring.begin_cycling();
    }

    /// Ends a cycling session, promoting the buffer it ended on
    pub fn end_cycling(&mut self) {
        self.ring.end_cycling();
        debug_assert!(self.validate());
    }

    pub fn is_cycling(&self) -> bool {
        self.ring.is_cycling()
    }

    /// Slot after the current one in MRU order
    pub fn next_in_order(&self) -> usize {
        self.ring.next_in_order()
    }

    /// Slot before the current one in MRU order
    pub fn prev_in_order(&self) -> usize {
        self.ring.prev_in_order()
    }

    pub fn document(&self, index: usize) -> Option<&DocumentHandle> {
        self.slot(index).and_then(Slot::document)
    }

    /// Returns the slot's document, creating it on first use
    pub fn ensure_document(
        &mut self,
        index: usize,
        create: impl FnOnce() -> DocumentHandle,
    ) -> PoolResult<&DocumentHandle> {
        let len = self.length;
        let slot = self
            .slot_mut(index)
            .ok_or(PoolError::IndexOutOfRange { index, len })?;
        Ok(slot.document.get_or_insert_with(create))
    }

    /// Takes every document out of the pool, live or vacated
    ///
    /// Used at teardown: each returned handle must go back to the engine.
    pub fn take_documents(&mut self) -> Vec<DocumentHandle> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.document.take())
            .collect()
    }

    /// Checks the pool and ring invariants
    pub fn validate(&self) -> bool {
        if !self.is_allocated() {
            return self.length == 0;
        }
        if self.length == 0 || self.length > self.capacity() || self.current >= self.length {
            return false;
        }
        if self.ring.len() != self.length || !self.ring.is_consistent() {
            return false;
        }
        if !self.ring.is_cycling() && self.ring.top() != self.current {
            return false;
        }
        let mut seen = HashSet::new();
        self.slots
            .iter()
            .filter_map(Slot::document)
            .all(|doc| seen.insert(doc.raw()))
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::FilePath;

    fn pool_with(capacity: usize) -> BufferPool {
        BufferPool::with_capacity(capacity, || DocumentHandle::from_raw(100)).unwrap()
    }

    fn name_slot(pool: &mut BufferPool, index: usize, name: &str) {
        pool.slot_mut(index).unwrap().path = FilePath::new(name);
    }

    #[test]
    fn test_allocate() {
        let pool = pool_with(4);
        assert_eq!(pool.capacity(), 4);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.current(), 0);
        assert_eq!(pool.document(0), Some(&DocumentHandle::from_raw(100)));
        assert!(pool.validate());
    }

    #[test]
    fn test_allocate_twice_fails() {
        let mut pool = pool_with(2);
        let mut asked = false;
        let result = pool.allocate(2, || {
            asked = true;
            DocumentHandle::from_raw(1)
        });
        assert_eq!(result, Err(PoolError::AlreadyAllocated));
        assert!(!asked);
    }

    #[test]
    fn test_allocate_zero_capacity_fails() {
        let mut pool = BufferPool::new();
        let result = pool.allocate(0, || DocumentHandle::from_raw(1));
        assert_eq!(result, Err(PoolError::ZeroCapacity));
        assert!(!pool.is_allocated());
    }

    #[test]
    fn test_add_keeps_current() {
        let mut pool = pool_with(3);
        assert_eq!(pool.add(), 1);
        assert_eq!(pool.add(), 2);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.current(), 0);
        assert_eq!(pool.ring().order(), vec![0, 1, 2]);
    }

    #[test]
    fn test_add_when_full_is_noop() {
        let mut pool = pool_with(2);
        pool.add();
        name_slot(&mut pool, 1, "/keep.txt");
        assert!(!pool.has_room());
        assert_eq!(pool.add(), 1);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.ring().len(), 2);
        assert!(pool.slot(1).unwrap().path.same_name_as("/keep.txt"));
    }

    #[test]
    fn test_buffer_available() {
        let single = pool_with(1);
        assert!(!single.is_buffer_available());
        let mut multi = pool_with(2);
        assert!(multi.is_buffer_available());
        multi.add();
        assert!(!multi.is_buffer_available());
    }

    #[test]
    fn test_set_current_validates_range() {
        let mut pool = pool_with(3);
        pool.add();
        assert!(pool.set_current(1).is_ok());
        assert_eq!(
            pool.set_current(2),
            Err(PoolError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(pool.current(), 1);
    }

    #[test]
    fn test_remove_current_zorder_scenario() {
        let mut pool = pool_with(3);
        pool.add();
        pool.add();
        pool.set_current(2).unwrap();
        pool.remove_current(true);

        assert_eq!(pool.len(), 2);
        assert!(pool.current() < 2);
        assert_eq!(pool.current(), pool.ring().top());
        assert!(pool.validate());
    }

    #[test]
    fn test_remove_current_compacts_slots() {
        let mut pool = pool_with(4);
        for i in 1..4 {
            pool.add();
            name_slot(&mut pool, i, &format!("/f{}", i));
        }
        name_slot(&mut pool, 0, "/f0");
        pool.set_current(1).unwrap();
        pool.remove_current(false);

        let names: Vec<String> = pool.slots().iter().map(|s| s.path.to_string()).collect();
        assert_eq!(names, vec!["/f0", "/f2", "/f3"]);
        assert_eq!(pool.current(), 1);
        assert!(pool.slot(1).unwrap().path.same_name_as("/f2"));
        assert!(pool.validate());
    }

    #[test]
    fn test_remove_last_index_clamps() {
        let mut pool = pool_with(3);
        pool.add();
        pool.add();
        pool.set_current(2).unwrap();
        pool.remove_current(false);
        assert_eq!(pool.current(), 1);
        assert!(pool.validate());
    }

    #[test]
    fn test_remove_moves_document_to_vacated_slot() {
        let mut pool = pool_with(3);
        pool.add();
        pool.add();
        pool.ensure_document(1, || DocumentHandle::from_raw(101)).unwrap();
        pool.ensure_document(2, || DocumentHandle::from_raw(102)).unwrap();
        pool.set_current(1).unwrap();
        pool.remove_current(true);

        assert_eq!(pool.document(1), Some(&DocumentHandle::from_raw(102)));
        // The closed document waits in the vacated slot and is reused by add
        let index = pool.add();
        assert_eq!(pool.document(index), Some(&DocumentHandle::from_raw(101)));
    }

    #[test]
    fn test_remove_sole_slot_resets() {
        let mut pool = pool_with(1);
        name_slot(&mut pool, 0, "/only.txt");
        pool.current_slot_mut().dirty = true;
        pool.remove_current(true);

        assert_eq!(pool.len(), 1);
        assert!(pool.current_slot().is_pristine());
        assert_eq!(pool.document(0), Some(&DocumentHandle::from_raw(100)));
    }

    #[test]
    fn test_index_of() {
        let mut pool = pool_with(3);
        pool.add();
        name_slot(&mut pool, 0, "/a.txt");
        name_slot(&mut pool, 1, "/b.txt");
        assert_eq!(pool.index_of("/b.txt"), Some(1));
        assert_eq!(pool.index_of("/c.txt"), None);
        assert_eq!(pool.index_of(""), None);
    }

    #[test]
    fn test_ensure_document_is_lazy() {
        let mut pool = pool_with(2);
        pool.add();
        assert!(pool.document(1).is_none());
        pool.ensure_document(1, || DocumentHandle::from_raw(7)).unwrap();
        pool.ensure_document(1, || DocumentHandle::from_raw(8)).unwrap();
        assert_eq!(pool.document(1), Some(&DocumentHandle::from_raw(7)));
        assert!(pool.ensure_document(5, || DocumentHandle::from_raw(9)).is_err());
    }

    #[test]
    fn test_take_documents_empties_every_slot() {
        let mut pool = pool_with(3);
        pool.add();
        pool.add();
        pool.ensure_document(2, || DocumentHandle::from_raw(102)).unwrap();
        pool.set_current(2).unwrap();
        pool.remove_current(true);

        let mut raws: Vec<u64> = pool.take_documents().iter().map(|d| d.raw()).collect();
        raws.sort_unstable();
        assert_eq!(raws, vec![100, 102]);
        assert!(pool.take_documents().is_empty());
    }

    #[test]
    fn test_cycling_through_pool() {
        let mut pool = pool_with(4);
        pool.add();
        pool.add();
        pool.add();
        pool.begin_cycling();
        let next = pool.next_in_order();
        pool.set_current(next).unwrap();
        let next = pool.next_in_order();
        pool.set_current(next).unwrap();
        assert_eq!(pool.current(), 2);
        pool.end_cycling();
        assert_eq!(pool.ring().order(), vec![2, 0, 1, 3]);
        assert!(pool.validate());
    }
}
