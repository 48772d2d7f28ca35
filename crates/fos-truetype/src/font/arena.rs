//! Fixed-Capacity Arena
//!
//! Scratch storage sized once when an engine is built and reused for every
//! glyph. Pushing past the capacity fails instead of growing, so decoding a
//! glyph never allocates.

use std::ops::{Index, IndexMut, Range};

/// Error returned when an arena is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded;

/// Arena for typed allocations with a hard upper bound
#[derive(Debug, Clone)]
pub struct FixedArena<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> FixedArena<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Allocate item, returning its index
    pub fn alloc(&mut self, value: T) -> Result<usize, CapacityExceeded> {
        if self.items.len() >= self.capacity {
            return Err(CapacityExceeded);
        }
        let id = self.items.len();
        self.items.push(value);
        Ok(id)
    }

    /// Get item
    pub fn get(&self, id: usize) -> Option<&T> {
        self.items.get(id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut T> {
        self.items.get_mut(id)
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots still free
    pub fn remaining(&self) -> usize {
        self.capacity - self.items.len()
    }

    /// Drop everything from `len` onwards
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Clear all items, keeping the storage
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Index<usize> for FixedArena<T> {
    type Output = T;

    fn index(&self, id: usize) -> &T {
        &self.items[id]
    }
}

impl<T> IndexMut<usize> for FixedArena<T> {
    fn index_mut(&mut self, id: usize) -> &mut T {
        &mut self.items[id]
    }
}

impl<T> Index<Range<usize>> for FixedArena<T> {
    type Output = [T];

    fn index(&self, range: Range<usize>) -> &[T] {
        &self.items[range]
    }
}

impl<T> IndexMut<Range<usize>> for FixedArena<T> {
    fn index_mut(&mut self, range: Range<usize>) -> &mut [T] {
        &mut self.items[range]
    }
}

impl<'a, T> IntoIterator for &'a FixedArena<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
