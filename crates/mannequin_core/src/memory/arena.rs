//! # Arena Allocator
//!
//! A fixed-capacity slot arena for objects that are freed all at once.

use std::collections::TryReserveError;

/// Handle to an object stored in an [`Arena`].
///
/// The handle pairs a dense slot index with the arena epoch it was issued
/// in. Resetting the arena bumps the epoch, so every handle issued before
/// the reset stops resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArenaHandle {
    /// Slot index, dense from zero in allocation order.
    index: u32,
    /// Epoch of the arena at allocation time.
    epoch: u32,
}

impl ArenaHandle {
    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }
}

/// A bump-cursor arena with a fixed number of slots.
///
/// Allocations are O(1) pushes into storage reserved at construction.
/// There is no per-object free: the whole arena is reset at once, which
/// invalidates every outstanding handle.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. It is owned by whoever owns the stage.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena: Arena<Model> = Arena::new(40);
///
/// let handle = arena.alloc(model)?;
/// assert_eq!(arena.remaining(), 39);
///
/// arena.reset();
/// assert!(arena.get(handle).is_none());
/// ```
#[derive(Debug)]
pub struct Arena<T> {
    /// Slot storage. Never grows past `capacity`.
    slots: Vec<T>,
    /// Total capacity.
    capacity: usize,
    /// Incremented on every reset.
    epoch: u32,
}

impl<T> Arena<T> {
    /// Creates a new arena with room for `capacity` objects.
    ///
    /// All slot storage is reserved upfront. A zero capacity is allowed and
    /// yields an arena that refuses every allocation.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            epoch: 0,
        }
    }

    /// Returns the total capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of live objects.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing has been allocated since the last reset.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the number of free slots.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity - self.slots.len()
    }

    /// Returns `true` once every slot is taken.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Returns the current epoch.
    #[inline]
    #[must_use]
    pub const fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Stores `value` in the next free slot.
    ///
    /// # Returns
    ///
    /// A handle to the stored object, or `None` if the arena is full. A
    /// refused value is dropped and the arena is left untouched.
    pub fn alloc(&mut self, value: T) -> Option<ArenaHandle> {
        if self.is_full() {
            return None;
        }

        let index = u32::try_from(self.slots.len()).ok()?;
        self.slots.push(value);

        Some(ArenaHandle {
            index,
            epoch: self.epoch,
        })
    }

    /// Returns `true` if `handle` was issued in the current epoch and still
    /// points at a live slot.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: ArenaHandle) -> bool {
        handle.epoch == self.epoch && handle.index() < self.slots.len()
    }

    /// Gets a reference to a live object.
    ///
    /// Stale handles from a previous epoch resolve to `None`.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: ArenaHandle) -> Option<&T> {
        if handle.epoch != self.epoch {
            return None;
        }
        self.slots.get(handle.index())
    }

    /// Gets a mutable reference to a live object.
    #[inline]
    pub fn get_mut(&mut self, handle: ArenaHandle) -> Option<&mut T> {
        if handle.epoch != self.epoch {
            return None;
        }
        self.slots.get_mut(handle.index())
    }

    /// Drops every object and invalidates all outstanding handles.
    ///
    /// The reserved storage is kept; no memory is returned or reallocated.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Resets the arena and changes its capacity.
    ///
    /// Storage is only reallocated when the new capacity exceeds what was
    /// already reserved. If that fails the arena is still reset but keeps
    /// its previous capacity.
    ///
    /// # Errors
    ///
    /// Returns the allocator's error when the storage cannot be reserved.
    pub fn reset_with_capacity(&mut self, capacity: usize) -> Result<(), TryReserveError> {
        self.reset();
        if capacity > self.slots.capacity() {
            self.slots.try_reserve_exact(capacity)?;
        }
        self.capacity = capacity;
        Ok(())
    }

    /// Iterates over all live objects in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ArenaHandle, &T)> {
        let epoch = self.epoch;
        self.slots.iter().enumerate().map(move |(index, value)| {
            (
                ArenaHandle {
                    // alloc() already refused anything past u32::MAX
                    index: u32::try_from(index).unwrap_or(u32::MAX),
                    epoch,
                },
                value,
            )
        })
    }
}
