// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-capacity entity pools.
//!
//! Every entity kind owned by a node draws its records from an arena sized
//! once at node construction. Occupancy is tracked with a bitmap (bit set =
//! slot owned) and slots are addressed by index, never by pointer.
//!
//! # Slot lifecycle
//!
//! ```text
//! FREE --acquire--> OWNED (reserved) --commit--> OWNED (record visible)
//!   ^                    |                            |
//!   +------release-------+------------take------------+
//! ```
//!
//! Handles carry the slot generation, which is bumped on every release, so a
//! handle kept past its destruction never resolves to the slot's next tenant.

use log::warn;

/// Handle to an owned pool slot
///
/// Encoded as: upper 16 bits = generation, lower 16 bits = slot index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle(u32);

impl SlotHandle {
    fn new(index: u16, generation: u16) -> Self {
        Self((u32::from(generation) << 16) | u32::from(index))
    }

    /// Slot index inside the pool.
    pub fn index(self) -> usize {
        usize::from((self.0 & 0xFFFF) as u16)
    }

    fn generation(self) -> u16 {
        (self.0 >> 16) as u16
    }
}

/// Counters kept by each pool (read through [`EntityPool::stats`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub acquisitions: u64,
    pub releases: u64,
    pub exhaustions: u64,
}

/// Largest capacity a pool accepts (slot index must fit in 16 bits).
pub const MAX_POOL_CAPACITY: usize = u16::MAX as usize;

/// Fixed-capacity arena of entity records.
///
/// Not synchronized: a pool belongs to exactly one node and is driven from
/// that node's thread of control.
#[derive(Debug)]
pub struct EntityPool<T> {
    slots: Vec<Option<T>>,
    generations: Vec<u16>,
    bitmap: Vec<u64>,
    free: usize,
    stats: PoolStats,
}

impl<T> EntityPool<T> {
    /// Create a pool with `capacity` slots, all free.
    ///
    /// Capacities above [`MAX_POOL_CAPACITY`] are clamped; config validation
    /// rejects them before a node is built.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_POOL_CAPACITY);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            generations: vec![0; capacity],
            bitmap: vec![0; capacity.div_ceil(64)],
            free: capacity,
            stats: PoolStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn free_count(&self) -> usize {
        self.free
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Whether the slot at `index` is currently owned.
    pub fn is_owned(&self, index: usize) -> bool {
        index < self.capacity() && self.bitmap[index / 64] & (1u64 << (index % 64)) != 0
    }

    /// Reserve a free slot.
    ///
    /// Returns `None` when every slot is owned; the pool never grows.
    pub fn acquire(&mut self) -> Option<SlotHandle> {
        for (word_idx, word) in self.bitmap.iter_mut().enumerate() {
            // Find first free bit (bit=0 means free)
            let bit = (!*word).trailing_zeros() as usize;
            if bit >= 64 {
                continue;
            }
            let index = word_idx * 64 + bit;
            if index >= self.slots.len() {
                break;
            }
            *word |= 1u64 << bit;
            self.free -= 1;
            self.stats.acquisitions += 1;
            // index < MAX_POOL_CAPACITY, fits u16
            return Some(SlotHandle::new(index as u16, self.generations[index]));
        }

        self.stats.exhaustions += 1;
        None
    }

    /// Store the record for an acquired slot, making it visible to lookups.
    ///
    /// Returns the value back if the handle does not own its slot.
    pub fn commit(&mut self, handle: SlotHandle, value: T) -> Result<(), T> {
        if !self.owns(handle) {
            return Err(value);
        }
        self.slots[handle.index()] = Some(value);
        Ok(())
    }

    /// Return a slot to the pool, dropping any record stored in it.
    ///
    /// Releasing a slot twice is a caller bug: it is reported and ignored.
    pub fn release(&mut self, handle: SlotHandle) -> bool {
        if !self.owns(handle) {
            warn!(
                "[EntityPool::release] slot {} not owned by handle, ignoring",
                handle.index()
            );
            return false;
        }
        let index = handle.index();
        self.slots[index] = None;
        self.bitmap[index / 64] &= !(1u64 << (index % 64));
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free += 1;
        self.stats.releases += 1;
        true
    }

    /// Release a slot and hand back its committed record.
    ///
    /// Returns `None` (and leaves the pool untouched) for stale handles and
    /// for slots whose record was never committed.
    pub fn take(&mut self, handle: SlotHandle) -> Option<T> {
        if !self.owns(handle) {
            return None;
        }
        let value = self.slots[handle.index()].take()?;
        self.release(handle);
        Some(value)
    }

    pub fn get(&self, handle: SlotHandle) -> Option<&T> {
        if !self.owns(handle) {
            return None;
        }
        self.slots[handle.index()].as_ref()
    }

    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        if !self.owns(handle) {
            return None;
        }
        self.slots[handle.index()].as_mut()
    }

    /// Committed records with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (SlotHandle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(index, slot)| {
                slot.as_ref()
                    .map(|value| (SlotHandle::new(index as u16, self.generations[index]), value))
            })
    }

    fn owns(&self, handle: SlotHandle) -> bool {
        let index = handle.index();
        self.is_owned(index) && self.generations[index] == handle.generation()
    }
}
