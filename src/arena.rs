// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Generational arena shared by the mesh, the dictionary and the sweep.
//
// Records live in a Vec of slots; freed slots go on a free list and are
// reused with a bumped generation, so a handle kept past the death of its
// record is detected instead of silently aliasing a newer one.

use std::collections::TryReserveError;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A typed handle into an [`Arena<T>`].
pub struct Id<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    #[inline]
    fn new(index: u32, generation: u32) -> Self {
        Id {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot position inside the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for Id<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.index, self.generation).cmp(&(other.index, other.generation))
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Vec-backed record storage with a free list.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    len: usize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Reserve room for `additional` more records.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let missing = additional.saturating_sub(self.free_list.len());
        self.slots.try_reserve(missing)
    }

    /// Store `value`, returning its handle.
    pub fn alloc(&mut self, value: T) -> Id<T> {
        self.len += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.value.is_none());
            slot.value = Some(value);
            return Id::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Id::new(index, 0)
    }

    /// Store the value built by `f`, which receives the handle the value
    /// will live under.
    pub fn alloc_with(&mut self, f: impl FnOnce(Id<T>) -> T) -> Id<T> {
        let id = match self.free_list.last() {
            Some(&index) => Id::new(index, self.slots[index as usize].generation),
            None => Id::new(self.slots.len() as u32, 0),
        };
        let allocated = self.alloc(f(id));
        debug_assert_eq!(allocated, id);
        allocated
    }

    /// Release the record behind `id` and return it.
    ///
    /// Panics if `id` is stale.
    pub fn free(&mut self, id: Id<T>) -> T {
        let slot = &mut self.slots[id.index as usize];
        assert_eq!(slot.generation, id.generation, "stale arena handle {:?}", id);
        let value = slot.value.take().expect("double free of arena handle");
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.len -= 1;
        value
    }

    pub fn get(&self, id: Id<T>) -> Option<&T> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_mut()
    }

    #[inline]
    pub fn contains(&self, id: Id<T>) -> bool {
        self.get(id).is_some()
    }

    /// Number of live records.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every record. Handles issued before the call all become stale.
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_list.push(index as u32);
        }
        self.free_list.reverse();
        self.len = 0;
    }

    /// Handles of the live records, in slot order.
    pub fn ids(&self) -> impl Iterator<Item = Id<T>> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|_| Id::new(index as u32, slot.generation))
        })
    }

    /// Live records with their handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (Id::new(index as u32, slot.generation), value))
        })
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::ops::Index<Id<T>> for Arena<T> {
    type Output = T;

    #[inline]
    fn index(&self, id: Id<T>) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("stale arena handle {:?}", id),
        }
    }
}

impl<T> std::ops::IndexMut<Id<T>> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("stale arena handle {:?}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_and_free_reuses_slot() {
        let mut arena: Arena<u32> = Arena::new();
        let a = arena.alloc(1);
        let b = arena.alloc(2);
        assert_ne!(a, b);
        assert_eq!(arena.free(a), 1);
        let c = arena.alloc(3);
        // Same slot, new generation.
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn stale_handle_is_rejected() {
        let mut arena: Arena<&str> = Arena::new();
        let a = arena.alloc("a");
        arena.free(a);
        let _b = arena.alloc("b");
        assert!(arena.get(a).is_none());
        assert!(!arena.contains(a));
    }

    #[test]
    #[should_panic(expected = "stale arena handle")]
    fn indexing_with_stale_handle_panics() {
        let mut arena: Arena<i32> = Arena::new();
        let a = arena.alloc(7);
        arena.free(a);
        let _ = arena[a];
    }

    #[test]
    fn iteration_skips_freed_records() {
        let mut arena: Arena<i32> = Arena::new();
        let ids: Vec<_> = (0..5).map(|i| arena.alloc(i)).collect();
        arena.free(ids[1]);
        arena.free(ids[3]);
        let live: Vec<i32> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(live, vec![0, 2, 4]);
        assert_eq!(arena.ids().count(), 3);
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut arena: Arena<i32> = Arena::new();
        let a = arena.alloc(1);
        let b = arena.alloc(2);
        arena.clear();
        assert!(arena.is_empty());
        assert!(arena.get(a).is_none());
        assert!(arena.get(b).is_none());
        let c = arena.alloc(3);
        assert_eq!(arena[c], 3);
    }
}
