use std::{fmt, marker::PhantomData};

use crate::{
    dsp::{Envelope, Filter, Lfo},
    error::AllocError,
};

/*
Notes borrow their envelopes, LFOs and filters from slabs sized up front.
A slab never grows: `alloc` takes a free slot or fails, `free` returns it.

Handles carry the slot index plus the slot's generation at allocation time.
Freeing bumps the generation, so a stale handle kept by mistake reads as
`None` instead of aliasing whichever note got the slot next.
*/

pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .finish()
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub struct Slab<T> {
    kind: &'static str,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Slab<T> {
    pub fn with_capacity(kind: &'static str, capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                generation: 0,
                value: None,
            })
            .collect();
        // pop from the back hands out low indices first
        let free = (0..capacity as u32).rev().collect();
        Self { kind, slots, free }
    }

    pub fn alloc(&mut self, value: T) -> Result<Handle<T>, AllocError> {
        let Some(index) = self.free.pop() else {
            tracing::warn!(kind = self.kind, capacity = self.capacity(), "slab exhausted");
            return Err(AllocError::Exhausted {
                kind: self.kind,
                capacity: self.capacity(),
            });
        };
        let slot = &mut self.slots[index as usize];
        slot.value = Some(value);
        Ok(Handle {
            index,
            generation: slot.generation,
            _marker: PhantomData,
        })
    }

    /// Return a slot. Stale handles are ignored and yield `None`.
    pub fn free(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Some(value)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn ensure_available(&self, needed: usize) -> Result<(), AllocError> {
        if self.available() >= needed {
            return Ok(());
        }
        tracing::warn!(
            kind = self.kind,
            available = self.available(),
            needed,
            "slab too full"
        );
        Err(AllocError::Exhausted {
            kind: self.kind,
            capacity: self.capacity(),
        })
    }
}

/// A type that lives in one of the [`Allocator`]'s slabs.
pub trait Pooled: Sized {
    fn slab(memory: &Allocator) -> &Slab<Self>;
    fn slab_mut(memory: &mut Allocator) -> &mut Slab<Self>;
}

pub const ENVELOPES_PER_NOTE: usize = 3;
pub const LFOS_PER_NOTE: usize = 3;
pub const FILTERS_PER_NOTE: usize = 2;

/// Storage for every modulation source a group of notes can hold at once.
pub struct Allocator {
    envelopes: Slab<Envelope>,
    lfos: Slab<Lfo>,
    filters: Slab<Filter>,
}

impl Allocator {
    pub fn new(envelopes: usize, lfos: usize, filters: usize) -> Self {
        tracing::debug!(envelopes, lfos, filters, "allocating modulation slabs");
        Self {
            envelopes: Slab::with_capacity("envelope", envelopes),
            lfos: Slab::with_capacity("lfo", lfos),
            filters: Slab::with_capacity("filter", filters),
        }
    }

    /// Room for `notes` simultaneous pad notes.
    pub fn with_notes(notes: usize) -> Self {
        Self::new(
            notes * ENVELOPES_PER_NOTE,
            notes * LFOS_PER_NOTE,
            notes * FILTERS_PER_NOTE,
        )
    }

    pub fn alloc<T: Pooled>(&mut self, value: T) -> Result<Handle<T>, AllocError> {
        T::slab_mut(self).alloc(value)
    }

    pub fn dealloc<T: Pooled>(&mut self, handle: Handle<T>) -> Option<T> {
        T::slab_mut(self).free(handle)
    }

    pub fn get<T: Pooled>(&self, handle: Handle<T>) -> Option<&T> {
        T::slab(self).get(handle)
    }

    pub fn get_mut<T: Pooled>(&mut self, handle: Handle<T>) -> Option<&mut T> {
        T::slab_mut(self).get_mut(handle)
    }

    pub fn available<T: Pooled>(&self) -> usize {
        T::slab(self).available()
    }

    /// Fails with the first slab that cannot hold one more note's sources.
    pub fn ensure_room_for_note(&self) -> Result<(), AllocError> {
        self.envelopes.ensure_available(ENVELOPES_PER_NOTE)?;
        self.lfos.ensure_available(LFOS_PER_NOTE)?;
        self.filters.ensure_available(FILTERS_PER_NOTE)
    }
}

impl Pooled for Envelope {
    fn slab(memory: &Allocator) -> &Slab<Self> {
        &memory.envelopes
    }
    fn slab_mut(memory: &mut Allocator) -> &mut Slab<Self> {
        &mut memory.envelopes
    }
}

impl Pooled for Lfo {
    fn slab(memory: &Allocator) -> &Slab<Self> {
        &memory.lfos
    }
    fn slab_mut(memory: &mut Allocator) -> &mut Slab<Self> {
        &mut memory.lfos
    }
}

impl Pooled for Filter {
    fn slab(memory: &Allocator) -> &Slab<Self> {
        &memory.filters
    }
    fn slab_mut(memory: &mut Allocator) -> &mut Slab<Self> {
        &mut memory.filters
    }
}
