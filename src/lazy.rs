//! Lazily computed, explicitly invalidated values.
//!
//! A [`Cached`] value is computed by the first reader and kept until the
//! owner invalidates it. Reading only needs `&self`; invalidation needs
//! `&mut self`, so a value can never be dropped while someone holds it.

use std::cell::{Cell, OnceCell};

/// A value computed on first access.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    cell: OnceCell<T>,
    computations: Cell<usize>,
}

impl<T> Cached<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
            computations: Cell::new(0),
        }
    }

    /// The cached value, computing it with `compute` if absent.
    pub fn get_or_compute(&self, compute: impl FnOnce() -> T) -> &T {
        self.cell.get_or_init(|| {
            self.computations.set(self.computations.get() + 1);
            compute()
        })
    }

    /// The cached value, if present.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_cached(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Drop the value; the next read recomputes it.
    pub fn invalidate(&mut self) {
        self.cell.take();
    }

    /// How many times the value has been computed.
    pub fn computations(&self) -> usize {
        self.computations.get()
    }
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A fixed number of independently cached values.
#[derive(Debug, Clone)]
pub struct CachedSlots<T> {
    slots: Vec<Cached<T>>,
}

impl<T> CachedSlots<T> {
    pub fn new(len: usize) -> Self {
        let mut slots = Self { slots: Vec::new() };
        slots.resize(len);
        slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Change the number of slots. Surviving slots keep their values.
    pub fn resize(&mut self, len: usize) {
        self.slots.resize_with(len, Cached::new);
    }

    /// The value of slot `i`, computing it if absent.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    pub fn get_or_compute(&self, i: usize, compute: impl FnOnce() -> T) -> &T {
        self.slot(i).get_or_compute(compute)
    }

    pub fn is_cached(&self, i: usize) -> bool {
        self.slot(i).is_cached()
    }

    pub fn invalidate(&mut self, i: usize) {
        self.slots[i].invalidate();
    }

    pub fn invalidate_all(&mut self) {
        for slot in &mut self.slots {
            slot.invalidate();
        }
    }

    pub fn computations(&self, i: usize) -> usize {
        self.slot(i).computations()
    }

    fn slot(&self, i: usize) -> &Cached<T> {
        assert!(i < self.slots.len(), "no cache slot {} (have {})", i, self.slots.len());
        &self.slots[i]
    }
}

impl<T> Default for CachedSlots<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}
