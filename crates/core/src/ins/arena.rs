//! Generation-checked arena of INS instances
//!
//! Callers that address estimators by opaque id (one per vehicle) go through
//! [`InsArena`]: `alloc` hands out an [`InsHandle`] whose generation is
//! checked on every access, so a handle kept across a `release` surfaces as
//! an error instead of silently reading a recycled slot.

use heapless::Vec;

use super::config::InsConfig;
use super::error::InsError;
use super::filter::InsFilter;

/// Opaque handle to one arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsHandle {
    index: u16,
    generation: u16,
}

struct Slot {
    filter: InsFilter,
    generation: u16,
    live: bool,
}

/// Fixed-capacity arena of [`InsFilter`] instances
///
/// `N` is the maximum number of concurrently allocated estimators.
pub struct InsArena<const N: usize> {
    slots: Vec<Slot, N>,
}

impl<const N: usize> InsArena<N> {
    /// Create an empty arena.
    ///
    /// `N` must fit the handle's index range; larger capacities fail to
    /// compile.
    pub fn new() -> Self {
        const { assert!(N <= u16::MAX as usize + 1) };
        Self { slots: Vec::new() }
    }

    /// Allocate a fresh estimator at the canonical prior.
    ///
    /// Fails with [`InsError::Exhausted`] when all `N` slots are live.
    pub fn alloc(&mut self, config: InsConfig) -> Result<InsHandle, InsError> {
        // Prefer recycling a released slot; its generation was bumped on
        // release so stale handles cannot alias it.
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.live {
                slot.filter = InsFilter::new(config);
                slot.live = true;
                return Ok(InsHandle {
                    index: index as u16,
                    generation: slot.generation,
                });
            }
        }

        let index = self.slots.len();
        self.slots
            .push(Slot {
                filter: InsFilter::new(config),
                generation: 0,
                live: true,
            })
            .map_err(|_| InsError::Exhausted)?;
        Ok(InsHandle {
            index: index as u16,
            generation: 0,
        })
    }

    /// Borrow the estimator behind `handle`.
    pub fn get(&self, handle: InsHandle) -> Result<&InsFilter, InsError> {
        match self.slots.get(handle.index as usize) {
            Some(slot) if slot.live && slot.generation == handle.generation => Ok(&slot.filter),
            _ => Err(InsError::StaleHandle),
        }
    }

    /// Mutably borrow the estimator behind `handle`.
    pub fn get_mut(&mut self, handle: InsHandle) -> Result<&mut InsFilter, InsError> {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.live && slot.generation == handle.generation => Ok(&mut slot.filter),
            _ => Err(InsError::StaleHandle),
        }
    }

    /// Release the slot behind `handle`; outstanding copies of the handle
    /// become stale.
    pub fn release(&mut self, handle: InsHandle) -> Result<(), InsError> {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.live && slot.generation == handle.generation => {
                slot.live = false;
                slot.generation = slot.generation.wrapping_add(1);
                Ok(())
            }
            _ => Err(InsError::StaleHandle),
        }
    }

    /// Number of live estimators.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.live).count()
    }

    /// True when no estimator is allocated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const N: usize> Default for InsArena<N> {
    fn default() -> Self {
        Self::new()
    }
}
