//! Shared handoff state
//!
//! The producer and consumer exchange one buffer through a single-slot
//! mailbox. Two binary semaphores pass ownership of the buffer back and
//! forth:
//!
//! - the producer gives `data_ready` once the shared buffer holds new data,
//! - the consumer gives `data_consumed` once it's done with the data.
//!
//! There is no lock on the buffer. Whoever holds ownership, according to
//! the semaphore protocol, is the only party that may touch it. The
//! buffer tracks its owner so that protocol mistakes panic instead of
//! racing.

use crate::{dma::Element, semaphore::BinarySemaphore};
use core::{
    cell::UnsafeCell,
    sync::atomic::{AtomicU8, Ordering},
};

/// The party that may access the shared buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Owner {
    /// The producer task; the owner at startup
    Producer,
    /// The DMA engine, writing on the producer's behalf
    Dma,
    /// The consumer task
    Consumer,
}

impl Owner {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Owner::Producer,
            1 => Owner::Dma,
            _ => Owner::Consumer,
        }
    }
}

/// The buffer handed from producer to consumer
pub struct SharedBuffer<E, const N: usize> {
    data: UnsafeCell<[E; N]>,
    owner: AtomicU8,
}

// Access to `data` is serialized by the ownership protocol.
unsafe impl<E: Send, const N: usize> Sync for SharedBuffer<E, N> {}

impl<E: Element, const N: usize> SharedBuffer<E, N> {
    /// Create a zeroed buffer, owned by the producer
    pub const fn new() -> Self {
        SharedBuffer {
            data: UnsafeCell::new([E::ZERO; N]),
            owner: AtomicU8::new(Owner::Producer as u8),
        }
    }

    /// Buffer capacity, in elements
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the party that currently owns the buffer
    pub fn owner(&self) -> Owner {
        Owner::from_raw(self.owner.load(Ordering::Acquire))
    }

    /// Move ownership from `from` to `to`
    ///
    /// # Panics
    ///
    /// Panics if `from` isn't the current owner. That's a protocol bug.
    pub(crate) fn hand_over(&self, from: Owner, to: Owner) {
        if let Err(actual) = self.owner.compare_exchange(
            from as u8,
            to as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            panic!(
                "shared buffer handed from {:?} to {:?}, but {:?} owns it",
                from,
                to,
                Owner::from_raw(actual)
            );
        }
    }

    /// Pointer to the first element, for the DMA engine
    pub(crate) fn as_mut_ptr(&self) -> *mut E {
        self.data.get().cast()
    }

    /// # Safety
    ///
    /// The caller must own the buffer, and must drop the returned reference
    /// before handing ownership over.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn contents_mut(&self) -> &mut [E; N] {
        &mut *self.data.get()
    }
}

impl<E: Element, const N: usize> Default for SharedBuffer<E, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// The `data_ready` / `data_consumed` semaphore pair
pub struct HandoffSemaphores {
    data_ready: BinarySemaphore,
    data_consumed: BinarySemaphore,
}

impl HandoffSemaphores {
    /// Create both semaphores, empty
    pub const fn new() -> Self {
        HandoffSemaphores {
            data_ready: BinarySemaphore::new(),
            data_consumed: BinarySemaphore::new(),
        }
    }

    /// Given by the producer once the shared buffer holds new data
    pub fn data_ready(&self) -> &BinarySemaphore {
        &self.data_ready
    }

    /// Given by the consumer once it's done with the shared buffer
    pub fn data_consumed(&self) -> &BinarySemaphore {
        &self.data_consumed
    }
}

impl Default for HandoffSemaphores {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a task needs to take part in the handoff
///
/// Both tasks receive a copy of the same context at startup.
pub struct TaskContext<'a, E, const N: usize> {
    semaphores: &'a HandoffSemaphores,
    buffer: &'a SharedBuffer<E, N>,
}

impl<'a, E, const N: usize> TaskContext<'a, E, N> {
    /// Bundle the handoff semaphores with the shared buffer
    pub const fn new(semaphores: &'a HandoffSemaphores, buffer: &'a SharedBuffer<E, N>) -> Self {
        TaskContext { semaphores, buffer }
    }

    /// The handoff semaphores
    pub fn semaphores(&self) -> &'a HandoffSemaphores {
        self.semaphores
    }

    /// The shared buffer
    pub fn buffer(&self) -> &'a SharedBuffer<E, N> {
        self.buffer
    }
}

impl<E, const N: usize> Clone for TaskContext<'_, E, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, const N: usize> Copy for TaskContext<'_, E, N> {}
