//! Binary semaphore shared between tasks and interrupts

use core::{
    cell::RefCell,
    future::Future,
    pin::Pin,
    sync::atomic::{AtomicBool, AtomicU32, Ordering},
    task::{Context, Poll, Waker},
};

use critical_section::Mutex;

type SharedWaker = Mutex<RefCell<Option<Waker>>>;

/// A binary semaphore
///
/// The semaphore is either *empty* or *signaled*. [`give`](Self::give)
/// signals the semaphore, and never blocks; call it from a task or from an
/// interrupt handler. A give on an already-signaled semaphore is dropped:
/// there's at most one pending signal. [`take`](Self::take) returns a future
/// that resolves once it moves the semaphore from signaled to empty.
///
/// The semaphore parks a single waiter. If a second task waits on the same
/// semaphore, it replaces the first task's waker.
pub struct BinarySemaphore {
    signaled: AtomicBool,
    waker: SharedWaker,
    gives: AtomicU32,
    coalesced: AtomicU32,
    takes: AtomicU32,
}

/// Counters describing how a semaphore has been used
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SemaphoreStats {
    /// Gives that moved the semaphore from empty to signaled
    pub gives: u32,
    /// Gives dropped because the semaphore was already signaled
    pub coalesced: u32,
    /// Successful takes
    pub takes: u32,
}

impl BinarySemaphore {
    /// Create an empty semaphore
    pub const fn new() -> Self {
        BinarySemaphore {
            signaled: AtomicBool::new(false),
            waker: Mutex::new(RefCell::new(None)),
            gives: AtomicU32::new(0),
            coalesced: AtomicU32::new(0),
            takes: AtomicU32::new(0),
        }
    }

    /// Signal the semaphore, waking the waiting task
    ///
    /// Returns `false` if the semaphore was already signaled, in which case
    /// this give was dropped.
    pub fn give(&self) -> bool {
        let fresh = !self.signaled.swap(true, Ordering::AcqRel);
        if fresh {
            self.gives.fetch_add(1, Ordering::Relaxed);
        } else {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
        }
        self.wake();
        fresh
    }

    /// Take the semaphore if it's signaled, without waiting
    pub fn try_take(&self) -> bool {
        let taken = self.signaled.swap(false, Ordering::AcqRel);
        if taken {
            self.takes.fetch_add(1, Ordering::Relaxed);
        }
        taken
    }

    /// Wait until the semaphore is signaled, then take it
    ///
    /// There's no timeout. The future resolves only after a give.
    pub fn take(&self) -> Take<'_> {
        Take { semaphore: self }
    }

    /// Poll for the semaphore, registering `cx`'s waker if it's empty
    pub fn poll_take(&self, cx: &mut Context<'_>) -> Poll<()> {
        if self.try_take() {
            return Poll::Ready(());
        }
        critical_section::with(|cs| {
            let mut waker = self.waker.borrow_ref_mut(cs);
            match waker.as_ref() {
                Some(parked) if parked.will_wake(cx.waker()) => {}
                _ => *waker = Some(cx.waker().clone()),
            }
        });
        // A give may have landed between the first check and the
        // waker registration.
        if self.try_take() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }

    /// Returns `true` if a give is pending
    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::Acquire)
    }

    /// Returns a snapshot of this semaphore's counters
    pub fn stats(&self) -> SemaphoreStats {
        SemaphoreStats {
            gives: self.gives.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            takes: self.takes.load(Ordering::Relaxed),
        }
    }

    /// Wake the parked task without signaling
    pub(crate) fn wake(&self) {
        critical_section::with(|cs| {
            if let Some(waker) = self.waker.borrow_ref_mut(cs).take() {
                waker.wake();
            }
        });
    }
}

impl Default for BinarySemaphore {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`BinarySemaphore::take`]
pub struct Take<'a> {
    semaphore: &'a BinarySemaphore,
}

impl Future for Take<'_> {
    type Output = ();
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.semaphore.poll_take(cx)
    }
}
