//! DMA completion signaling
//!
//! The transfer service reports completion from interrupt context by
//! calling [`CompletionSignal::on_complete`]. The producer task waits
//! on the same signal with [`CompletionSignal::wait`].

use crate::{semaphore::BinarySemaphore, Error, Status};
use core::{
    future::Future,
    pin::Pin,
    sync::atomic::{AtomicBool, AtomicU32, Ordering},
    task::{Context, Poll},
};

/// Bridges an interrupt-context completion callback to a waiting task
///
/// A successful completion gives the inner semaphore. A failed completion
/// latches a fault that never clears; every later wait resolves with that
/// fault.
pub struct CompletionSignal {
    done: BinarySemaphore,
    faulted: AtomicBool,
    status: AtomicU32,
}

impl CompletionSignal {
    /// Create a signal with no pending completion and no fault
    pub const fn new() -> Self {
        CompletionSignal {
            done: BinarySemaphore::new(),
            faulted: AtomicBool::new(false),
            status: AtomicU32::new(0),
        }
    }

    /// Handle a transfer completion
    ///
    /// Call this from the DMA interrupt handler, once per submitted
    /// transfer. It never blocks.
    pub fn on_complete(&self, status: Status) {
        match status {
            Status::Success => {
                self.done.give();
            }
            Status::Failure(raw) => {
                // Only the first failure is kept.
                if !self.faulted.load(Ordering::Acquire) {
                    self.status.store(raw, Ordering::Relaxed);
                    self.faulted.store(true, Ordering::Release);
                }
                self.done.wake();
            }
        }
    }

    /// Returns the latched fault, if a transfer has failed
    pub fn fault(&self) -> Option<Error> {
        if self.faulted.load(Ordering::Acquire) {
            Some(Error::Transfer {
                status: self.status.load(Ordering::Relaxed),
            })
        } else {
            None
        }
    }

    /// Wait for the outstanding transfer to complete
    pub fn wait(&self) -> Wait<'_> {
        Wait { signal: self }
    }

    /// Poll for completion, registering `cx`'s waker if it's still outstanding
    pub fn poll_wait(&self, cx: &mut Context<'_>) -> Poll<crate::Result<()>> {
        if let Some(fault) = self.fault() {
            return Poll::Ready(Err(fault));
        }
        if self.done.poll_take(cx).is_ready() {
            return Poll::Ready(Ok(()));
        }
        // The failure may have landed before the waker was parked.
        match self.fault() {
            Some(fault) => Poll::Ready(Err(fault)),
            None => Poll::Pending,
        }
    }

    /// The semaphore given on every successful completion
    pub fn semaphore(&self) -> &BinarySemaphore {
        &self.done
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`CompletionSignal::wait`]
pub struct Wait<'a> {
    signal: &'a CompletionSignal,
}

impl Future for Wait<'_> {
    type Output = crate::Result<()>;
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.signal.poll_wait(cx)
    }
}
