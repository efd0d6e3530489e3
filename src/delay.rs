//! Scheduler delays

use core::task::{Context, Poll};

/// A non-blocking delay provided by the scheduler
///
/// A task calls [`start`](Delay::start), then polls
/// [`poll_elapsed`](Delay::poll_elapsed) until it's ready. While the delay
/// is pending, other tasks run.
pub trait Delay {
    /// Begin a delay of `ms` milliseconds, replacing any pending delay
    fn start(&mut self, ms: u32);
    /// Returns `Ready` once the delay has elapsed
    ///
    /// Implementations must arrange for `cx`'s waker to be woken when the
    /// delay elapses.
    fn poll_elapsed(&mut self, cx: &mut Context<'_>) -> Poll<()>;
}

impl<D: Delay + ?Sized> Delay for &mut D {
    fn start(&mut self, ms: u32) {
        (**self).start(ms)
    }
    fn poll_elapsed(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        (**self).poll_elapsed(cx)
    }
}

/// A delay that elapses immediately
///
/// Useful when processing time doesn't matter, for example on a host.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

impl Delay for NoDelay {
    fn start(&mut self, _: u32) {}
    fn poll_elapsed(&mut self, _: &mut Context<'_>) -> Poll<()> {
        Poll::Ready(())
    }
}
