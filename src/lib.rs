//! DMA-backed producer/consumer buffer handoff
//!
//! `dma-handoff` moves a fixed-size buffer from a producer task to a consumer
//! task on a single core. The producer fills a private staging buffer and
//! asks a DMA engine to copy it into a shared buffer. An interrupt signals
//! the end of the copy, and two binary semaphores hand the shared buffer to
//! the consumer and back:
//!
//! ```text
//!  producer                     DMA interrupt            consumer
//!  --------                     -------------            --------
//!  generate staging
//!  request_copy  ─────────────▶ copy staging → shared
//!  wait completion ◀──────────  on_complete(Success)
//!  give data_ready ───────────────────────────────────▶  take data_ready
//!  take data_consumed                                     process shared
//!        ◀────────────────────────────────────────────  give data_consumed
//! ```
//!
//! Only one party owns the shared buffer at a time. The producer never
//! requests another copy until the consumer gives the buffer back, so it
//! can't get more than one buffer ahead.
//!
//! The tasks are [`Producer`] and [`Consumer`], futures driven by whatever
//! scheduler you have. The DMA engine sits behind [`TransferService`];
//! route its interrupt to [`CompletionSignal::on_complete`].
//!
//! # Failures
//!
//! Failures stop the pipeline for good. If a DMA transfer fails, the
//! producer future resolves with the error, and never hands over another
//! buffer. If the scheduler can't create a task, [`System::start`] returns
//! the error. Either way, [`halt`] is the fail-stop for firmware.
//!
//! # Critical sections
//!
//! The semaphores use the [`critical-section`](critical_section) crate to
//! share wakers with interrupt handlers. This crate doesn't pick an
//! implementation; the final binary links one. On a single-core Cortex-M,
//! enable `cortex-m`'s `critical-section-single-core` feature.
//!
//! ### License
//!
//! Licensed under either of
//!
//! - [Apache License, Version 2.0](http://www.apache.org/licenses/LICENSE-2.0)
//! - [MIT License](http://opensource.org/licenses/MIT)
//!
//! at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted
//! for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
//! dual licensed as above, without any additional terms or conditions.

#![cfg_attr(not(test), no_std)]

mod completion;
pub mod config;
mod consumer;
mod delay;
mod dma;
mod error;
mod handoff;
mod indicator;
pub mod memcpy;
mod producer;
mod semaphore;
mod system;

pub use completion::{CompletionSignal, Wait};
pub use consumer::{clear_first, Consumer, ConsumerState};
pub use delay::{Delay, NoDelay};
pub use dma::{Element, Request, TransferService};
pub use error::{Error, Status};
pub use handoff::{HandoffSemaphores, Owner, SharedBuffer, TaskContext};
pub use indicator::{Indicator, NoIndicator};
pub use producer::{generate, Producer, ProducerState};
pub use semaphore::{BinarySemaphore, SemaphoreStats, Take};
pub use system::{halt, Spawn, SpawnError, System};

/// A pipeline result
pub type Result<T> = core::result::Result<T, Error>;

use core::{future::Future, pin::Pin, task::Poll};

/// Poll a future with a dummy waker.
///
/// Use `poll_no_wake` when you want to drive a future, but you don't care
/// about the future waking an executor. A minimal firmware loop can poll
/// the producer and consumer with `poll_no_wake`, and sleep until the next
/// interrupt between rounds.
pub fn poll_no_wake<F>(future: Pin<&mut F>) -> Poll<F::Output>
where
    F: Future,
{
    use core::task::{Context, RawWaker, RawWakerVTable, Waker};
    const VTABLE: RawWakerVTable = RawWakerVTable::new(|_| RAW_WAKER, |_| {}, |_| {}, |_| {});

    const RAW_WAKER: RawWaker = RawWaker::new(core::ptr::null(), &VTABLE);
    // Safety: raw waker meets documented requirements.
    let waker = unsafe { Waker::from_raw(RAW_WAKER) };
    let mut context = Context::from_waker(&waker);
    future.poll(&mut context)
}

/// Block until the future returns a result.
///
/// `block` invokes [`poll_no_wake`] in a loop until the future
/// returns a result. Don't `block` on a task; tasks only return on
/// failure. It's meant for one-shot waits, like a semaphore
/// [`take`](BinarySemaphore::take).
pub fn block<F>(mut future: Pin<&mut F>) -> F::Output
where
    F: Future,
{
    loop {
        match poll_no_wake(future.as_mut()) {
            Poll::Ready(result) => return result,
            Poll::Pending => {}
        }
    }
}
