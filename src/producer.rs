//! The producer task
//!
//! The producer runs this cycle forever:
//!
//! 1. `Generate`: fill the private staging buffer.
//! 2. `RequestTransfer`: toggle the indicator, and ask the DMA engine to
//!    copy the staging buffer into the shared buffer.
//! 3. `AwaitTransferDone`: wait for the DMA completion signal.
//! 4. `SignalReady`: hand the shared buffer to the consumer.
//! 5. `AwaitConsumed`: wait for the consumer to hand it back.
//!
//! The producer can't get more than one buffer ahead of the consumer. It
//! won't request another copy until the consumer has given up the shared
//! buffer.

use crate::{
    completion::CompletionSignal,
    config,
    dma::{Element, TransferService},
    handoff::{Owner, TaskContext},
    indicator::Indicator,
    memcpy, Error,
};

use core::{
    future::Future,
    marker::PhantomPinned,
    pin::Pin,
    task::{Context, Poll},
};

/// Fill `staging` with the data for pass `pass`
///
/// Element `i` becomes `i + pass`. This stands in for real data
/// acquisition.
pub fn generate<E: Element>(staging: &mut [E], pass: u32) {
    for (idx, elem) in staging.iter_mut().enumerate() {
        *elem = E::sequence(idx, pass);
    }
}

/// Where the producer is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    /// Filling the staging buffer
    Generate,
    /// Submitting the copy to the DMA engine
    RequestTransfer,
    /// Waiting for the copy to complete
    AwaitTransferDone,
    /// Handing the shared buffer to the consumer
    SignalReady,
    /// Waiting for the consumer to give the buffer back
    AwaitConsumed,
    /// A transfer failed; the producer will never run again
    Faulted(Error),
}

/// The producer task
///
/// `Producer` is a future that runs the producer cycle. It only resolves
/// if a DMA transfer fails, and it resolves with that error.
///
/// The DMA engine reads from the staging buffer, which lives inside this
/// future. The future must stay pinned while a transfer is outstanding.
/// Dropping the future cancels an outstanding transfer.
pub struct Producer<'a, E, S, I, const N: usize = { config::BUFFER_CAPACITY }>
where
    E: Element,
    S: TransferService<'a, E>,
    I: Indicator,
{
    context: TaskContext<'a, E, N>,
    completion: &'a CompletionSignal,
    service: S,
    indicator: I,
    channel: usize,
    staging: [E; N],
    passes: u32,
    state: ProducerState,
    _pinned: PhantomPinned,
}

impl<'a, E, S, I, const N: usize> Producer<'a, E, S, I, N>
where
    E: Element,
    S: TransferService<'a, E>,
    I: Indicator,
{
    /// Create a producer that submits copies to `service`
    ///
    /// `completion` must be the signal that `service` completes.
    pub fn new(
        context: TaskContext<'a, E, N>,
        completion: &'a CompletionSignal,
        service: S,
        indicator: I,
    ) -> Self {
        Producer {
            context,
            completion,
            service,
            indicator,
            channel: config::DMA_CHANNEL,
            staging: [E::ZERO; N],
            passes: 0,
            state: ProducerState::Generate,
            _pinned: PhantomPinned,
        }
    }

    /// Use DMA channel `channel` instead of [`config::DMA_CHANNEL`]
    pub fn with_channel(mut self, channel: usize) -> Self {
        self.channel = channel;
        self
    }

    /// Returns the producer's current state
    pub fn state(&self) -> ProducerState {
        self.state
    }

    /// Returns how many cycles the producer has completed
    ///
    /// This is also the pass value for the next `Generate`.
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// The staging buffer contents
    pub fn staging(&self) -> &[E; N] {
        &self.staging
    }

    /// The transfer service
    pub fn service(&self) -> &S {
        &self.service
    }

    fn step(&mut self, cx: &mut Context<'_>) -> Poll<Error> {
        let buffer = self.context.buffer();
        let semaphores = self.context.semaphores();
        loop {
            match self.state {
                ProducerState::Generate => {
                    generate(&mut self.staging, self.passes);
                    self.state = ProducerState::RequestTransfer;
                }
                ProducerState::RequestTransfer => {
                    self.indicator.toggle();
                    // Safety: the future is pinned, so the staging buffer
                    // doesn't move. It's not written again until the
                    // completion signal resolves, and dropping the future
                    // cancels the transfer.
                    unsafe {
                        memcpy::request_copy(
                            &mut self.service,
                            buffer,
                            &self.staging,
                            N,
                            self.channel,
                            self.completion,
                        )
                    };
                    self.state = ProducerState::AwaitTransferDone;
                }
                ProducerState::AwaitTransferDone => match self.completion.poll_wait(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Ok(())) => {
                        memcpy::finish_copy(buffer);
                        self.state = ProducerState::SignalReady;
                    }
                    Poll::Ready(Err(err)) => {
                        log::error!("Producer stopped on pass {}: {}", self.passes, err);
                        self.state = ProducerState::Faulted(err);
                    }
                },
                ProducerState::SignalReady => {
                    buffer.hand_over(Owner::Producer, Owner::Consumer);
                    semaphores.data_ready().give();
                    log::debug!("Pass {} ready", self.passes);
                    self.state = ProducerState::AwaitConsumed;
                }
                ProducerState::AwaitConsumed => {
                    core::task::ready!(semaphores.data_consumed().poll_take(cx));
                    self.passes = self.passes.wrapping_add(1);
                    self.state = ProducerState::Generate;
                }
                ProducerState::Faulted(err) => return Poll::Ready(err),
            }
        }
    }
}

impl<'a, E, S, I, const N: usize> Future for Producer<'a, E, S, I, N>
where
    E: Element,
    S: TransferService<'a, E>,
    I: Indicator,
{
    type Output = Error;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Error> {
        // Safety: data not moved
        let this = unsafe { self.get_unchecked_mut() };
        this.step(cx)
    }
}

impl<'a, E, S, I, const N: usize> Drop for Producer<'a, E, S, I, N>
where
    E: Element,
    S: TransferService<'a, E>,
    I: Indicator,
{
    fn drop(&mut self) {
        if self.state == ProducerState::AwaitTransferDone {
            self.service.cancel();
        }
    }
}
