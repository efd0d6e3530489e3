//! The consumer task

use crate::{
    config,
    delay::Delay,
    dma::Element,
    handoff::{Owner, TaskContext},
    indicator::Indicator,
};

use core::{
    convert::Infallible,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

/// The default processing step: clear the first element
pub fn clear_first<E: Element>(data: &mut [E]) {
    if let Some(first) = data.first_mut() {
        *first = E::ZERO;
    }
}

/// Where the consumer is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    /// Waiting for the producer to hand over the shared buffer
    AwaitReady,
    /// Processing the shared buffer, then yielding for the processing delay
    Process,
    /// Handing the shared buffer back to the producer
    SignalConsumed,
}

/// The consumer task
///
/// `Consumer` is a future that never resolves. Each cycle it waits for
/// data, processes the shared buffer, yields for
/// [`PROCESSING_DELAY_MS`](config::PROCESSING_DELAY_MS), and gives the
/// buffer back.
pub struct Consumer<'a, E, I, D, P, const N: usize = { config::BUFFER_CAPACITY }> {
    context: TaskContext<'a, E, N>,
    indicator: I,
    delay: D,
    processor: P,
    state: ConsumerState,
    delaying: bool,
    cycles: u32,
}

impl<'a, E, I, D, const N: usize> Consumer<'a, E, I, D, fn(&mut [E]), N>
where
    E: Element,
    I: Indicator,
    D: Delay,
{
    /// Create a consumer that runs [`clear_first`] on each buffer
    pub fn new(context: TaskContext<'a, E, N>, indicator: I, delay: D) -> Self {
        Consumer::with_processor(context, indicator, delay, clear_first::<E> as fn(&mut [E]))
    }
}

impl<'a, E, I, D, P, const N: usize> Consumer<'a, E, I, D, P, N>
where
    E: Element,
    I: Indicator,
    D: Delay,
    P: FnMut(&mut [E]),
{
    /// Create a consumer that runs `processor` on each buffer
    pub fn with_processor(
        context: TaskContext<'a, E, N>,
        indicator: I,
        delay: D,
        processor: P,
    ) -> Self {
        Consumer {
            context,
            indicator,
            delay,
            processor,
            state: ConsumerState::AwaitReady,
            delaying: false,
            cycles: 0,
        }
    }

    /// Returns the consumer's current state
    pub fn state(&self) -> ConsumerState {
        self.state
    }

    /// Returns how many buffers the consumer has given back
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    fn step(&mut self, cx: &mut Context<'_>) -> Poll<Infallible> {
        let buffer = self.context.buffer();
        let semaphores = self.context.semaphores();
        loop {
            match self.state {
                ConsumerState::AwaitReady => {
                    core::task::ready!(semaphores.data_ready().poll_take(cx));
                    self.state = ConsumerState::Process;
                }
                ConsumerState::Process => {
                    if !self.delaying {
                        assert_eq!(
                            buffer.owner(),
                            Owner::Consumer,
                            "data ready without the shared buffer"
                        );
                        self.indicator.toggle();
                        // Safety: the producer handed us the buffer before
                        // giving data_ready. The reference is gone before
                        // we hand it back.
                        let data = unsafe { buffer.contents_mut() };
                        (self.processor)(&mut data[..]);
                        self.delay.start(config::PROCESSING_DELAY_MS);
                        self.delaying = true;
                    }
                    core::task::ready!(self.delay.poll_elapsed(cx));
                    self.delaying = false;
                    self.state = ConsumerState::SignalConsumed;
                }
                ConsumerState::SignalConsumed => {
                    buffer.hand_over(Owner::Consumer, Owner::Producer);
                    semaphores.data_consumed().give();
                    self.cycles = self.cycles.wrapping_add(1);
                    log::trace!("Consumed buffer {}", self.cycles);
                    self.state = ConsumerState::AwaitReady;
                }
            }
        }
    }
}

// No field is structurally pinned.
impl<E, I, D, P, const N: usize> Unpin for Consumer<'_, E, I, D, P, N> {}

impl<E, I, D, P, const N: usize> Future for Consumer<'_, E, I, D, P, N>
where
    E: Element,
    I: Indicator,
    D: Delay,
    P: FnMut(&mut [E]),
{
    type Output = Infallible;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Infallible> {
        self.get_mut().step(cx)
    }
}
