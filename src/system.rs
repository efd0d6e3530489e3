//! System startup and fail-stop

use crate::{
    completion::CompletionSignal,
    config::{self, TaskConfig},
    consumer::Consumer,
    delay::Delay,
    dma::{Element, TransferService},
    handoff::{HandoffSemaphores, SharedBuffer, TaskContext},
    indicator::Indicator,
    producer::Producer,
    Error,
};

use core::future::Future;

/// The scheduler refused to create a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnError;

/// A scheduler that can run tasks
///
/// The scheduler owns each spawned task for the rest of the program, and
/// polls it whenever its waker fires.
pub trait Spawn<'a> {
    /// Create a task that runs `task`
    ///
    /// `task` hasn't been polled yet; the scheduler should pin it before
    /// polling it.
    fn spawn<F>(&mut self, config: &TaskConfig, task: F) -> Result<(), SpawnError>
    where
        F: Future + 'a;
}

/// All state shared by the pipeline's tasks and the DMA interrupt
///
/// Construct the system once, for the lifetime of the program. `new` is
/// `const`, so the system can be a `static`:
///
/// ```
/// use dma_handoff::System;
///
/// static SYSTEM: System<u32> = System::new();
/// assert!(SYSTEM.fault().is_none());
/// ```
pub struct System<E, const N: usize = { config::BUFFER_CAPACITY }> {
    semaphores: HandoffSemaphores,
    buffer: SharedBuffer<E, N>,
    completion: CompletionSignal,
}

impl<E: Element, const N: usize> System<E, N> {
    /// Create the semaphores, shared buffer and completion signal
    pub const fn new() -> Self {
        System {
            semaphores: HandoffSemaphores::new(),
            buffer: SharedBuffer::new(),
            completion: CompletionSignal::new(),
        }
    }

    /// The context handed to both tasks
    pub fn context(&self) -> TaskContext<'_, E, N> {
        TaskContext::new(&self.semaphores, &self.buffer)
    }

    /// The signal the DMA interrupt handler completes
    pub fn completion(&self) -> &CompletionSignal {
        &self.completion
    }

    /// The handoff semaphores
    pub fn semaphores(&self) -> &HandoffSemaphores {
        &self.semaphores
    }

    /// The shared buffer
    pub fn buffer(&self) -> &SharedBuffer<E, N> {
        &self.buffer
    }

    /// Returns the fault that stopped the pipeline, if any
    pub fn fault(&self) -> Option<Error> {
        self.completion.fault()
    }

    /// Spawn the producer and the consumer
    ///
    /// The producer copies through `service`. A spawn failure is fatal;
    /// the caller should [`halt`] with the returned error.
    pub fn start<'a, T, S, I, J, D>(
        &'a self,
        spawner: &mut T,
        service: S,
        producer_indicator: I,
        consumer_indicator: J,
        delay: D,
    ) -> crate::Result<()>
    where
        T: Spawn<'a>,
        S: TransferService<'a, E> + 'a,
        I: Indicator + 'a,
        J: Indicator + 'a,
        D: Delay + 'a,
    {
        let producer = Producer::new(self.context(), &self.completion, service, producer_indicator);
        spawn(spawner, &config::PRODUCER, producer)?;

        let consumer = Consumer::new(self.context(), consumer_indicator, delay);
        spawn(spawner, &config::CONSUMER, consumer)?;

        log::info!(
            "Started {} and {} with {} element buffers",
            config::PRODUCER.name,
            config::CONSUMER.name,
            N
        );
        Ok(())
    }
}

impl<E: Element, const N: usize> Default for System<E, N> {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn<'a, T, F>(spawner: &mut T, config: &TaskConfig, task: F) -> crate::Result<()>
where
    T: Spawn<'a>,
    F: Future + 'a,
{
    spawner.spawn(config, task).map_err(|SpawnError| {
        log::error!("Could not create task '{}'", config.name);
        Error::Spawn { task: config.name }
    })
}

/// Stop all forward progress
///
/// Logs `error`, then parks the core forever. Interrupts still run, but
/// nothing returns to the tasks.
pub fn halt(error: Error) -> ! {
    log::error!("Halting: {}", error);
    loop {
        #[cfg(target_arch = "arm")]
        cortex_m::asm::wfi();
        #[cfg(not(target_arch = "arm"))]
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{delay::NoDelay, dma::Request, NoIndicator};

    /// Accepts the first `capacity` tasks, and records their names
    struct Slots {
        capacity: usize,
        names: Vec<&'static str>,
    }

    impl<'a> Spawn<'a> for Slots {
        fn spawn<F>(&mut self, config: &TaskConfig, _: F) -> Result<(), SpawnError>
        where
            F: Future + 'a,
        {
            if self.names.len() < self.capacity {
                self.names.push(config.name);
                Ok(())
            } else {
                Err(SpawnError)
            }
        }
    }

    struct Discard;

    unsafe impl<'a> TransferService<'a, u32> for Discard {
        fn submit(&mut self, _: Request<'a, u32>) {}
        fn cancel(&mut self) {}
    }

    #[test]
    fn start_spawns_both_tasks() {
        let system = System::<u32, 8>::new();
        let mut slots = Slots {
            capacity: 2,
            names: Vec::new(),
        };
        let started = system.start(&mut slots, Discard, NoIndicator, NoIndicator, NoDelay);
        assert_eq!(started, Ok(()));
        assert_eq!(slots.names, ["producer", "consumer"]);
    }

    #[test]
    fn spawn_failure_is_reported() {
        let system = System::<u32, 8>::new();
        let mut slots = Slots {
            capacity: 1,
            names: Vec::new(),
        };
        let started = system.start(&mut slots, Discard, NoIndicator, NoIndicator, NoDelay);
        assert_eq!(started, Err(Error::Spawn { task: "consumer" }));
        assert_eq!(system.fault(), None);
    }
}
