//! A simulated single-core system: a cooperative scheduler, a DMA engine
//! whose interrupts fire on demand, and a manual clock.

use dma_handoff::{
    config::TaskConfig, Delay, Indicator, Owner, Request, Spawn, SpawnError, Status, System,
    TransferService,
};

use std::{
    cell::{Cell, RefCell},
    future::Future,
    pin::Pin,
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    task::{Context, Poll, Wake, Waker},
};

struct Flag(AtomicBool);

impl Wake for Flag {
    fn wake(self: Arc<Self>) {
        self.0.store(true, Ordering::SeqCst);
    }
}

struct Task<'a> {
    name: &'static str,
    future: Pin<Box<dyn Future<Output = ()> + 'a>>,
    flag: Arc<Flag>,
    done: bool,
}

/// Runs tasks whose wakers have fired, in spawn order
pub struct Scheduler<'a> {
    capacity: usize,
    tasks: Vec<Task<'a>>,
}

impl<'a> Scheduler<'a> {
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX)
    }

    /// A scheduler that refuses tasks beyond the first `capacity`
    pub fn with_capacity(capacity: usize) -> Self {
        Scheduler {
            capacity,
            tasks: Vec::new(),
        }
    }

    /// Poll woken tasks until none are runnable; returns the number of polls
    pub fn run(&mut self) -> usize {
        let mut polls = 0;
        loop {
            let mut progressed = false;
            for task in self.tasks.iter_mut().filter(|task| !task.done) {
                if task.flag.0.swap(false, Ordering::SeqCst) {
                    let waker = Waker::from(task.flag.clone());
                    let mut cx = Context::from_waker(&waker);
                    task.done = task.future.as_mut().poll(&mut cx).is_ready();
                    polls += 1;
                    progressed = true;
                }
            }
            if !progressed {
                return polls;
            }
        }
    }

    /// Returns `true` if the named task ran to completion
    pub fn is_done(&self, name: &str) -> bool {
        self.tasks
            .iter()
            .any(|task| task.name == name && task.done)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|task| task.name).collect()
    }
}

impl<'a> Spawn<'a> for Scheduler<'a> {
    fn spawn<F>(&mut self, config: &TaskConfig, task: F) -> Result<(), SpawnError>
    where
        F: Future + 'a,
    {
        if self.tasks.len() >= self.capacity {
            return Err(SpawnError);
        }
        self.tasks.push(Task {
            name: config.name,
            future: Box::pin(async move {
                let _ = task.await;
            }),
            flag: Arc::new(Flag(AtomicBool::new(true))),
            done: false,
        });
        Ok(())
    }
}

#[derive(Default)]
struct DmaState<'a> {
    pending: Option<Request<'a, u32>>,
    submitted: u32,
    /// `data_consumed` takes observed at each submission
    consumed_at_submit: Vec<u32>,
    cancelled: u32,
}

/// A DMA engine that copies when told to, then "interrupts"
#[derive(Clone)]
pub struct SimDma<'a, const N: usize> {
    system: &'a System<u32, N>,
    state: Rc<RefCell<DmaState<'a>>>,
}

impl<'a, const N: usize> SimDma<'a, N> {
    pub fn new(system: &'a System<u32, N>) -> Self {
        SimDma {
            system,
            state: Rc::default(),
        }
    }

    pub fn has_pending(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    /// Finish the outstanding copy; returns `false` if there was none
    pub fn complete(&self, status: Status) -> bool {
        let request = self.state.borrow_mut().pending.take();
        match request {
            Some(request) => {
                if status.is_success() {
                    // Safety: the producer keeps the staging buffer alive
                    // until completion.
                    unsafe { request.copy() };
                }
                request.complete(status);
                true
            }
            None => false,
        }
    }

    pub fn submitted(&self) -> u32 {
        self.state.borrow().submitted
    }

    pub fn consumed_at_submit(&self) -> Vec<u32> {
        self.state.borrow().consumed_at_submit.clone()
    }

    pub fn cancelled(&self) -> u32 {
        self.state.borrow().cancelled
    }
}

unsafe impl<'a, const N: usize> TransferService<'a, u32> for SimDma<'a, N> {
    fn submit(&mut self, request: Request<'a, u32>) {
        let mut state = self.state.borrow_mut();
        assert!(
            state.pending.is_none(),
            "transfer submitted while another is outstanding"
        );
        assert_eq!(self.system.buffer().owner(), Owner::Dma);
        assert_eq!(request.len(), N);
        state.submitted += 1;
        let takes = self.system.semaphores().data_consumed().stats().takes;
        state.consumed_at_submit.push(takes);
        state.pending = Some(request);
    }

    fn cancel(&mut self) {
        let mut state = self.state.borrow_mut();
        if state.pending.take().is_some() {
            state.cancelled += 1;
        }
    }
}

#[derive(Default)]
struct ClockState {
    now: u64,
    timers: Vec<(u64, Waker)>,
}

/// Milliseconds that only move when a test says so
#[derive(Clone, Default)]
pub struct SimClock {
    state: Rc<RefCell<ClockState>>,
}

impl SimClock {
    pub fn advance(&self, ms: u32) {
        let expired: Vec<Waker> = {
            let mut state = self.state.borrow_mut();
            state.now += u64::from(ms);
            let now = state.now;
            let (expired, waiting): (Vec<_>, Vec<_>) = state
                .timers
                .drain(..)
                .partition(|(deadline, _)| *deadline <= now);
            state.timers = waiting;
            expired.into_iter().map(|(_, waker)| waker).collect()
        };
        expired.into_iter().for_each(Waker::wake);
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay {
            clock: self.clone(),
            deadline: None,
        }
    }
}

pub struct SimDelay {
    clock: SimClock,
    deadline: Option<u64>,
}

impl Delay for SimDelay {
    fn start(&mut self, ms: u32) {
        self.deadline = Some(self.clock.state.borrow().now + u64::from(ms));
    }

    fn poll_elapsed(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.clock.state.borrow_mut();
        match self.deadline {
            Some(deadline) if deadline > state.now => {
                state.timers.push((deadline, cx.waker().clone()));
                Poll::Pending
            }
            _ => {
                self.deadline = None;
                Poll::Ready(())
            }
        }
    }
}

/// Counts toggles; clones share the count, like two tasks sharing an LED
#[derive(Clone, Default)]
pub struct Led(Rc<Cell<u32>>);

impl Led {
    pub fn toggles(&self) -> u32 {
        self.0.get()
    }
}

impl Indicator for Led {
    fn toggle(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}
