//! Compile-time pipeline configuration
//!
//! All knobs are constants. There's no runtime configuration; change these
//! values and rebuild.

/// Number of elements in the staging and shared buffers
pub const BUFFER_CAPACITY: usize = 1024;

/// Priority of both application tasks, one above the idle task
pub const TASK_PRIORITY: u8 = IDLE_PRIORITY + 1;

/// Priority of the scheduler's idle task
pub const IDLE_PRIORITY: u8 = 0;

/// How long the consumer yields to simulate processing, in milliseconds
pub const PROCESSING_DELAY_MS: u32 = 500;

/// Smallest stack, in words, the scheduler accepts for a task
pub const MINIMAL_STACK_SIZE: usize = 128;

/// The producer keeps its staging buffer on its own stack
pub const PRODUCER_STACK_SIZE: usize = MINIMAL_STACK_SIZE + BUFFER_CAPACITY;

/// Consumer stack size, in words
pub const CONSUMER_STACK_SIZE: usize = MINIMAL_STACK_SIZE;

/// DMA channel used for the software-requested memory copy
pub const DMA_CHANNEL: usize = 7;

/// Describes how a task is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskConfig {
    /// Task name, reported in spawn errors and logs
    pub name: &'static str,
    /// Stack size, in words
    pub stack_size: usize,
    /// Scheduling priority; higher runs first
    pub priority: u8,
}

/// Producer task configuration
pub const PRODUCER: TaskConfig = TaskConfig {
    name: "producer",
    stack_size: PRODUCER_STACK_SIZE,
    priority: TASK_PRIORITY,
};

/// Consumer task configuration
pub const CONSUMER: TaskConfig = TaskConfig {
    name: "consumer",
    stack_size: CONSUMER_STACK_SIZE,
    priority: TASK_PRIORITY,
};
