//! Pipeline error and transfer status values

use core::fmt::{self, Debug, Display};

/// The status a DMA transfer service reports when a copy finishes
///
/// `Failure` carries the service's raw error status. The value is opaque
/// to this crate; it's kept so that a supervisor can print why the
/// transfer failed.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The copy completed, and the destination holds the source data
    Success,
    /// The copy failed with the given raw status
    Failure(u32),
}

impl Status {
    /// Returns `true` if this is a successful status
    pub const fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }
}

impl Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => f.write_str("SUCCESS"),
            Status::Failure(raw) => write!(f, "FAILURE({:#010X})", raw),
        }
    }
}

/// A fatal pipeline error
///
/// Every error is unrecoverable. The pipeline stops making progress once
/// one is observed, and the error is handed to whoever supervises the
/// tasks.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The scheduler could not create a task
    Spawn {
        /// Name of the task that was not created
        task: &'static str,
    },
    /// The DMA transfer service reported a failed copy
    Transfer {
        /// Raw status from the transfer service
        status: u32,
    },
}

impl Error {
    /// Returns the raw transfer status, if this is a transfer error
    pub const fn transfer_status(self) -> Option<u32> {
        match self {
            Error::Transfer { status } => Some(status),
            Error::Spawn { .. } => None,
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spawn { task } => write!(f, "SPAWN({})", task),
            Error::Transfer { status } => write!(f, "TRANSFER({:#010X})", status),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spawn { task } => write!(f, "could not create task '{}'", task),
            Error::Transfer { status } => {
                write!(f, "DMA transfer failed with status {:#010X}", status)
            }
        }
    }
}
