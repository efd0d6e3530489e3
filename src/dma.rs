//! DMA transfer service interface
//!
//! The pipeline doesn't drive DMA hardware. It hands [`Request`]s to a
//! [`TransferService`], which copies the data in the background and
//! reports back through the request's [`CompletionSignal`].

use crate::{completion::CompletionSignal, Status};

mod private {
    pub trait Sealed {}
}

/// An element of a DMA buffer
///
/// Elements are fixed-width unsigned integers. The trait is sealed.
pub trait Element: private::Sealed + Copy + Eq + core::fmt::Debug + Send + 'static {
    /// The all-zero element
    const ZERO: Self;
    /// The element produced for buffer position `index` during pass `pass`
    ///
    /// Computes `index + pass`, wrapping at the element's width.
    fn sequence(index: usize, pass: u32) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty),+) => {
        $(
            impl private::Sealed for $ty {}
            impl Element for $ty {
                const ZERO: Self = 0;
                #[inline]
                fn sequence(index: usize, pass: u32) -> Self {
                    (index as $ty).wrapping_add(pass as $ty)
                }
            }
        )+
    };
}

impl_element!(u8, u16, u32, u64);

/// A memory-to-memory copy request
///
/// Describes `len` elements read from `source` and written to
/// `destination`, and the signal that must be completed when the copy
/// ends.
pub struct Request<'a, E> {
    destination: *mut E,
    source: *const E,
    len: usize,
    channel: usize,
    completion: &'a CompletionSignal,
}

impl<'a, E: Element> Request<'a, E> {
    /// # Safety
    ///
    /// `source` must be valid for `len` reads, and `destination` for `len`
    /// writes, until the completion is signaled. No one else may access
    /// `destination` in that time, and no one may write `source`.
    pub(crate) unsafe fn new(
        destination: *mut E,
        source: *const E,
        len: usize,
        channel: usize,
        completion: &'a CompletionSignal,
    ) -> Self {
        Request {
            destination,
            source,
            len,
            channel,
            completion,
        }
    }

    /// Start of the destination buffer
    pub fn destination(&self) -> *mut E {
        self.destination
    }

    /// Start of the source buffer
    pub fn source(&self) -> *const E {
        self.source
    }

    /// Number of elements to copy
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there's nothing to copy
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The DMA channel that should perform the copy
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// The signal to complete once the copy ends
    pub fn completion(&self) -> &'a CompletionSignal {
        self.completion
    }

    /// Copy the data with the CPU
    ///
    /// For services that have no hardware behind a channel. This only
    /// moves the data; the service still reports completion.
    ///
    /// # Safety
    ///
    /// Call this at most once, before completing the request.
    pub unsafe fn copy(&self) {
        core::ptr::copy_nonoverlapping(self.source, self.destination, self.len);
    }

    /// Report the outcome of the copy, consuming the request
    pub fn complete(self, status: Status) {
        self.completion.on_complete(status);
    }
}

// Requests move into the transfer service, which may hand them to
// interrupt context. The pointers are owned by the transfer for its
// lifetime.
unsafe impl<E: Send> Send for Request<'_, E> {}

/// A service that performs memory copies asynchronously
///
/// # Safety
///
/// Implementations must complete every submitted request exactly once,
/// usually from the DMA interrupt handler. Until then they may access
/// the request's buffers; afterwards they must not.
///
/// [`cancel`](Self::cancel) must stop the copy before it returns. Once
/// cancelled, a request's buffers may be freed, so the service must not
/// touch them, nor complete the request.
pub unsafe trait TransferService<'a, E: Element> {
    /// Start the copy described by `request`, returning immediately
    fn submit(&mut self, request: Request<'a, E>);

    /// Abandon the outstanding copy, if any
    ///
    /// The producer calls `cancel` when it's dropped with a copy
    /// outstanding. Its staging buffer goes away right after.
    fn cancel(&mut self);
}
