//! DMA-powered copy into the shared buffer

use crate::{
    completion::CompletionSignal,
    dma::{Element, Request, TransferService},
    handoff::{Owner, SharedBuffer},
};

/// Ask `service` to copy the first `len` elements of `source` into
/// `destination`
///
/// Returns as soon as the request is submitted. Ownership of the shared
/// buffer moves from the producer to the DMA engine; `completion` is
/// signaled when the copy ends. Wait on `completion`, and then hand the
/// buffer back with [`finish_copy`].
///
/// # Panics
///
/// Panics if `len` exceeds the buffer capacity or the length of `source`,
/// or if the producer doesn't own `destination`.
///
/// # Safety
///
/// `source` must not be moved, written or freed until `completion` is
/// signaled, or until the request is cancelled with
/// [`TransferService::cancel`].
pub unsafe fn request_copy<'a, E, S, const N: usize>(
    service: &mut S,
    destination: &'a SharedBuffer<E, N>,
    source: &[E],
    len: usize,
    channel: usize,
    completion: &'a CompletionSignal,
) where
    E: Element,
    S: TransferService<'a, E>,
{
    assert!(
        len <= N,
        "copy of {} elements exceeds buffer capacity {}",
        len,
        N
    );
    assert!(
        len <= source.len(),
        "copy of {} elements exceeds source length {}",
        len,
        source.len()
    );

    destination.hand_over(Owner::Producer, Owner::Dma);
    // Prevent preceding writes to the source from being moved past the
    // submission.
    core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::Release);

    let request = Request::new(
        destination.as_mut_ptr(),
        source.as_ptr(),
        len,
        channel,
        completion,
    );
    service.submit(request);
}

/// Return the shared buffer to the producer after a successful copy
pub fn finish_copy<E: Element, const N: usize>(destination: &SharedBuffer<E, N>) {
    core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::Acquire);
    destination.hand_over(Owner::Dma, Owner::Producer);
}
