//! Observability output

/// A binary output, like an LED, toggled as the pipeline runs
///
/// The indicator is only for people watching the board. It has no effect
/// on the handoff protocol.
pub trait Indicator {
    /// Flip the output
    fn toggle(&mut self);
}

/// An indicator that isn't connected to anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIndicator;

impl Indicator for NoIndicator {
    fn toggle(&mut self) {}
}

impl<I: Indicator + ?Sized> Indicator for &mut I {
    fn toggle(&mut self) {
        (**self).toggle()
    }
}
