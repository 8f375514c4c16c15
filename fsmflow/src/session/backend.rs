//! Hardware backend contract.

use std::error;
use std::fmt;

use super::{Analyzer, Capture, ClockRate};
use crate::compiler::CompiledFsm;

/// Error reported by a backend.
pub type BackendError = Box<dyn error::Error + Send + Sync>;

/// Register-level driver of an FSM generator.
///
/// Every call blocks until the hardware operation completes. The driver owns named buffers: a
/// transient one while the table is loaded, and the trace buffer between `arm` and
/// [`release_buffers`](Backend::release_buffers). [`Session`](super::Session) guarantees the
/// calls arrive in protocol order.
pub trait Backend: fmt::Debug {
    /// Loads the transition table and the capture configuration, and sets the clock.
    fn load(&mut self, fsm: &CompiledFsm, analyzer: Option<&Analyzer>, clock: ClockRate) -> Result<(), BackendError>;

    /// Prepares the generator and, if configured, the analyzer.
    fn arm(&mut self) -> Result<(), BackendError>;

    /// Starts generation.
    fn start(&mut self) -> Result<(), BackendError>;

    /// Stops generation; the trace buffer is complete afterwards.
    fn stop(&mut self) -> Result<(), BackendError>;

    /// Reads the trace buffer as one waveform per lane.
    fn capture(&mut self) -> Result<Capture, BackendError>;

    /// Names of the buffers currently allocated.
    fn buffers(&self) -> Vec<String>;

    /// Frees every buffer. Calling it with nothing allocated does nothing.
    fn release_buffers(&mut self);
}
