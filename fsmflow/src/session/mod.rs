//! Hardware session: `Built -> Configured -> Armed -> Running -> Stopped`.
//!
//! A [`Session`] binds one compiled FSM to a [`Backend`] and only lets protocol calls through in
//! order. It borrows the backend mutably for its whole lifetime, so a second FSM can only be bound
//! to the same resource once the first session is gone, and dropping a session frees its buffers.

mod backend;
mod capture;

use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use backend::*;
pub use capture::*;

use crate::codec::CodecError;
use crate::compiler::CompiledFsm;
use crate::limits::HardwareLimits;

/// Protocol state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created; nothing loaded yet.
    Built,
    /// Table loaded and clock set.
    Configured,
    /// Ready to start.
    Armed,
    /// Generating.
    Running,
    /// Stopped; the capture is readable.
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Debug::fmt(self, f) }
}

/// Session errors. None of them is transient.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {operation} in state {state}")]
    State { operation: &'static str, state: SessionState },

    #[error("session was built without an analyzer")]
    NoAnalyzer,

    #[error("the last run produced no capture")]
    NoCapture,

    #[error("FSM was compiled for other hardware limits")]
    LimitsMismatch,

    #[error("capture has no lane {name:?}")]
    MissingLane { name: String },

    #[error("{requested} analyzer samples requested, expected between 1 and {max}")]
    SampleCount { requested: usize, max: usize },

    #[error("clock of {mhz} MHz outside {min} MHz ..= {max} MHz")]
    Clock { mhz: f64, min: f64, max: f64 },

    #[error("lane {lane:?} is malformed: {error}")]
    Codec { lane: String, error: CodecError },

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Generator clock rate.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ClockRate {
    mhz: f64,
}

impl ClockRate {
    /// Clock rate in MHz.
    pub const fn mhz(mhz: f64) -> Self { Self { mhz } }

    /// Returns the rate in MHz.
    pub fn as_mhz(self) -> f64 { self.mhz }

    /// Returns the clock period in nanoseconds.
    pub fn period_ns(self) -> f64 { 1000.0 / self.mhz }
}

impl fmt::Display for ClockRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} MHz", self.mhz) }
}

/// Capture configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analyzer {
    /// Number of samples captured per lane.
    pub num_samples: usize,
}

impl Analyzer {
    /// Captures `num_samples` samples per lane.
    pub fn new(num_samples: usize) -> Self { Self { num_samples } }
}

/// Session over one compiled FSM and one backend.
#[derive(Debug)]
pub struct Session<'a, B: Backend> {
    backend: &'a mut B,
    fsm: CompiledFsm,
    limits: HardwareLimits,
    analyzer: Option<Analyzer>,
    state: SessionState,
    clock: Option<ClockRate>,
    capture: Option<Capture>,
}

impl<'a, B: Backend> Session<'a, B> {
    /// Binds `fsm` to `backend`. Without an analyzer, nothing is captured.
    pub fn new(
        backend: &'a mut B, fsm: CompiledFsm, limits: &HardwareLimits, analyzer: Option<Analyzer>,
    ) -> Result<Self, SessionError> {
        if fsm.limits() != limits {
            return Err(SessionError::LimitsMismatch);
        }
        if let Some(analyzer) = analyzer {
            if analyzer.num_samples == 0 || analyzer.num_samples > limits.max_trace_samples {
                return Err(SessionError::SampleCount {
                    requested: analyzer.num_samples,
                    max: limits.max_trace_samples,
                });
            }
        }

        Ok(Self {
            backend,
            fsm,
            limits: limits.clone(),
            analyzer,
            state: SessionState::Built,
            clock: None,
            capture: None,
        })
    }

    /// Current protocol state.
    pub fn state(&self) -> SessionState { self.state }

    /// Bound FSM.
    pub fn fsm(&self) -> &CompiledFsm { &self.fsm }

    /// Capture configuration.
    pub fn analyzer(&self) -> Option<&Analyzer> { self.analyzer.as_ref() }

    /// Clock rate of the last `configure`.
    pub fn clock(&self) -> Option<ClockRate> { self.clock }

    /// Names of the buffers the backend currently holds.
    pub fn buffers(&self) -> Vec<String> { self.backend.buffers() }

    fn expect(&self, operation: &'static str, allowed: &[SessionState]) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::State { operation, state: self.state })
        }
    }

    fn advance(&mut self, state: SessionState) {
        debug!("session {} -> {}", self.state, state);
        self.state = state;
    }

    /// Loads the table and sets the clock. Also legal after `stop`, to run again.
    pub fn configure(&mut self, clock: ClockRate) -> Result<(), SessionError> {
        self.expect("configure", &[SessionState::Built, SessionState::Configured, SessionState::Stopped])?;
        if !self.limits.supports_clock(clock.as_mhz()) {
            return Err(SessionError::Clock {
                mhz: clock.as_mhz(),
                min: self.limits.min_clock_mhz,
                max: self.limits.max_clock_mhz,
            });
        }

        self.backend.release_buffers();
        self.capture = None;
        self.backend.load(&self.fsm, self.analyzer.as_ref(), clock)?;
        self.clock = Some(clock);
        self.advance(SessionState::Configured);
        Ok(())
    }

    /// Arms the generator and the analyzer.
    pub fn arm(&mut self) -> Result<(), SessionError> {
        self.expect("arm", &[SessionState::Configured])?;
        self.backend.arm()?;
        self.advance(SessionState::Armed);
        Ok(())
    }

    /// Starts generation.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.expect("start", &[SessionState::Armed])?;
        self.backend.start()?;
        self.advance(SessionState::Running);
        Ok(())
    }

    /// Stops generation and reads the trace buffer if capturing.
    ///
    /// Once the generator has stopped the session is `Stopped`, even if reading the trace fails.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        self.expect("stop", &[SessionState::Running])?;
        self.backend.stop()?;
        self.advance(SessionState::Stopped);
        if self.analyzer.is_some() {
            let capture = self.backend.capture()?;
            info!("captured {} lanes at {}", capture.len(), self.clock.map_or(0.0, ClockRate::as_mhz));
            self.capture = Some(capture);
        }
        Ok(())
    }

    /// Returns the capture of the last run.
    pub fn capture(&self) -> Result<&Capture, SessionError> {
        if self.analyzer.is_none() {
            return Err(SessionError::NoAnalyzer);
        }
        self.expect("read the capture", &[SessionState::Stopped])?;
        self.capture.as_ref().ok_or(SessionError::NoCapture)
    }

    /// Decodes one lane of the capture.
    pub fn lane(&self, name: &str) -> Result<Vec<u8>, SessionError> {
        match self.capture()?.samples(name) {
            Some(samples) => samples.map_err(|error| SessionError::Codec { lane: name.to_string(), error }),
            None => Err(SessionError::MissingLane { name: name.to_string() }),
        }
    }

    /// Frees the backend's buffers. Idempotent; the capture already read stays available.
    pub fn release(&mut self) { self.backend.release_buffers(); }
}

impl<'a, B: Backend> Drop for Session<'a, B> {
    fn drop(&mut self) {
        let buffers = self.backend.buffers();
        if !buffers.is_empty() {
            warn!("session dropped with buffers still allocated: {}", buffers.join(", "));
            self.backend.release_buffers();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::spec::FsmSpec;

    /// Backend that records calls and fakes a fixed capture.
    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        buffers: Vec<String>,
        fail_start: bool,
        fail_capture: bool,
    }

    impl Backend for Recorder {
        fn load(&mut self, _: &CompiledFsm, analyzer: Option<&Analyzer>, _: ClockRate) -> Result<(), BackendError> {
            self.calls.push("load");
            if analyzer.is_some() {
                self.buffers.push("trace_buf".to_string());
            }
            Ok(())
        }

        fn arm(&mut self) -> Result<(), BackendError> {
            self.calls.push("arm");
            Ok(())
        }

        fn start(&mut self) -> Result<(), BackendError> {
            self.calls.push("start");
            if self.fail_start {
                return Err("generator did not start".into());
            }
            Ok(())
        }

        fn stop(&mut self) -> Result<(), BackendError> {
            self.calls.push("stop");
            Ok(())
        }

        fn capture(&mut self) -> Result<Capture, BackendError> {
            self.calls.push("capture");
            if self.fail_capture {
                return Err("trace read failed".into());
            }
            let mut capture = Capture::new();
            capture.insert("test", "hl..hl..".to_string());
            capture.insert("broken", ".h".to_string());
            Ok(capture)
        }

        fn buffers(&self) -> Vec<String> { self.buffers.clone() }

        fn release_buffers(&mut self) { self.buffers.clear(); }
    }

    fn fsm() -> CompiledFsm {
        let spec = FsmSpec::new()
            .input("rst", "D0")
            .output("test", "D1")
            .state("S0")
            .state("S1")
            .transition("0", "S0", "S1", "1")
            .transition("0", "S1", "S0", "0")
            .transition("1", "*", "S0", "");
        compile(&spec, &HardwareLimits::PYNQZ1).unwrap()
    }

    const CLOCK: ClockRate = ClockRate::mhz(10.0);

    #[test]
    fn full_protocol() {
        let mut backend = Recorder::default();
        let mut session = Session::new(&mut backend, fsm(), &HardwareLimits::PYNQZ1, Some(Analyzer::new(8))).unwrap();

        session.configure(CLOCK).unwrap();
        session.arm().unwrap();
        session.start().unwrap();
        session.stop().unwrap();
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(session.lane("test").unwrap(), vec![1, 0, 0, 0, 1, 0, 0, 0]);
        assert!(matches!(session.lane("missing"), Err(SessionError::MissingLane { .. })));
        assert!(matches!(session.lane("broken"), Err(SessionError::Codec { .. })));

        // Running again at another clock rate.
        session.configure(ClockRate::mhz(100.0)).unwrap();
        assert!(matches!(session.capture(), Err(SessionError::State { state: SessionState::Configured, .. })));
        session.release();
        session.release();
        assert!(session.buffers().is_empty());
        drop(session);

        assert_eq!(backend.calls, vec!["load", "arm", "start", "stop", "capture", "load"]);
    }

    #[test]
    fn out_of_order_calls_are_rejected() {
        let mut backend = Recorder::default();
        let mut session = Session::new(&mut backend, fsm(), &HardwareLimits::PYNQZ1, Some(Analyzer::new(8))).unwrap();

        assert!(matches!(session.arm(), Err(SessionError::State { operation: "arm", state: SessionState::Built })));
        session.configure(CLOCK).unwrap();
        assert!(matches!(
            session.start(),
            Err(SessionError::State { operation: "start", state: SessionState::Configured })
        ));
        session.arm().unwrap();
        assert!(matches!(session.configure(CLOCK), Err(SessionError::State { state: SessionState::Armed, .. })));
        assert!(matches!(session.stop(), Err(SessionError::State { state: SessionState::Armed, .. })));
        session.start().unwrap();
        assert!(matches!(session.capture(), Err(SessionError::State { state: SessionState::Running, .. })));
        drop(session);

        assert_eq!(backend.calls, vec!["load", "arm", "start"]);
    }

    #[test]
    fn capture_without_analyzer_is_an_error() {
        let mut backend = Recorder::default();
        let mut session = Session::new(&mut backend, fsm(), &HardwareLimits::PYNQZ1, None).unwrap();
        assert!(matches!(session.capture(), Err(SessionError::NoAnalyzer)));

        session.configure(CLOCK).unwrap();
        session.arm().unwrap();
        session.start().unwrap();
        session.stop().unwrap();
        assert!(matches!(session.capture(), Err(SessionError::NoAnalyzer)));
        assert!(matches!(session.lane("test"), Err(SessionError::NoAnalyzer)));
        drop(session);

        assert!(!backend.calls.contains(&"capture"));
    }

    #[test]
    fn analyzer_and_clock_bounds() {
        let mut backend = Recorder::default();
        let limits = HardwareLimits::PYNQZ1;
        assert!(matches!(
            Session::new(&mut backend, fsm(), &limits, Some(Analyzer::new(0))),
            Err(SessionError::SampleCount { requested: 0, .. })
        ));
        assert!(matches!(
            Session::new(&mut backend, fsm(), &limits, Some(Analyzer::new(limits.max_trace_samples + 1))),
            Err(SessionError::SampleCount { .. })
        ));

        let mut session = Session::new(&mut backend, fsm(), &limits, None).unwrap();
        assert!(matches!(session.configure(ClockRate::mhz(200.0)), Err(SessionError::Clock { .. })));
        assert_eq!(session.state(), SessionState::Built);
    }

    #[test]
    fn backend_failures_keep_the_state() {
        let mut backend = Recorder { fail_start: true, ..Recorder::default() };
        let mut session = Session::new(&mut backend, fsm(), &HardwareLimits::PYNQZ1, Some(Analyzer::new(8))).unwrap();
        session.configure(CLOCK).unwrap();
        session.arm().unwrap();
        assert!(matches!(session.start(), Err(SessionError::Backend(_))));
        assert_eq!(session.state(), SessionState::Armed);
    }

    #[test]
    fn failed_trace_read_still_stops() {
        let mut backend = Recorder { fail_capture: true, ..Recorder::default() };
        let mut session = Session::new(&mut backend, fsm(), &HardwareLimits::PYNQZ1, Some(Analyzer::new(8))).unwrap();
        session.configure(CLOCK).unwrap();
        session.arm().unwrap();
        session.start().unwrap();
        assert!(matches!(session.stop(), Err(SessionError::Backend(_))));
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(matches!(session.capture(), Err(SessionError::NoCapture)));
        assert!(matches!(session.lane("test"), Err(SessionError::NoCapture)));

        session.configure(CLOCK).unwrap();
        assert_eq!(session.state(), SessionState::Configured);
        drop(session);

        assert_eq!(backend.calls, vec!["load", "arm", "start", "stop", "capture", "load"]);
    }

    #[test]
    fn limits_must_match_the_compiled_table() {
        let mut backend = Recorder::default();
        let smaller = HardwareLimits { max_trace_samples: 1024, ..HardwareLimits::PYNQZ1 };
        assert!(matches!(Session::new(&mut backend, fsm(), &smaller, None), Err(SessionError::LimitsMismatch)));
        assert!(Session::new(&mut backend, fsm(), &HardwareLimits::PYNQZ1, None).is_ok());
    }

    #[test]
    fn dropping_a_session_frees_its_buffers() {
        let mut backend = Recorder::default();
        {
            let mut session =
                Session::new(&mut backend, fsm(), &HardwareLimits::PYNQZ1, Some(Analyzer::new(8))).unwrap();
            session.configure(CLOCK).unwrap();
            assert_eq!(session.buffers(), vec!["trace_buf"]);
        }
        assert!(backend.buffers.is_empty());
    }
}
