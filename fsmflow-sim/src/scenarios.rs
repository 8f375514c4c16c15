//! Reference machines and scenarios run against a board.
//!
//! Each scenario compiles against the limits of the board it is given, runs one or more sessions and
//! reports an [`Outcome`] per check. [`replay_all`] runs every scenario on fresh PYNQ-Z1 boards.

use itertools::Itertools;
use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use fsmflow::matcher::{self, Lane, Verdict};
use fsmflow::{
    compile, compile_with, Analyzer, Backend, Capture, ClockRate, CompileOptions, CompiledFsm, FsmSpec,
    HardwareLimits, Level, Pin, Session, SessionError, ValidationError,
};

use crate::backend::{SimBackend, TABLE_BUFFER};
use crate::board::{Board, Wiring};

/// Clock of the slow runs.
pub const SLOW: ClockRate = ClockRate::mhz(10.0);

/// Errors that abort a scenario, as opposed to failed checks.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("invalid specification: {0}")]
    Validation(#[from] ValidationError),

    #[error("session failed: {0}")]
    Session(#[from] SessionError),
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// What was checked.
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// Verdict or failure reason.
    pub detail: String,
}

impl Outcome {
    fn new(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self { name: name.into(), passed, detail: detail.into() }
    }

    fn verdict(name: impl Into<String>, verdict: &Verdict) -> Self {
        let detail = match verdict {
            Verdict::Matched { offset } => format!("matched at offset {}", offset),
            Verdict::NoMatch { lane } => format!("{} matches at no offset", lane),
            Verdict::Unsynchronized { offset, lanes } => {
                format!("out of step at offset {}: {}", offset, lanes.iter().map(|lane| &lane.name).join(", "))
            }
        };
        Self::new(name, verdict.is_match(), detail)
    }

    fn captured(
        name: String, capture: Option<Capture>, references: &[(String, Vec<u8>)],
    ) -> Result<Self, ScenarioError> {
        Ok(match capture {
            Some(capture) => Self::verdict(name, &verify(&capture, references)?),
            None => Self::new(name, false, "nothing captured"),
        })
    }
}

/// Up/down counter over four states with a synchronous reset; `test` is high in `S3` only.
///
/// With `direction` low it counts `S0 -> S1 -> S2 -> S3`, with `direction` high it counts down.
pub fn counter_spec(test: &Pin, rst: &Pin, direction: &Pin) -> FsmSpec {
    FsmSpec::new()
        .input("rst", rst.clone())
        .input("direction", direction.clone())
        .output("test", test.clone())
        .state("S0")
        .state("S1")
        .state("S2")
        .state("S3")
        .transition("00", "S0", "S1", "0")
        .transition("01", "S0", "S3", "0")
        .transition("00", "S1", "S2", "0")
        .transition("01", "S1", "S0", "0")
        .transition("00", "S2", "S3", "0")
        .transition("01", "S2", "S1", "0")
        .transition("00", "S3", "S0", "1")
        .transition("01", "S3", "S2", "1")
        .transition("1-", "*", "S0", "")
}

/// Ring `S0 -> S1 -> ... -> S0` advancing on input pattern `step`.
///
/// Output `j` is `patterns[j][i]` in state `Si`. The ring has as many states as the shortest
/// pattern has entries. When `reset` is given, that input pattern returns any state to `S0`.
pub fn ring_spec(inputs: &[Pin], outputs: &[Pin], patterns: &[Vec<u8>], step: &str, reset: Option<&str>) -> FsmSpec {
    let mut spec = FsmSpec::new();
    for (i, pin) in inputs.iter().enumerate() {
        spec = spec.input(&input_name(inputs.len(), i), pin.clone());
    }
    for (j, pin) in outputs.iter().enumerate() {
        spec = spec.output(&output_name(outputs.len(), j), pin.clone());
    }
    if let Some(reset) = reset {
        spec = spec.transition(reset, "*", "S0", "");
    }

    let num_states = patterns.iter().map(Vec::len).min().unwrap_or(0);
    for i in 0..num_states {
        let output = patterns.iter().map(|pattern| if pattern[i] == 0 { '0' } else { '1' }).collect::<String>();
        spec = spec.state(&format!("S{}", i)).transition(
            step,
            &format!("S{}", i),
            &format!("S{}", (i + 1) % num_states),
            &output,
        );
    }
    spec
}

/// Name of input `i` in [`ring_spec`].
pub fn input_name(count: usize, i: usize) -> String {
    if count == 1 {
        "rst".to_string()
    } else {
        format!("input{}", i)
    }
}

/// Name of output `j` in [`ring_spec`].
pub fn output_name(count: usize, j: usize) -> String {
    if count == 1 {
        "test".to_string()
    } else {
        format!("output{}", j)
    }
}

/// Random output patterns, one per lane, `period` samples each.
pub fn random_patterns<R: Rng>(rng: &mut R, lanes: usize, period: usize) -> Vec<Vec<u8>> {
    (0..lanes).map(|_| (0..period).map(|_| rng.gen_range(0..=1)).collect()).collect()
}

/// References for the outputs of [`ring_spec`].
pub fn ring_references(patterns: &[Vec<u8>]) -> Vec<(String, Vec<u8>)> {
    patterns.iter().enumerate().map(|(j, pattern)| (output_name(patterns.len(), j), pattern.clone())).collect()
}

/// Board pins `D<start>` up to `D<end - 1>`.
pub fn header_pins(range: std::ops::Range<usize>) -> Vec<Pin> { range.map(|i| Pin::new(format!("D{}", i))).collect() }

/// Runs `fsm` once on `backend` and returns the capture, if the analyzer is enabled.
///
/// The session is released before returning, so the backend can take the next machine.
pub fn run_once<B: Backend>(
    backend: &mut B, fsm: CompiledFsm, limits: &HardwareLimits, analyzer: Option<Analyzer>, clock: ClockRate,
) -> Result<Option<Capture>, SessionError> {
    let mut session = Session::new(backend, fsm, limits, analyzer)?;
    session.configure(clock)?;
    session.arm()?;
    session.start()?;
    session.stop()?;
    let capture = match session.capture() {
        Ok(capture) => Some(capture.clone()),
        Err(SessionError::NoAnalyzer) => None,
        Err(error) => return Err(error),
    };
    session.release();
    Ok(capture)
}

/// Checks the named lanes of a capture jointly against their reference patterns.
pub fn verify(capture: &Capture, references: &[(String, Vec<u8>)]) -> Result<Verdict, SessionError> {
    let samples = references
        .iter()
        .map(|(name, _)| match capture.samples(name) {
            Some(samples) => samples.map_err(|error| SessionError::Codec { lane: name.clone(), error }),
            None => Err(SessionError::MissingLane { name: name.clone() }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let lanes = references
        .iter()
        .zip(samples.iter())
        .map(|((name, reference), samples)| Lane::new(name, reference, samples))
        .collect::<Vec<_>>();
    Ok(matcher::match_lanes(&lanes))
}

/// Counter counting down on `D0..D2`, sampled over the whole trace buffer at 10 MHz and at the
/// fastest clock, reusing one session.
pub fn counter_down(board: &mut SimBackend) -> Result<Vec<Outcome>, ScenarioError> {
    let limits = board.board().limits.clone();
    let [test, rst, direction]: [Pin; 3] = [Pin::new("D0"), Pin::new("D1"), Pin::new("D2")];
    board.set_wiring(Wiring::new().tie(&rst, Level::Low).tie(&direction, Level::High));

    let fsm = compile(&counter_spec(&test, &rst, &direction), &limits)?;
    let mut session = Session::new(board, fsm, &limits, Some(Analyzer::new(limits.max_trace_samples)))?;

    let mut outcomes = vec![];
    for clock in [SLOW, ClockRate::mhz(limits.max_clock_mhz)] {
        let name = format!("counter at {}", clock);
        session.configure(clock)?;
        if session.buffers().iter().any(|buffer| buffer == TABLE_BUFFER) {
            outcomes.push(Outcome::new(name, false, format!("{} kept after load", TABLE_BUFFER)));
            continue;
        }
        session.arm()?;
        session.start()?;
        session.stop()?;
        let verdict = verify(session.capture()?, &[("test".to_string(), vec![1, 0, 0, 0])])?;
        outcomes.push(Outcome::verdict(name, &verdict));
    }
    session.release();
    Ok(outcomes)
}

/// Counter counting up with the state register traced, one period plus the unreliable first sample.
pub fn counter_state_lanes(board: &mut SimBackend) -> Result<Outcome, ScenarioError> {
    let limits = board.board().limits.clone();
    let [test, rst, direction]: [Pin; 3] = [Pin::new("D0"), Pin::new("D1"), Pin::new("D2")];
    let spec = counter_spec(&test, &rst, &direction);
    let fsm = compile_with(&spec, &limits, CompileOptions { use_state_bits: true })?;
    let period = fsm.states().len();

    board.set_wiring(Wiring::new().tie(&rst, Level::Low).tie(&direction, Level::Low));
    let capture = run_once(board, fsm, &limits, Some(Analyzer::new(period + 1)), SLOW)?;
    Outcome::captured("counter with state lanes".to_string(), capture, &[
        ("test".to_string(), vec![0, 0, 0, 1]),
        ("state_bit0".to_string(), vec![0, 1, 0, 1]),
        ("state_bit1".to_string(), vec![0, 0, 1, 1]),
    ])
}

/// Reading the capture of a session built without an analyzer must fail.
pub fn no_analyzer(board: &mut SimBackend) -> Result<Outcome, ScenarioError> {
    let limits = board.board().limits.clone();
    let fsm = compile(&counter_spec(&Pin::new("D0"), &Pin::new("D1"), &Pin::new("D2")), &limits)?;
    let mut session = Session::new(board, fsm, &limits, None)?;
    session.configure(SLOW)?;
    session.arm()?;
    session.start()?;
    session.stop()?;

    let name = "capture without analyzer";
    let outcome = match session.capture() {
        Err(SessionError::NoAnalyzer) => Outcome::new(name, true, "rejected"),
        Err(error) => Outcome::new(name, false, error.to_string()),
        Ok(_) => Outcome::new(name, false, "capture returned"),
    };
    session.release();
    Ok(outcome)
}

/// Machines with one state too few or too many must be rejected.
pub fn state_bounds<R: Rng>(limits: &HardwareLimits, rng: &mut R) -> Vec<Outcome> {
    let [input, output] = [Pin::new("D0"), Pin::new("D1")];
    [limits.fsm_min_num_states.saturating_sub(1), limits.fsm_max_num_states + 1]
        .into_iter()
        .map(|num_states| {
            let patterns = random_patterns(rng, 1, num_states);
            let spec = ring_spec(&[input.clone()], &[output.clone()], &patterns, "0", Some("1"));
            let name = format!("{} states", num_states);
            match compile(&spec, limits) {
                Err(error @ ValidationError::StateCount { .. }) => Outcome::new(name, true, error.to_string()),
                Err(error) => Outcome::new(name, false, error.to_string()),
                Ok(_) => Outcome::new(name, false, "accepted"),
            }
        })
        .collect()
}

/// Rings of the smallest and largest state counts with random outputs on one board.
pub fn state_extremes<R: Rng>(board: &mut SimBackend, rng: &mut R) -> Result<Vec<Outcome>, ScenarioError> {
    let limits = board.board().limits.clone();
    let [input, output] = [Pin::new("D0"), Pin::new("D1")];
    board.set_wiring(Wiring::new().tie(&input, Level::Low));

    let mut outcomes = vec![];
    for num_states in [limits.fsm_min_num_states, limits.fsm_max_num_states] {
        let patterns = random_patterns(rng, 1, num_states);
        let fsm = compile(&ring_spec(&[input.clone()], &[output.clone()], &patterns, "0", Some("1")), &limits)?;
        let capture = run_once(board, fsm, &limits, Some(Analyzer::new(limits.max_trace_samples)), SLOW)?;
        outcomes.push(Outcome::captured(format!("{} states", num_states), capture, &ring_references(&patterns))?);
    }
    Ok(outcomes)
}

/// All inputs grounded, every remaining pin an output, the widest table the generator holds.
pub fn widest<R: Rng>(board: &mut SimBackend, rng: &mut R) -> Result<Outcome, ScenarioError> {
    let limits = board.board().limits.clone();
    let all = header_pins(0..limits.max_traceable_pins);
    let (inputs, outputs) = all.split_at(limits.fsm_max_input_bits);
    let num_states = 1 << (limits.fsm_max_state_input_bits - limits.fsm_max_input_bits);

    let patterns = random_patterns(rng, outputs.len(), num_states);
    let step = "0".repeat(inputs.len());
    let reset = "1".repeat(inputs.len());
    let fsm = compile(&ring_spec(inputs, outputs, &patterns, &step, Some(&reset)), &limits)?;

    board.set_wiring(inputs.iter().fold(Wiring::new(), |wiring, pin| wiring.tie(pin, Level::Low)));
    let capture = run_once(board, fsm, &limits, Some(Analyzer::new(limits.max_trace_samples)), SLOW)?;
    let name = format!("{} inputs, {} outputs", inputs.len(), outputs.len());
    Outcome::captured(name, capture, &ring_references(&patterns))
}

/// Free-running ring on a don't-care input driving every other pin, one period at full speed.
pub fn free_running<R: Rng>(board: &mut SimBackend, rng: &mut R) -> Result<Outcome, ScenarioError> {
    let limits = board.board().limits.clone();
    let all = header_pins(0..limits.max_traceable_pins);
    let (input, outputs) = all.split_at(1);
    let num_states = limits.fsm_max_num_states;

    let patterns = random_patterns(rng, outputs.len(), num_states);
    let fsm = compile(&ring_spec(input, outputs, &patterns, "-", None), &limits)?;

    let clock = ClockRate::mhz(limits.max_clock_mhz);
    let capture = run_once(board, fsm, &limits, Some(Analyzer::new(num_states)), clock)?;
    Outcome::captured(format!("free-running, {} outputs", outputs.len()), capture, &ring_references(&patterns))
}

/// Replays every scenario, each on a fresh PYNQ-Z1 board started from `seed`.
pub fn replay_all(seed: u64) -> Result<Vec<Outcome>, ScenarioError> {
    let board = || SimBackend::new(Board::pynqz1(), seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut outcomes = counter_down(&mut board())?;
    outcomes.push(counter_state_lanes(&mut board())?);
    outcomes.push(no_analyzer(&mut board())?);
    outcomes.extend(state_bounds(&Board::pynqz1().limits, &mut rng));
    outcomes.extend(state_extremes(&mut board(), &mut rng)?);
    outcomes.push(widest(&mut board(), &mut rng)?);
    outcomes.push(free_running(&mut board(), &mut rng)?);

    info!("{} of {} scenarios passed", outcomes.iter().filter(|outcome| outcome.passed).count(), outcomes.len());
    Ok(outcomes)
}
