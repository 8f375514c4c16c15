//! Simulated register-level driver.

use std::mem;

use itertools::Itertools;
use linked_hash_map::LinkedHashMap;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use fsmflow::session::BackendError;
use fsmflow::{Analyzer, Backend, Capture, ClockRate, CodecError, CompiledFsm, Pin};

use crate::board::{Board, Wiring};
use crate::engine::{Engine, Tick};

/// Buffer the table image is staged in while loading.
pub const TABLE_BUFFER: &str = "bram_data_buf";

/// Buffer the analyzer writes samples into.
pub const TRACE_BUFFER: &str = "trace_buf";

/// Most cycles the generator may run before the analyzer starts sampling.
pub const MAX_PHASE: usize = 64;

/// Position of the state register in a trace word; pins occupy the bits below.
pub const STATE_SHIFT: usize = 32;

/// Simulation errors.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum SimError {
    #[error("pin {pin} is not traceable on {board}")]
    UnknownPin { pin: Pin, board: String },

    #[error("no table loaded")]
    NotLoaded,

    #[error("generator is not {expected}")]
    Phase { expected: &'static str },

    #[error("trace buffer was released")]
    NoTrace,

    #[error("{board} has {pins} pins, at most {max} can be traced")]
    TooManyPins { board: String, pins: usize, max: usize },

    #[error("malformed trace: {0}")]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Loaded,
    Armed,
    Running,
    Stopped,
}

/// Loaded configuration.
#[derive(Debug)]
struct Program {
    fsm: CompiledFsm,
    engine: Engine,
    analyzer: Option<Analyzer>,
    clock: ClockRate,
}

/// Software FSM generator with an analyzer.
#[derive(Debug)]
pub struct SimBackend {
    board: Board,
    wiring: Wiring,
    rng: ChaCha8Rng,
    buffers: LinkedHashMap<String, Vec<u64>>,
    program: Option<Program>,
    phase: Phase,
    loads: usize,
    leak_table: bool,
}

impl SimBackend {
    /// Creates a board whose start-up behavior is derived from `seed`.
    pub fn new(board: Board, seed: u64) -> Self {
        Self {
            board,
            wiring: Wiring::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            buffers: LinkedHashMap::new(),
            program: None,
            phase: Phase::Idle,
            loads: 0,
            leak_table: false,
        }
    }

    /// Board description.
    pub fn board(&self) -> &Board { &self.board }

    /// Replaces the external connections.
    pub fn set_wiring(&mut self, wiring: Wiring) {
        for (pin, level) in wiring.ties() {
            info!("connect {} to {}", pin, level);
        }
        self.wiring = wiring;
    }

    /// Emulates a driver that never frees the table staging buffer after loading.
    pub fn leak_table_buffer(&mut self, leak: bool) { self.leak_table = leak; }

    /// Number of table loads so far.
    pub fn loads(&self) -> usize { self.loads }

    fn expect(&self, phase: Phase, expected: &'static str) -> Result<(), SimError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(SimError::Phase { expected })
        }
    }

    /// Input combination the wiring presents, first input most significant.
    fn input_value(&self, fsm: &CompiledFsm) -> u64 {
        fsm.inputs().iter().fold(0, |acc, port| acc << 1 | u64::from(self.wiring.level(&port.pin).sample()))
    }

    /// Board index of a pin.
    fn pin_index(&self, pin: &Pin) -> Result<usize, SimError> {
        self.board
            .pins
            .iter()
            .position(|p| p == pin)
            .ok_or_else(|| SimError::UnknownPin { pin: pin.clone(), board: self.board.name.clone() })
    }

    /// Levels of all board pins plus the state register, packed as one trace word.
    fn sample(&self, fsm: &CompiledFsm, engine: &Engine, tick: &Tick) -> Result<u64, SimError> {
        let mut word = u64::from(tick.state) << STATE_SHIFT;
        for port in fsm.inputs() {
            word |= u64::from(self.wiring.level(&port.pin).sample()) << self.pin_index(&port.pin)?;
        }
        for (index, port) in fsm.outputs().iter().enumerate() {
            word |= u64::from(engine.output_sample(tick, index)) << self.pin_index(&port.pin)?;
        }
        Ok(word)
    }

    /// Runs the generator from reset for an unknown number of cycles, then samples.
    fn run(&mut self) -> Result<(), SimError> {
        let mut program = self.program.take().ok_or(SimError::NotLoaded)?;
        let result = self.run_program(&mut program);
        self.program = Some(program);
        result
    }

    fn run_program(&mut self, program: &mut Program) -> Result<(), SimError> {
        let warmup = self.rng.gen_range(0..MAX_PHASE);
        let glitch = self.rng.gen::<u64>();
        let input = self.input_value(&program.fsm);
        let num_samples = program.analyzer.map_or(0, |analyzer| analyzer.num_samples);

        program.engine.reset();
        for _ in 0..warmup {
            program.engine.step(input);
        }
        let mut trace = Vec::with_capacity(num_samples);
        for _ in 0..num_samples {
            let tick = program.engine.step(input);
            trace.push(self.sample(&program.fsm, &program.engine, &tick)?);
        }
        // The first sample is taken while the analyzer is still settling.
        if let Some(first) = trace.first_mut() {
            *first ^= glitch;
        }

        debug!("{} warm-up cycles at {}, {} samples", warmup, program.clock, num_samples);
        if let Some(buffer) = self.buffers.get_mut(TRACE_BUFFER) {
            *buffer = trace;
        }
        Ok(())
    }
}

impl Backend for SimBackend {
    fn load(&mut self, fsm: &CompiledFsm, analyzer: Option<&Analyzer>, clock: ClockRate) -> Result<(), BackendError> {
        if self.board.pins.len() > STATE_SHIFT {
            return Err(SimError::TooManyPins {
                board: self.board.name.clone(),
                pins: self.board.pins.len(),
                max: STATE_SHIFT,
            }
            .into());
        }
        for port in fsm.inputs().iter().chain(fsm.outputs()) {
            self.pin_index(&port.pin)?;
        }

        self.buffers.insert(TABLE_BUFFER.to_string(), fsm.words());
        let engine = Engine::new(fsm, self.buffers.get(TABLE_BUFFER).cloned().unwrap_or_default());
        if !self.leak_table {
            self.buffers.remove(TABLE_BUFFER);
        }
        debug!("loaded {} table words through {}", fsm.rows().len(), TABLE_BUFFER);

        if let Some(analyzer) = analyzer {
            self.buffers.insert(TRACE_BUFFER.to_string(), Vec::with_capacity(analyzer.num_samples));
        }

        self.program = Some(Program { fsm: fsm.clone(), engine, analyzer: analyzer.copied(), clock });
        self.phase = Phase::Loaded;
        self.loads += 1;
        info!("{}: FSM with {} states loaded at {}", self.board.name, fsm.states().len(), clock);
        Ok(())
    }

    fn arm(&mut self) -> Result<(), BackendError> {
        self.expect(Phase::Loaded, "loaded")?;
        self.phase = Phase::Armed;
        Ok(())
    }

    fn start(&mut self) -> Result<(), BackendError> {
        self.expect(Phase::Armed, "armed")?;
        self.run()?;
        self.phase = Phase::Running;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        self.expect(Phase::Running, "running")?;
        self.phase = Phase::Stopped;
        Ok(())
    }

    fn capture(&mut self) -> Result<Capture, BackendError> {
        self.expect(Phase::Stopped, "stopped")?;
        let program = self.program.as_ref().ok_or(SimError::NotLoaded)?;
        let trace = self.buffers.get(TRACE_BUFFER).ok_or(SimError::NoTrace)?;
        let fsm = &program.fsm;

        let lane = |shift: usize| trace.iter().map(|word| ((word >> shift) & 1) as u8).collect::<Vec<_>>();
        let mut capture = Capture::new();
        for port in fsm.inputs().iter().chain(fsm.outputs()) {
            let samples = lane(self.pin_index(&port.pin)?);
            capture.insert_samples(&port.name, &samples).map_err(SimError::from)?;
        }
        for (bit, name) in fsm.state_lane_names().iter().enumerate() {
            capture.insert_samples(name, &lane(STATE_SHIFT + bit)).map_err(SimError::from)?;
        }

        debug!("capture lanes: {}", capture.names().join(", "));
        Ok(capture)
    }

    fn buffers(&self) -> Vec<String> { self.buffers.keys().cloned().collect() }

    fn release_buffers(&mut self) {
        let released = mem::take(&mut self.buffers);
        if !released.is_empty() {
            debug!("released {}", released.keys().join(", "));
        }
    }
}
