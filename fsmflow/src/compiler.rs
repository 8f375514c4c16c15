//! FSM specification validator and compiler.
//!
//! [`compile`] checks an [`FsmSpec`] against [`HardwareLimits`] and resolves it into a dense table
//! indexed by `(state, input)`. Each row holds the next state and the output action, so the table
//! can be loaded into the generator's memory as is.

use std::collections::HashSet;
use std::fmt;

use itertools::Itertools;
use log::{debug, info};
use thiserror::Error;

use crate::limits::HardwareLimits;
use crate::spec::*;
use crate::utils::*;

/// Name prefix of the lanes carrying the current state index.
pub const STATE_BIT_PREFIX: &str = "state_bit";

/// Field of a transition rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternField {
    /// Input pattern.
    Input,
    /// Output pattern.
    Output,
}

impl fmt::Display for PatternField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Specification errors. Nothing is clamped: every violated bound is reported.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{count} input bits declared, expected between {min} and {max}")]
    InputCount { count: usize, min: usize, max: usize },

    #[error("{count} output bits declared, expected between 1 and {max}")]
    OutputCount { count: usize, max: usize },

    #[error("{used} pins used, only {available} traceable pins available")]
    PinBudget { used: usize, available: usize },

    #[error("{count} states declared, expected between {min} and {max}")]
    StateCount { count: usize, min: usize, max: usize },

    #[error("{bits} state bits needed, at most {max} supported")]
    StateBits { bits: usize, max: usize },

    #[error("{state_bits} state bits and {input_bits} input bits exceed the table address width {max}")]
    StateInputBits { state_bits: usize, input_bits: usize, max: usize },

    #[error("{outputs} outputs and {state_bits} state lanes exceed {max} output bits")]
    StateLanes { outputs: usize, state_bits: usize, max: usize },

    #[error("transition {transition} names undeclared state {name:?}")]
    UnknownState { transition: usize, name: String },

    #[error("transition {transition} has a malformed {field} pattern: {error}")]
    Pattern { transition: usize, field: PatternField, error: PatternError },

    #[error("transitions {first} and {second} from state {state:?} overlap")]
    Ambiguous { state: String, first: usize, second: usize },

    #[error("name {name:?} is declared twice")]
    DuplicateName { name: String },

    #[error("name {name:?} is reserved")]
    ReservedName { name: String },

    #[error("pin {pin} is used twice")]
    DuplicatePin { pin: Pin },

    #[error("limit {name} = {value} exceeds {max}")]
    UnsupportedLimit { name: &'static str, value: usize, max: usize },

    #[error("invalid clock range {min} MHz ..= {max} MHz")]
    ClockRange { min: f64, max: f64 },
}

/// Compilation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Also drives the current state index on `state_bit0..` output lanes.
    pub use_state_bits: bool,
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsmRow {
    /// Next state index.
    pub next_state: u32,
    /// Output action taken in this cycle.
    pub output: OutputPattern,
}

/// Validated transition rule; `from` is `None` for the wildcard state.
#[derive(Debug)]
struct Rule {
    index: usize,
    input: InputPattern,
    from: Option<u32>,
    to: u32,
    output: OutputPattern,
}

/// Compiled FSM: a dense transition table of `2^(state_bits + input_bits)` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFsm {
    inputs: Vec<Port>,
    outputs: Vec<Port>,
    states: Vec<String>,
    state_bits: usize,
    use_state_bits: bool,
    limits: HardwareLimits,
    rows: Vec<FsmRow>,
}

/// Compiles a specification with default options.
pub fn compile(spec: &FsmSpec, limits: &HardwareLimits) -> Result<CompiledFsm, ValidationError> {
    compile_with(spec, limits, CompileOptions::default())
}

/// Compiles a specification.
pub fn compile_with(
    spec: &FsmSpec, limits: &HardwareLimits, options: CompileOptions,
) -> Result<CompiledFsm, ValidationError> {
    limits.validate()?;

    let input_bits = spec.inputs.len();
    if input_bits < limits.fsm_min_input_bits || input_bits > limits.fsm_max_input_bits {
        return Err(ValidationError::InputCount {
            count: input_bits,
            min: limits.fsm_min_input_bits,
            max: limits.fsm_max_input_bits,
        });
    }

    let output_bits = spec.outputs.len();
    if output_bits == 0 || output_bits > limits.fsm_max_output_bits {
        return Err(ValidationError::OutputCount { count: output_bits, max: limits.fsm_max_output_bits });
    }
    check_pins(input_bits + output_bits, limits)?;

    let num_states = spec.states.len();
    if num_states < limits.fsm_min_num_states || num_states > limits.fsm_max_num_states {
        return Err(ValidationError::StateCount {
            count: num_states,
            min: limits.fsm_min_num_states,
            max: limits.fsm_max_num_states,
        });
    }

    let state_bits = index_bits(num_states, limits.fsm_min_state_bits);
    if state_bits > limits.fsm_max_state_bits {
        return Err(ValidationError::StateBits { bits: state_bits, max: limits.fsm_max_state_bits });
    }
    if state_bits + input_bits > limits.fsm_max_state_input_bits {
        return Err(ValidationError::StateInputBits { state_bits, input_bits, max: limits.fsm_max_state_input_bits });
    }

    if options.use_state_bits {
        if output_bits + state_bits > limits.fsm_max_output_bits {
            return Err(ValidationError::StateLanes {
                outputs: output_bits,
                state_bits,
                max: limits.fsm_max_output_bits,
            });
        }
        check_pins(input_bits + output_bits + state_bits, limits)?;
    }

    check_names(spec, options)?;
    let rules = parse_rules(spec)?;
    check_ambiguity(spec, &rules)?;

    let rows = resolve_rows(num_states, state_bits, input_bits, &rules);
    info!(
        "compiled FSM: {} states ({} bits), {} inputs, {} outputs, {} rules, {} rows",
        num_states,
        state_bits,
        input_bits,
        output_bits,
        rules.len(),
        rows.len()
    );

    Ok(CompiledFsm {
        inputs: spec.inputs.clone(),
        outputs: spec.outputs.clone(),
        states: spec.states.clone(),
        state_bits,
        use_state_bits: options.use_state_bits,
        limits: limits.clone(),
        rows,
    })
}

fn check_pins(used: usize, limits: &HardwareLimits) -> Result<(), ValidationError> {
    if used > limits.max_traceable_pins {
        return Err(ValidationError::PinBudget { used, available: limits.max_traceable_pins });
    }
    Ok(())
}

/// Signal names share one namespace since they all become capture lanes.
fn check_names(spec: &FsmSpec, options: CompileOptions) -> Result<(), ValidationError> {
    let mut signals = HashSet::new();
    for port in spec.inputs.iter().chain(spec.outputs.iter()) {
        if options.use_state_bits && port.name.starts_with(STATE_BIT_PREFIX) {
            return Err(ValidationError::ReservedName { name: port.name.clone() });
        }
        if !signals.insert(port.name.as_str()) {
            return Err(ValidationError::DuplicateName { name: port.name.clone() });
        }
    }

    let mut states = HashSet::new();
    for state in &spec.states {
        if state == ANY_STATE {
            return Err(ValidationError::ReservedName { name: state.clone() });
        }
        if !states.insert(state.as_str()) {
            return Err(ValidationError::DuplicateName { name: state.clone() });
        }
    }

    let mut pins = HashSet::new();
    for pin in spec.pins() {
        if !pins.insert(pin) {
            return Err(ValidationError::DuplicatePin { pin: pin.clone() });
        }
    }

    Ok(())
}

fn parse_rules(spec: &FsmSpec) -> Result<Vec<Rule>, ValidationError> {
    let state_index = |transition: usize, name: &str| {
        spec.states
            .iter()
            .position(|state| state == name)
            .map(|index| index as u32)
            .ok_or_else(|| ValidationError::UnknownState { transition, name: name.to_string() })
    };

    spec.transitions
        .iter()
        .enumerate()
        .map(|(index, transition)| {
            let from = match StateRef::parse(&transition.from) {
                StateRef::Any => None,
                StateRef::Named(name) => Some(state_index(index, &name)?),
            };
            let to = state_index(index, &transition.to)?;

            let input = InputPattern::parse(&transition.input, spec.inputs.len()).map_err(|error| {
                ValidationError::Pattern { transition: index, field: PatternField::Input, error }
            })?;
            let output = OutputPattern::parse(&transition.output, spec.outputs.len()).map_err(|error| {
                ValidationError::Pattern { transition: index, field: PatternField::Output, error }
            })?;

            Ok(Rule { index, input, from, to, output })
        })
        .collect()
}

fn check_ambiguity(spec: &FsmSpec, rules: &[Rule]) -> Result<(), ValidationError> {
    for (state_index, state) in spec.states.iter().enumerate() {
        let explicit = rules.iter().filter(|rule| rule.from == Some(state_index as u32));
        for (first, second) in explicit.tuple_combinations() {
            if first.input.overlaps(&second.input) {
                return Err(ValidationError::Ambiguous {
                    state: state.clone(),
                    first: first.index,
                    second: second.index,
                });
            }
        }
    }
    Ok(())
}

/// Resolves every `(state, input)` pair. Explicit rules take precedence over wildcard rules, and
/// among wildcard rules the first declared wins. Uncovered pairs stay in the current state and hold
/// the outputs; unused state encodings return to the reset state.
fn resolve_rows(num_states: usize, state_bits: usize, input_bits: usize, rules: &[Rule]) -> Vec<FsmRow> {
    let wildcards = rules.iter().filter(|rule| rule.from.is_none()).collect::<Vec<_>>();
    let mut uncovered = 0;

    let rows = (0..1usize << state_bits)
        .cartesian_product(0..1u64 << input_bits)
        .map(|(state, input)| {
            if state >= num_states {
                return FsmRow { next_state: 0, output: OutputPattern::Hold };
            }

            let explicit = rules.iter().find(|rule| rule.from == Some(state as u32) && rule.input.matches(input));
            let rule = explicit.or_else(|| wildcards.iter().copied().find(|rule| rule.input.matches(input)));

            match rule {
                Some(rule) => FsmRow { next_state: rule.to, output: rule.output },
                None => {
                    uncovered += 1;
                    FsmRow { next_state: state as u32, output: OutputPattern::Hold }
                }
            }
        })
        .collect::<Vec<_>>();

    if uncovered > 0 {
        debug!("{} (state, input) pairs are not covered by any rule and hold their state", uncovered);
    }
    rows
}

impl CompiledFsm {
    /// Inputs in pattern order.
    pub fn inputs(&self) -> &[Port] { &self.inputs }

    /// Outputs in pattern order.
    pub fn outputs(&self) -> &[Port] { &self.outputs }

    /// State names by index.
    pub fn states(&self) -> &[String] { &self.states }

    /// Number of bits encoding a state.
    pub fn state_bits(&self) -> usize { self.state_bits }

    /// Number of input bits.
    pub fn input_bits(&self) -> usize { self.inputs.len() }

    /// Number of output bits, excluding state lanes.
    pub fn output_bits(&self) -> usize { self.outputs.len() }

    /// Whether the state index is driven on extra lanes.
    pub fn use_state_bits(&self) -> bool { self.use_state_bits }

    /// Limits the table was validated against.
    pub fn limits(&self) -> &HardwareLimits { &self.limits }

    /// Index of the reset state.
    pub fn reset_state(&self) -> u32 { 0 }

    /// Returns the index of the named state.
    pub fn state_index(&self, name: &str) -> Option<u32> {
        self.states.iter().position(|state| state == name).map(|index| index as u32)
    }

    /// All rows, indexed by `state << input_bits | input`.
    pub fn rows(&self) -> &[FsmRow] { &self.rows }

    /// Returns the row for the given state index and input combination.
    pub fn row(&self, state: u32, input: u64) -> Option<&FsmRow> {
        let index = ((state as usize) << self.input_bits()) | input as usize;
        if input >> self.input_bits() != 0 {
            return None;
        }
        self.rows.get(index)
    }

    /// Names of the state lanes, least significant bit first.
    pub fn state_lane_names(&self) -> Vec<String> {
        if !self.use_state_bits {
            return vec![];
        }
        (0..self.state_bits).map(|bit| format!("{}{}", STATE_BIT_PREFIX, bit)).collect()
    }

    /// Names of all lanes a capture of this FSM contains: inputs, outputs, then state lanes.
    pub fn lane_names(&self) -> Vec<String> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .map(|port| port.name.clone())
            .chain(self.state_lane_names())
            .collect()
    }

    /// Packs each row as `next_state | outputs << state_bits | hold << (state_bits + output_bits)`.
    pub fn words(&self) -> Vec<u64> {
        let output_shift = self.state_bits;
        let hold_shift = self.state_bits + self.output_bits();
        self.rows
            .iter()
            .map(|row| {
                let next = u64::from(row.next_state);
                match row.output {
                    OutputPattern::Hold => next | 1 << hold_shift,
                    OutputPattern::Drive(bits) => next | u64::from(bits) << output_shift,
                }
            })
            .collect()
    }
}

impl fmt::Display for CompiledFsm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "inputs:  {}", self.inputs.iter().map(|p| format!("{}@{}", p.name, p.pin)).join(", "))?;
        writeln!(f, "outputs: {}", self.outputs.iter().map(|p| format!("{}@{}", p.name, p.pin)).join(", "))?;
        writeln!(f, "states:  {} ({} bits)", self.states.join(", "), self.state_bits)?;
        writeln!(f, "rows:")?;

        let input_bits = self.input_bits();
        let body = self
            .rows
            .iter()
            .enumerate()
            .filter(|(index, _)| index >> input_bits < self.states.len())
            .map(|(index, row)| {
                let state = &self.states[index >> input_bits];
                let input = u64_to_bitstring(input_bits, (index & ((1 << input_bits) - 1)) as u64);
                let output = match row.output {
                    OutputPattern::Hold => "hold".to_string(),
                    OutputPattern::Drive(bits) => u64_to_bitstring(self.output_bits(), u64::from(bits)),
                };
                format!("{} {} -> {} {}", state, input, self.states[row.next_state as usize], output)
            })
            .join("\n");
        write!(f, "{}", indent(body, 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: HardwareLimits = HardwareLimits::PYNQZ1;

    /// Up/down counter with a synchronous reset, driving `test` high in `S3`.
    fn counter_spec() -> FsmSpec {
        FsmSpec::new()
            .input("rst", "D1")
            .input("direction", "D2")
            .output("test", "D0")
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

    /// Ring of `num_states` states on one input, with the given output per state.
    fn ring_spec(num_states: usize) -> FsmSpec {
        let mut spec = FsmSpec::new().input("rst", "D0").output("test", "D1").transition("1", "*", "S0", "");
        for i in 0..num_states {
            let output = if i % 3 == 0 { "1" } else { "0" };
            spec = spec.state(&format!("S{}", i)).transition(
                "0",
                &format!("S{}", i),
                &format!("S{}", (i + 1) % num_states),
                output,
            );
        }
        spec
    }

    fn drive(row: Option<&FsmRow>) -> (u32, OutputPattern) {
        let row = row.unwrap();
        (row.next_state, row.output)
    }

    #[test]
    fn counter_table() {
        let fsm = compile(&counter_spec(), &LIMITS).unwrap();
        assert_eq!(fsm.state_bits(), 2);
        assert_eq!(fsm.rows().len(), 16);

        assert_eq!(drive(fsm.row(0, 0b00)), (1, OutputPattern::Drive(0)));
        assert_eq!(drive(fsm.row(0, 0b01)), (3, OutputPattern::Drive(0)));
        assert_eq!(drive(fsm.row(3, 0b00)), (0, OutputPattern::Drive(1)));
        assert_eq!(drive(fsm.row(2, 0b10)), (0, OutputPattern::Hold));
        assert_eq!(drive(fsm.row(1, 0b11)), (0, OutputPattern::Hold));
        assert!(fsm.row(0, 0b100).is_none());
        assert!(fsm.row(4, 0).is_none());
    }

    #[test]
    fn too_few_states_rejected() {
        let spec = FsmSpec::new().input("rst", "D0").output("test", "D1").state("S0").transition("1", "*", "S0", "");
        assert_eq!(compile(&spec, &LIMITS), Err(ValidationError::StateCount { count: 1, min: 2, max: 32 }));
    }

    #[test]
    fn too_many_states_rejected() {
        let spec = ring_spec(LIMITS.fsm_max_num_states + 1);
        assert_eq!(compile(&spec, &LIMITS), Err(ValidationError::StateCount { count: 33, min: 2, max: 32 }));
    }

    #[test]
    fn boundary_state_counts_accepted() {
        for num_states in [2, LIMITS.fsm_max_num_states] {
            let fsm = compile(&ring_spec(num_states), &LIMITS).unwrap();
            assert_eq!(fsm.rows().len(), 1 << (fsm.state_bits() + 1));
            assert_eq!(fsm.states().len(), num_states);
        }
        assert_eq!(compile(&ring_spec(2), &LIMITS).unwrap().rows().len(), 4);
        assert_eq!(compile(&ring_spec(32), &LIMITS).unwrap().rows().len(), 64);
    }

    #[test]
    fn widest_table_accepted() {
        let num_states = 1 << (LIMITS.fsm_max_state_input_bits - LIMITS.fsm_max_input_bits);
        let mut spec = FsmSpec::new().transition(&"1".repeat(8), "*", "S0", "");
        for i in 0..8 {
            spec = spec.input(&format!("input{}", i), Pin::new(format!("D{}", i)));
        }
        for i in 0..12 {
            spec = spec.output(&format!("output{}", i), Pin::new(format!("D{}", i + 8)));
        }
        for i in 0..num_states {
            spec = spec.state(&format!("S{}", i)).transition(
                &"0".repeat(8),
                &format!("S{}", i),
                &format!("S{}", (i + 1) % num_states),
                &format!("{:012b}", i),
            );
        }

        let fsm = compile(&spec, &LIMITS).unwrap();
        assert_eq!(fsm.rows().len(), 1 << 13);
        assert_eq!(drive(fsm.row(5, 0)), (6, OutputPattern::Drive(5)));
        assert_eq!(drive(fsm.row(5, 0xff)), (0, OutputPattern::Hold));
        // Neither rule covers mixed inputs.
        assert_eq!(drive(fsm.row(5, 0x0f)), (5, OutputPattern::Hold));
    }

    #[test]
    fn free_running_machine() {
        let num_states = 1 << LIMITS.fsm_max_state_bits;
        let mut spec = FsmSpec::new().input("input0", "D0");
        for i in 0..19 {
            spec = spec.output(&format!("output{}", i), Pin::new(format!("D{}", i + 1)));
        }
        for i in 0..num_states {
            spec = spec.state(&format!("S{}", i)).transition(
                "-",
                &format!("S{}", i),
                &format!("S{}", (i + 1) % num_states),
                &"1".repeat(19),
            );
        }

        let fsm = compile(&spec, &LIMITS).unwrap();
        assert_eq!(fsm.input_bits(), 1);
        assert_eq!(fsm.rows().len(), 64);
        assert_eq!(fsm.row(31, 0), fsm.row(31, 1));
        assert_eq!(drive(fsm.row(31, 1)), (0, OutputPattern::Drive((1 << 19) - 1)));
    }

    #[test]
    fn input_and_output_counts() {
        let no_inputs = FsmSpec { inputs: vec![], ..ring_spec(2) };
        assert!(matches!(compile(&no_inputs, &LIMITS), Err(ValidationError::InputCount { count: 0, .. })));

        let mut wide = ring_spec(2);
        for i in 0..8 {
            wide = wide.input(&format!("extra{}", i), Pin::new(format!("D{}", i + 2)));
        }
        assert!(matches!(compile(&wide, &LIMITS), Err(ValidationError::InputCount { count: 9, .. })));

        let no_outputs = FsmSpec { outputs: vec![], ..ring_spec(2) };
        assert_eq!(compile(&no_outputs, &LIMITS), Err(ValidationError::OutputCount { count: 0, max: 19 }));

        let mut many = ring_spec(2);
        for i in 0..19 {
            many = many.output(&format!("extra{}", i), Pin::new(format!("D{}", i + 2)));
        }
        assert_eq!(compile(&many, &LIMITS), Err(ValidationError::OutputCount { count: 20, max: 19 }));
    }

    #[test]
    fn pin_budget() {
        let limits = HardwareLimits { max_traceable_pins: 2, ..LIMITS };
        let spec = ring_spec(2).output("extra", "D2");
        assert_eq!(compile(&spec, &limits), Err(ValidationError::PinBudget { used: 3, available: 2 }));
    }

    #[test]
    fn table_records_its_limits() {
        let limits = HardwareLimits { max_trace_samples: 1024, ..LIMITS };
        assert_eq!(compile(&ring_spec(2), &limits).unwrap().limits(), &limits);
        assert_eq!(compile(&ring_spec(2), &LIMITS).unwrap().limits(), &LIMITS);
    }

    #[test]
    fn encoding_width() {
        let limits = HardwareLimits { fsm_max_num_states: 64, ..LIMITS };
        assert_eq!(compile(&ring_spec(33), &limits), Err(ValidationError::StateBits { bits: 6, max: 5 }));

        let limits = HardwareLimits { fsm_max_state_input_bits: 5, ..LIMITS };
        assert_eq!(
            compile(&ring_spec(32), &limits),
            Err(ValidationError::StateInputBits { state_bits: 5, input_bits: 1, max: 5 })
        );
    }

    #[test]
    fn state_lanes_count_as_outputs() {
        let options = CompileOptions { use_state_bits: true };
        let fsm = compile_with(&counter_spec(), &LIMITS, options).unwrap();
        assert_eq!(fsm.lane_names(), vec!["rst", "direction", "test", "state_bit0", "state_bit1"]);

        let mut spec = ring_spec(4);
        for i in 0..17 {
            spec = spec.output(&format!("extra{}", i), Pin::new(format!("D{}", i + 2)));
        }
        assert!(compile(&spec, &LIMITS).is_ok());
        assert_eq!(
            compile_with(&spec, &LIMITS, options),
            Err(ValidationError::StateLanes { outputs: 18, state_bits: 2, max: 19 })
        );
    }

    #[test]
    fn undeclared_states() {
        let spec = counter_spec().transition("00", "S9", "S0", "0");
        assert_eq!(compile(&spec, &LIMITS), Err(ValidationError::UnknownState { transition: 9, name: "S9".into() }));

        let spec = counter_spec().transition("00", "*", "*", "0");
        assert_eq!(compile(&spec, &LIMITS), Err(ValidationError::UnknownState { transition: 9, name: "*".into() }));
    }

    #[test]
    fn malformed_patterns() {
        let spec = counter_spec().transition("0", "S0", "S1", "0");
        assert_eq!(
            compile(&spec, &LIMITS),
            Err(ValidationError::Pattern {
                transition: 9,
                field: PatternField::Input,
                error: PatternError::Width { expected: 2, found: 1 },
            })
        );

        let spec = counter_spec().transition("00", "S0", "S1", "-");
        assert!(matches!(
            compile(&spec, &LIMITS),
            Err(ValidationError::Pattern { transition: 9, field: PatternField::Output, .. })
        ));
    }

    #[test]
    fn overlapping_explicit_rules_rejected() {
        let spec = counter_spec().transition("0-", "S2", "S0", "1");
        assert_eq!(
            compile(&spec, &LIMITS),
            Err(ValidationError::Ambiguous { state: "S2".into(), first: 4, second: 9 })
        );
    }

    #[test]
    fn explicit_rules_take_precedence_over_wildcards() {
        let spec = FsmSpec::new()
            .input("in", "D0")
            .output("out", "D1")
            .state("A")
            .state("B")
            .transition("-", "*", "A", "0")
            .transition("-", "*", "B", "1")
            .transition("1", "A", "B", "1");
        let fsm = compile(&spec, &LIMITS).unwrap();
        assert_eq!(drive(fsm.row(0, 1)), (1, OutputPattern::Drive(1)));
        assert_eq!(drive(fsm.row(0, 0)), (0, OutputPattern::Drive(0)));
        assert_eq!(drive(fsm.row(1, 1)), (0, OutputPattern::Drive(0)));
    }

    #[test]
    fn unused_encodings_return_to_reset() {
        let fsm = compile(&ring_spec(3), &LIMITS).unwrap();
        assert_eq!(fsm.state_bits(), 2);
        assert_eq!(drive(fsm.row(3, 0)), (0, OutputPattern::Hold));
    }

    #[test]
    fn duplicate_declarations() {
        let spec = counter_spec().output("rst", "D5");
        assert_eq!(compile(&spec, &LIMITS), Err(ValidationError::DuplicateName { name: "rst".into() }));

        let spec = counter_spec().state("S1");
        assert_eq!(compile(&spec, &LIMITS), Err(ValidationError::DuplicateName { name: "S1".into() }));

        let spec = counter_spec().output("other", "D1");
        assert_eq!(compile(&spec, &LIMITS), Err(ValidationError::DuplicatePin { pin: Pin::new("D1") }));

        let spec = counter_spec().output("state_bit0", "D5");
        assert!(compile(&spec, &LIMITS).is_ok());
        assert_eq!(
            compile_with(&spec, &LIMITS, CompileOptions { use_state_bits: true }),
            Err(ValidationError::ReservedName { name: "state_bit0".into() })
        );
    }

    #[test]
    fn packed_words() {
        let fsm = compile(&counter_spec(), &LIMITS).unwrap();
        let words = fsm.words();
        assert_eq!(words.len(), 16);
        // S3, input 00: next S0, output 1 above the two state bits.
        assert_eq!(words[0b11_00], 0b1_00);
        // S0, input 10: next S0, hold flag above state and output bits.
        assert_eq!(words[0b00_10], 0b1_0_00);
    }

    #[test]
    fn display_lists_rows() {
        let dump = compile(&counter_spec(), &LIMITS).unwrap().to_string();
        assert!(dump.contains("S0 00 -> S1 0"));
        assert!(dump.contains("S3 1- -> S0 hold") || dump.contains("S3 10 -> S0 hold"));
    }
}
