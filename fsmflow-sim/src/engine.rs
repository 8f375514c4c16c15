//! Cycle-level evaluation of a packed transition table.

use fsmflow::utils::msb_bit;
use fsmflow::CompiledFsm;

/// Samples of one simulated tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    /// Current state index.
    pub state: u32,
    /// Output bits, most significant (first output) first.
    pub outputs: u64,
}

/// Table memory plus the state and output registers.
#[derive(Debug, Clone)]
pub struct Engine {
    words: Vec<u64>,
    state_bits: usize,
    input_bits: usize,
    output_bits: usize,
    state: u32,
    outputs: u64,
}

const fn mask(bits: usize) -> u64 { (1 << bits) - 1 }

impl Engine {
    /// Creates an engine from the packed table image of `fsm`.
    pub fn new(fsm: &CompiledFsm, words: Vec<u64>) -> Self {
        Self {
            words,
            state_bits: fsm.state_bits(),
            input_bits: fsm.input_bits(),
            output_bits: fsm.output_bits(),
            state: fsm.reset_state(),
            outputs: 0,
        }
    }

    /// Returns to the reset state with all outputs low.
    pub fn reset(&mut self) {
        self.state = 0;
        self.outputs = 0;
    }

    /// Runs one clock cycle with the given input combination and returns what the pins show.
    pub fn step(&mut self, input: u64) -> Tick {
        let address = ((self.state as usize) << self.input_bits) | (input & mask(self.input_bits)) as usize;
        let word = self.words.get(address).copied().unwrap_or(0);

        let hold = (word >> (self.state_bits + self.output_bits)) & 1 == 1;
        if !hold {
            self.outputs = (word >> self.state_bits) & mask(self.output_bits);
        }

        let tick = Tick { state: self.state, outputs: self.outputs };
        self.state = (word & mask(self.state_bits)) as u32;
        tick
    }

    /// Level of output `index` in a tick.
    pub fn output_sample(&self, tick: &Tick, index: usize) -> u8 { u8::from(msb_bit(tick.outputs, self.output_bits, index)) }

    /// Level of state bit `bit` (least significant first) in a tick.
    pub fn state_sample(tick: &Tick, bit: usize) -> u8 { ((tick.state >> bit) & 1) as u8 }
}

#[cfg(test)]
mod tests {
    use fsmflow::{compile, FsmSpec, HardwareLimits};

    use super::*;

    fn ring() -> CompiledFsm {
        let spec = FsmSpec::new()
            .input("rst", "D0")
            .output("a", "D1")
            .output("b", "D2")
            .state("S0")
            .state("S1")
            .state("S2")
            .transition("0", "S0", "S1", "10")
            .transition("0", "S1", "S2", "01")
            .transition("0", "S2", "S0", "")
            .transition("1", "*", "S0", "00");
        compile(&spec, &HardwareLimits::PYNQZ1).unwrap()
    }

    #[test]
    fn steps_through_the_ring() {
        let fsm = ring();
        let mut engine = Engine::new(&fsm, fsm.words());

        let ticks = (0..4).map(|_| engine.step(0)).collect::<Vec<_>>();
        assert_eq!(ticks.iter().map(|t| t.state).collect::<Vec<_>>(), vec![0, 1, 2, 0]);
        // S2 holds the outputs of S1.
        assert_eq!(ticks.iter().map(|t| t.outputs).collect::<Vec<_>>(), vec![0b10, 0b01, 0b01, 0b10]);

        assert_eq!(engine.output_sample(&ticks[0], 0), 1);
        assert_eq!(engine.output_sample(&ticks[0], 1), 0);
        assert_eq!(Engine::state_sample(&ticks[2], 1), 1);
    }

    #[test]
    fn reset_input_returns_to_first_state() {
        let fsm = ring();
        let mut engine = Engine::new(&fsm, fsm.words());
        engine.step(0);
        engine.step(0);
        assert_eq!(engine.step(1), Tick { state: 2, outputs: 0 });
        assert_eq!(engine.step(0).state, 0);

        engine.reset();
        assert_eq!(engine.step(0), Tick { state: 0, outputs: 0b10 });
    }
}
