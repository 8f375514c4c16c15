//! Board limits the FSM compiler and the session honor.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

use crate::compiler::ValidationError;
use crate::spec::MAX_PATTERN_BITS;

/// Hardware limits of an FSM generator.
///
/// These are board parameters; the compiler never assumes a particular board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareLimits {
    /// Minimum number of bits used to encode a state.
    pub fsm_min_state_bits: usize,
    /// Maximum number of bits used to encode a state.
    pub fsm_max_state_bits: usize,
    /// Minimum number of states.
    pub fsm_min_num_states: usize,
    /// Maximum number of states.
    pub fsm_max_num_states: usize,
    /// Minimum number of input bits.
    pub fsm_min_input_bits: usize,
    /// Maximum number of input bits.
    pub fsm_max_input_bits: usize,
    /// Maximum number of state bits plus input bits, i.e. the address width of the table memory.
    pub fsm_max_state_input_bits: usize,
    /// Maximum number of output bits.
    pub fsm_max_output_bits: usize,
    /// Maximum number of samples the analyzer can capture.
    pub max_trace_samples: usize,
    /// Number of pins that can be driven and traced.
    pub max_traceable_pins: usize,
    /// Slowest supported clock in MHz.
    pub min_clock_mhz: f64,
    /// Fastest supported clock in MHz.
    pub max_clock_mhz: f64,
}

/// Minimum number of state bits on PYNQ-Z1.
pub const PYNQZ1_FSM_MIN_STATE_BITS: usize = 1;
/// Maximum number of state bits on PYNQ-Z1.
pub const PYNQZ1_FSM_MAX_STATE_BITS: usize = 5;
/// Maximum number of input bits on PYNQ-Z1.
pub const PYNQZ1_FSM_MAX_INPUT_BITS: usize = 8;
/// Table address width on PYNQ-Z1.
pub const PYNQZ1_FSM_MAX_STATE_INPUT_BITS: usize = 13;
/// Maximum number of output bits on PYNQ-Z1.
pub const PYNQZ1_FSM_MAX_OUTPUT_BITS: usize = 19;
/// Arduino header width on PYNQ-Z1.
pub const PYNQZ1_INTERFACE_WIDTH: usize = 20;

const_assert!(PYNQZ1_FSM_MAX_INPUT_BITS <= MAX_PATTERN_BITS);
const_assert!(PYNQZ1_FSM_MAX_OUTPUT_BITS <= MAX_PATTERN_BITS);
const_assert!(PYNQZ1_FSM_MAX_STATE_BITS + PYNQZ1_FSM_MAX_INPUT_BITS <= PYNQZ1_FSM_MAX_STATE_INPUT_BITS);
const_assert!(PYNQZ1_FSM_MAX_OUTPUT_BITS < PYNQZ1_INTERFACE_WIDTH);

impl HardwareLimits {
    /// PYNQ-Z1 interface overlay driving the Arduino header.
    pub const PYNQZ1: Self = Self {
        fsm_min_state_bits: PYNQZ1_FSM_MIN_STATE_BITS,
        fsm_max_state_bits: PYNQZ1_FSM_MAX_STATE_BITS,
        fsm_min_num_states: 2,
        fsm_max_num_states: 1 << PYNQZ1_FSM_MAX_STATE_BITS,
        fsm_min_input_bits: 1,
        fsm_max_input_bits: PYNQZ1_FSM_MAX_INPUT_BITS,
        fsm_max_state_input_bits: PYNQZ1_FSM_MAX_STATE_INPUT_BITS,
        fsm_max_output_bits: PYNQZ1_FSM_MAX_OUTPUT_BITS,
        max_trace_samples: 4096,
        max_traceable_pins: PYNQZ1_INTERFACE_WIDTH,
        min_clock_mhz: 0.252,
        max_clock_mhz: 100.0,
    };

    /// Checks that the limits are self-consistent and representable by the compiler.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let checks = [
            ("fsm_max_input_bits", self.fsm_max_input_bits, MAX_PATTERN_BITS),
            ("fsm_max_output_bits", self.fsm_max_output_bits, MAX_PATTERN_BITS),
            ("fsm_max_state_bits", self.fsm_max_state_bits, MAX_PATTERN_BITS),
            ("fsm_min_input_bits", self.fsm_min_input_bits, self.fsm_max_input_bits),
            ("fsm_min_state_bits", self.fsm_min_state_bits, self.fsm_max_state_bits),
            ("fsm_min_num_states", self.fsm_min_num_states, self.fsm_max_num_states),
        ];
        for (name, value, max) in checks {
            if value > max {
                return Err(ValidationError::UnsupportedLimit { name, value, max });
            }
        }

        if self.fsm_min_input_bits == 0 {
            return Err(ValidationError::UnsupportedLimit { name: "fsm_min_input_bits", value: 0, max: 0 });
        }

        if !(self.min_clock_mhz > 0.0 && self.min_clock_mhz <= self.max_clock_mhz) {
            return Err(ValidationError::ClockRange { min: self.min_clock_mhz, max: self.max_clock_mhz });
        }

        Ok(())
    }

    /// Returns whether `mhz` is inside the supported clock range.
    pub fn supports_clock(&self, mhz: f64) -> bool { self.min_clock_mhz <= mhz && mhz <= self.max_clock_mhz }
}

impl Default for HardwareLimits {
    fn default() -> Self { Self::PYNQZ1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pynqz1_preset_is_consistent() {
        let limits = HardwareLimits::PYNQZ1;
        assert!(limits.validate().is_ok());
        assert_eq!(limits.fsm_max_num_states, 32);
        assert!(limits.supports_clock(10.0));
        assert!(limits.supports_clock(100.0));
        assert!(!limits.supports_clock(0.1));
    }

    #[test]
    fn oversized_limits_are_rejected() {
        let limits = HardwareLimits { fsm_max_input_bits: 40, ..HardwareLimits::PYNQZ1 };
        assert!(matches!(
            limits.validate(),
            Err(ValidationError::UnsupportedLimit { name: "fsm_max_input_bits", value: 40, .. })
        ));
    }

    #[test]
    fn limits_load_from_json() {
        let json = serde_json::to_string(&HardwareLimits::PYNQZ1).unwrap();
        let limits: HardwareLimits = serde_json::from_str(&json).unwrap();
        assert_eq!(limits, HardwareLimits::PYNQZ1);
    }
}
