//! Symbolic FSM specification.
//!
//! The record keeps the machine-readable shape used by FSM generator drivers:
//!
//! ```json
//! {
//!   "inputs": [["rst", "D1"], ["direction", "D2"]],
//!   "outputs": [["test", "D0"]],
//!   "states": ["S0", "S1"],
//!   "transitions": [["00", "S0", "S1", "0"], ["1-", "*", "S0", ""]]
//! }
//! ```
//!
//! Patterns stay symbolic here; they are parsed once into [`pattern`] values by the compiler.

mod pattern;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use pattern::*;

/// Physical signal line on the interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pin(String);

impl Pin {
    /// Creates a pin reference.
    pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }

    /// Returns the pin name.
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for Pin {
    fn from(name: &str) -> Self { Self::new(name) }
}

/// Named input or output bound to a pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, Pin)", into = "(String, Pin)")]
pub struct Port {
    /// Logical signal name.
    pub name: String,
    /// Physical pin.
    pub pin: Pin,
}

impl From<(String, Pin)> for Port {
    fn from((name, pin): (String, Pin)) -> Self { Self { name, pin } }
}

impl From<Port> for (String, Pin) {
    fn from(port: Port) -> Self { (port.name, port.pin) }
}

/// Transition rule `(input_pattern, from_state, to_state, output_pattern)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String, String, String)", into = "(String, String, String, String)")]
pub struct Transition {
    /// Input pattern over `{0,1,-}`.
    pub input: String,
    /// Current state name or `*`.
    pub from: String,
    /// Next state name.
    pub to: String,
    /// Output pattern over `{0,1}`, empty to hold the outputs.
    pub output: String,
}

impl From<(String, String, String, String)> for Transition {
    fn from((input, from, to, output): (String, String, String, String)) -> Self { Self { input, from, to, output } }
}

impl From<Transition> for (String, String, String, String) {
    fn from(t: Transition) -> Self { (t.input, t.from, t.to, t.output) }
}

/// FSM specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsmSpec {
    /// Inputs, most significant pattern bit first.
    pub inputs: Vec<Port>,
    /// Outputs, most significant pattern bit first.
    pub outputs: Vec<Port>,
    /// States; the first one is the reset state.
    pub states: Vec<String>,
    /// Transition rules in declaration order.
    pub transitions: Vec<Transition>,
}

impl FsmSpec {
    /// Creates an empty specification.
    pub fn new() -> Self { Self::default() }

    /// Adds an input.
    pub fn input(mut self, name: &str, pin: impl Into<Pin>) -> Self {
        self.inputs.push(Port { name: name.to_string(), pin: pin.into() });
        self
    }

    /// Adds an output.
    pub fn output(mut self, name: &str, pin: impl Into<Pin>) -> Self {
        self.outputs.push(Port { name: name.to_string(), pin: pin.into() });
        self
    }

    /// Adds a state.
    pub fn state(mut self, name: &str) -> Self {
        self.states.push(name.to_string());
        self
    }

    /// Adds a transition.
    pub fn transition(mut self, input: &str, from: &str, to: &str, output: &str) -> Self {
        self.transitions.push(Transition {
            input: input.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            output: output.to_string(),
        });
        self
    }

    /// Parses a specification from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> { serde_json::from_str(json) }

    /// Serializes the specification to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> { serde_json::to_string_pretty(self) }

    /// Iterates over all pins used by inputs and outputs.
    pub fn pins(&self) -> impl Iterator<Item = &Pin> + '_ {
        self.inputs.iter().chain(self.outputs.iter()).map(|port| &port.pin)
    }
}
