//! Board description and pin wiring.

use linked_hash_map::LinkedHashMap;

use fsmflow::{HardwareLimits, Level, Pin};

/// FSM generator board: its traceable pins and limits.
#[derive(Debug, Clone)]
pub struct Board {
    /// Board name.
    pub name: String,
    /// Traceable pins in header order.
    pub pins: Vec<Pin>,
    /// Limits of the generator.
    pub limits: HardwareLimits,
}

impl Board {
    /// PYNQ-Z1 Arduino header, `D0` to `D19`.
    pub fn pynqz1() -> Self {
        let limits = HardwareLimits::PYNQZ1;
        let pins = (0..limits.max_traceable_pins).map(|i| Pin::new(format!("D{}", i))).collect();
        Self { name: "PYNQ-Z1".to_string(), pins, limits }
    }

    /// Returns whether the board has the pin.
    pub fn has_pin(&self, pin: &Pin) -> bool { self.pins.contains(pin) }
}

/// External connections of input pins. Unconnected pins read low.
#[derive(Debug, Clone, Default)]
pub struct Wiring {
    ties: LinkedHashMap<Pin, Level>,
}

impl Wiring {
    /// No pin connected.
    pub fn new() -> Self { Self::default() }

    /// Ties `pin` to `level`.
    pub fn tie(mut self, pin: &Pin, level: Level) -> Self {
        self.ties.insert(pin.clone(), level);
        self
    }

    /// Level seen on `pin`.
    pub fn level(&self, pin: &Pin) -> Level { self.ties.get(pin).copied().unwrap_or(Level::Low) }

    /// Connected pins and their levels.
    pub fn ties(&self) -> impl Iterator<Item = (&Pin, Level)> + '_ { self.ties.iter().map(|(pin, level)| (pin, *level)) }
}
