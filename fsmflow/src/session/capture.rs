//! Waveform capture.

use linked_hash_map::LinkedHashMap;
use serde::{Deserialize, Serialize};

use crate::codec::{self, CodecError};

/// Captured waveforms by signal name, in lane order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    lanes: LinkedHashMap<String, String>,
}

impl Capture {
    /// Creates an empty capture.
    pub fn new() -> Self { Self::default() }

    /// Adds a lane given as a waveform string.
    pub fn insert(&mut self, name: &str, wave: String) { self.lanes.insert(name.to_string(), wave); }

    /// Adds a lane given as samples.
    pub fn insert_samples(&mut self, name: &str, samples: &[u8]) -> Result<(), CodecError> {
        self.insert(name, codec::encode_waveform(samples)?);
        Ok(())
    }

    /// Returns the waveform string of a lane.
    pub fn wave(&self, name: &str) -> Option<&str> { self.lanes.get(name).map(String::as_str) }

    /// Decodes a lane into samples.
    pub fn samples(&self, name: &str) -> Option<Result<Vec<u8>, CodecError>> {
        self.wave(name).map(codec::decode_waveform)
    }

    /// Lane names in capture order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ { self.lanes.keys().map(String::as_str) }

    /// Iterates over `(name, wave)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.lanes.iter().map(|(name, wave)| (name.as_str(), wave.as_str()))
    }

    /// Number of lanes.
    pub fn len(&self) -> usize { self.lanes.len() }

    /// Returns whether the capture has no lanes.
    pub fn is_empty(&self) -> bool { self.lanes.is_empty() }
}
