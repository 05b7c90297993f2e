// Payload and Output Protocol

use serde::{Deserialize, Serialize};

/// Default prefix for the marker output protocol
pub const DEFAULT_RESULT_MARKER: &str = "@@GREENEARTH_RESULT@@";

/// Structured result returned verbatim to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(serde_json::Value);

impl Payload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

/// Rule deciding which line of a script's stdout carries the payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputProtocol {
    /// Last non-blank line is the payload; everything before it is noise
    #[default]
    LastLine,
    /// Last line starting with the given prefix is the payload (prefix stripped)
    Marker(String),
}
