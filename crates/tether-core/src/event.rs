//! Incoming event and interaction payloads.
//!
//! The harness does not model the platform's event zoo; an [`Event`] is a
//! name plus whatever JSON the client delivered. Slash command invocations
//! arrive as [`Interaction`]s with their option values already split out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named platform event with its raw JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// The platform's event name (e.g. `message_create`).
    pub name: String,
    /// The raw payload as delivered by the client.
    #[serde(default)]
    pub payload: Value,
}

impl Event {
    /// Creates an event with a payload.
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Creates an event with no payload body.
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, Value::Null)
    }
}

/// A value supplied for a slash command option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// A string option.
    String(String),
    /// An integer option.
    Integer(i64),
    /// A floating-point option.
    Number(f64),
    /// A boolean option.
    Boolean(bool),
}

impl OptionValue {
    /// Returns the string value, if this is a string option.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an integer option.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the numeric value. Integer options widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is a boolean option.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// A slash command invocation delivered by the platform.
#[derive(Debug, Clone)]
pub struct Interaction {
    /// The invoked command's name.
    pub command: String,
    /// Supplied options, in the order the platform delivered them.
    pub options: Vec<(String, OptionValue)>,
    /// Channel the command was invoked in, if the platform scopes it.
    pub channel_id: Option<String>,
    /// User who invoked the command, if known.
    pub user_id: Option<String>,
}

impl Interaction {
    /// Creates an interaction for the named command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            options: Vec::new(),
            channel_id: None,
            user_id: None,
        }
    }

    /// Adds an option value (builder pattern).
    pub fn with_option(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.options.push((name.into(), value));
        self
    }

    /// Looks up an option by name.
    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}
