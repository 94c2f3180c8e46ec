//! Command results and their mapping to an exit status.

use serde_json::{Map, Value};
use tracing::warn;

use super::DISPATCH_TARGET;

/// Status code reported by a transport-level response.
pub const STATUS_OK: u16 = 200;

/// A response obtained from a broker over the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
}

/// Everything a command handler may produce.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    Response(TransportResponse),
    Bool(bool),
    Integer(i64),
    Mapping(Map<String, Value>),
    Nothing,
    /// A result of a shape the normalizer does not recognise, by name.
    Other(String),
}

impl DispatchResult {
    /// Result used for every failure the dispatcher recovers from.
    #[must_use]
    pub const fn failure() -> Self {
        Self::Bool(false)
    }

    /// Name of the result shape, for diagnostics.
    #[must_use]
    pub fn shape(&self) -> &str {
        match self {
            Self::Response(_) => "response",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Mapping(_) => "mapping",
            Self::Nothing => "nothing",
            Self::Other(shape) => shape,
        }
    }

    /// Maps the result to a process exit status.
    #[must_use]
    pub fn exit_status(&self) -> i64 {
        match self {
            Self::Response(response) => i64::from(response.status != STATUS_OK),
            Self::Bool(value) => i64::from(!value),
            Self::Integer(value) => *value,
            Self::Mapping(_) | Self::Nothing => 0,
            Self::Other(shape) => {
                warn!(
                    target: DISPATCH_TARGET,
                    shape = %shape,
                    "unrecognised result shape, reporting failure"
                );
                1
            }
        }
    }
}

impl From<Value> for DispatchResult {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Nothing,
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => match number.as_i64() {
                Some(integer) => Self::Integer(integer),
                None => Self::Other(String::from("float")),
            },
            Value::Object(map) => Self::Mapping(map),
            Value::String(_) => Self::Other(String::from("string")),
            Value::Array(_) => Self::Other(String::from("array")),
        }
    }
}
