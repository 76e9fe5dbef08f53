//! The closed error taxonomy shared by every stage of the compiler.
//!
//! A [`StructuredError`] is always `{code, message, details}` (see the
//! external error serialization contract): `code` is one of the fixed
//! [`ErrorCode`] variants, `message` is a human-readable summary, and
//! `details` carries whatever code-specific data locates the cause
//! (node ids, unit strings, indices) without the caller re-reading inputs.

use serde_json::{Map, Value};

/// Closed error taxonomy. Every stage (structural, dimensional, emission,
/// runtime, aggregate) draws its codes from here; none are invented ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Structural
    DupNodeId,
    OutputMissing,
    OpForbidden,
    ArgMissing,
    Cycle,
    InputMissing,
    // Dimensional
    DimMixedSum,
    DimInvalid,
    NonDimlessArg,
    // Emission
    UnsupportedOp,
    InputOrderMismatch,
    // Runtime
    InputLengthMismatch,
    MissingInputColumn,
    EngineUnavailable,
    // Aggregate
    Admissibility,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DupNodeId => "E_DUP_NODE_ID",
            Self::OutputMissing => "E_OUTPUT_MISSING",
            Self::OpForbidden => "E_OP_FORBIDDEN",
            Self::ArgMissing => "E_ARG_MISSING",
            Self::Cycle => "E_CYCLE",
            Self::InputMissing => "E_INPUT_MISSING",
            Self::DimMixedSum => "E_DIM_MIXED_SUM",
            Self::DimInvalid => "E_DIM_INVALID",
            Self::NonDimlessArg => "E_NON_DIMLESS_ARG",
            Self::UnsupportedOp => "E_UNSUPPORTED_OP",
            Self::InputOrderMismatch => "E_INPUT_ORDER_MISMATCH",
            Self::InputLengthMismatch => "E_INPUT_LENGTH_MISMATCH",
            Self::MissingInputColumn => "E_MISSING_INPUT_COLUMN",
            Self::EngineUnavailable => "E_ENGINE_UNAVAILABLE",
            Self::Admissibility => "E_ADMISSIBILITY",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic: `{code, message, details}`.
///
/// `details` is a JSON object map rather than a [`crate::canon::CanonValue`]
/// on purpose -- diagnostics are never hashed, only serialized for a caller
/// to read, so they carry whatever `serde_json` shape is convenient.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Map<String, Value>,
}

impl StructuredError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Map<String, Value>) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }

    /// Build from a `serde_json::json!({...})` value; non-object values are
    /// wrapped under a `"value"` key so callers never need a match arm.
    #[must_use]
    pub fn with_value(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        let details = match details {
            Value::Object(m) => m,
            other => {
                let mut m = Map::new();
                m.insert("value".to_string(), other);
                m
            }
        };
        Self::new(code, message, details)
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for StructuredError {}
