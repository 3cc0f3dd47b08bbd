//! Loosely typed upstream cells.
//!
//! Providers disagree on whether ids, scores and dates are numbers or strings, and sometimes
//! change their minds between seasons. `Loose` accepts either and offers the conversions the
//! normalizers need.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum Loose {
    Int(i64),
    Float(f64),
    Text(String),
    Flag(bool),
}

impl Loose {
    /// Render as text; whole floats lose their fractional part.
    pub(crate) fn text(&self) -> String {
        match self {
            Loose::Int(value) => value.to_string(),
            Loose::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                format!("{}", *value as i64)
            }
            Loose::Float(value) => value.to_string(),
            Loose::Text(value) => value.trim().to_string(),
            Loose::Flag(value) => value.to_string(),
        }
    }

    /// Integer value, parsing text where possible.
    pub(crate) fn int(&self) -> Option<i64> {
        match self {
            Loose::Int(value) => Some(*value),
            Loose::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                Some(*value as i64)
            }
            Loose::Text(value) => value.trim().parse().ok(),
            Loose::Float(_) | Loose::Flag(_) => None,
        }
    }
}

/// Text of an optional cell, with empty strings treated as absent.
pub(crate) fn text_of(cell: Option<&Loose>) -> Option<String> {
    cell.map(Loose::text).filter(|value| !value.is_empty())
}
