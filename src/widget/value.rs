//! Typed widget values.

use std::fmt;

use chrono::{DateTime, Utc};

/// A widget value decoded per kind.
///
/// Text, radio and menu widgets read as `Text`, range widgets as `Float`,
/// toggles as `Bool` (or `Auto` for the third state of a tri-state toggle),
/// date widgets as `Date`. `Int` only appears as an input and is coerced.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetValue {
    /// Text, radio and menu values.
    Text(String),
    /// Range values.
    Float(f32),
    /// Integer input, coerced per kind.
    Int(i64),
    /// Toggle off or on.
    Bool(bool),
    /// Third state of a tri-state toggle.
    Auto,
    /// Date values.
    Date(DateTime<Utc>),
}

impl WidgetValue {
    /// Borrow the text, for `Text` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view: floats, integers and numeric text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(f64::from(*f)),
            Self::Int(i) => Some(*i as f64),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Boolean view: `Bool` values only.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Timestamp view: `Date` values only.
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl fmt::Display for WidgetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Float(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Auto => f.write_str("auto"),
            Self::Date(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

impl From<&str> for WidgetValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for WidgetValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<f32> for WidgetValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for WidgetValue {
    fn from(v: f64) -> Self {
        Self::Float(v as f32)
    }
}

impl From<i32> for WidgetValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for WidgetValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for WidgetValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<DateTime<Utc>> for WidgetValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Date(v)
    }
}
