//! Error types for camera configuration access.
//!
//! `CameraError` covers two families:
//!
//! - **Validation errors** (`UnknownWidgetType`, `NotSupported`, `InvalidChoice`,
//!   `OutOfRange`, `InvalidValue`, `ReadOnly`, `UnknownKey`): raised at the point
//!   of the offending call, before any device call is attempted.
//! - **Device errors** (`Device`, `Unmapped`): a driver call returned a negative
//!   result code. `Device` carries the kind registered for that code in the
//!   [`ErrorTaxonomy`](crate::result::ErrorTaxonomy); `Unmapped` is the fallback
//!   for codes the taxonomy does not know.
//!
//! No error is retried automatically.

use thiserror::Error;

use crate::result::DeviceErrorKind;
use crate::widget::WidgetKind;

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, CameraError>;

/// Errors that can occur while reading, editing or committing configuration.
#[derive(Error, Debug)]
pub enum CameraError {
    /// The driver handed back a widget with a type tag outside the known set.
    #[error("Unknown widget type tag {tag}")]
    UnknownWidgetType {
        /// The unrecognized tag.
        tag: i32,
    },

    /// Value access on a widget kind that carries no value.
    #[error("Widget '{id}' of kind {kind} has no value")]
    NotSupported {
        /// Widget id.
        id: String,
        /// Widget kind.
        kind: WidgetKind,
    },

    /// Value is not one of the widget's allowed choices.
    #[error("Invalid choice '{value}' for '{id}' (allowed: {})", .choices.join(", "))]
    InvalidChoice {
        /// Widget id.
        id: String,
        /// Rejected value, as text.
        value: String,
        /// Allowed values.
        choices: Vec<String>,
    },

    /// Numeric value lies outside the widget's range.
    #[error("Value {value} for '{id}' is outside [{min}, {max}]")]
    OutOfRange {
        /// Widget id.
        id: String,
        /// Rejected value.
        value: f64,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },

    /// Value cannot be coerced to the widget's kind.
    #[error("Invalid value for '{id}': {reason}")]
    InvalidValue {
        /// Widget id.
        id: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Write to a widget the driver marked read-only.
    #[error("Widget '{id}' is read-only")]
    ReadOnly {
        /// Widget id.
        id: String,
    },

    /// No widget with this id in the configuration.
    #[error("Invalid key: {key}")]
    UnknownKey {
        /// The requested key.
        key: String,
    },

    /// A device call failed with a registered result code.
    #[error("{description} ({code}) [{kind}]")]
    Device {
        /// Registered kind for the code.
        kind: DeviceErrorKind,
        /// Raw driver result code.
        code: i32,
        /// Driver description of the code.
        description: String,
    },

    /// A device call failed with a code the taxonomy does not know.
    #[error("{description} ({code})")]
    Unmapped {
        /// Raw driver result code.
        code: i32,
        /// Driver-provided description.
        description: String,
    },

    /// Settings file could not be loaded or deserialized.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error from the operating system.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CameraError {
    /// Driver result code, for device errors.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Device { code, .. } | Self::Unmapped { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Registered device kind, for mapped device errors.
    pub fn device_kind(&self) -> Option<DeviceErrorKind> {
        match self {
            Self::Device { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Check if this error was raised before touching the device.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownWidgetType { .. }
                | Self::NotSupported { .. }
                | Self::InvalidChoice { .. }
                | Self::OutOfRange { .. }
                | Self::InvalidValue { .. }
                | Self::ReadOnly { .. }
                | Self::UnknownKey { .. }
        )
    }

    /// Check if this error came from a driver result code.
    pub fn is_device(&self) -> bool {
        matches!(self, Self::Device { .. } | Self::Unmapped { .. })
    }

    /// Check if the device timed out.
    pub fn is_timeout(&self) -> bool {
        self.device_kind() == Some(DeviceErrorKind::Timeout)
    }

    /// Check if the camera reported it was busy.
    pub fn is_busy(&self) -> bool {
        self.device_kind() == Some(DeviceErrorKind::CameraBusy)
    }
}
