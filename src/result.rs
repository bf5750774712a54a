//! Driver result codes and the process-wide error taxonomy.
//!
//! libgphoto2 reports every operation's outcome as an integer: zero or
//! positive on success, negative on failure. [`RESULT_TABLE`] is the driver's
//! code table (port results -1..-70, camera results -102..-115). The
//! [`ErrorTaxonomy`] is built from that table exactly once and registers one
//! [`DeviceErrorKind`] per negative code, so the same code always maps to the
//! same kind.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{CameraError, Result};

/// Success code.
pub const GP_OK: i32 = 0;

/// A raw driver status code returned by a failed device call.
///
/// Drivers only produce `Err(ResultCode)` for negative codes; the core maps
/// it to a [`CameraError`] through the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(pub i32);

impl ResultCode {
    /// Whether the code represents success.
    pub fn is_ok(self) -> bool {
        self.0 >= GP_OK
    }

    /// Convert into a `Result`, mapping failures through the taxonomy.
    pub fn check(self) -> Result<i32> {
        check(self.0)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", describe_result(self.0), self.0)
    }
}

macro_rules! result_codes {
    ($( $variant:ident = ($code:expr, $symbol:literal, $desc:literal) ),* $(,)?) => {
        /// Typed failure kinds, one per negative driver result code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum DeviceErrorKind {
            $(
                #[doc = $desc]
                $variant,
            )*
        }

        impl DeviceErrorKind {
            /// Every registered kind in table order.
            pub const ALL: &'static [DeviceErrorKind] = &[$(DeviceErrorKind::$variant),*];

            /// The driver's integer code for this kind.
            pub fn code(self) -> i32 {
                match self {
                    $(DeviceErrorKind::$variant => $code,)*
                }
            }

            /// The driver's symbolic constant, e.g. `GP_ERROR_TIMEOUT`.
            pub fn symbol(self) -> &'static str {
                match self {
                    $(DeviceErrorKind::$variant => $symbol,)*
                }
            }

            /// Human-readable description as the driver phrases it.
            pub fn description(self) -> &'static str {
                match self {
                    $(DeviceErrorKind::$variant => $desc,)*
                }
            }

            /// Resolve a symbolic constant to its kind.
            pub fn from_symbol(symbol: &str) -> Option<Self> {
                match symbol {
                    $($symbol => Some(DeviceErrorKind::$variant),)*
                    _ => None,
                }
            }
        }

        /// The driver's result-code table: `(code, symbol, description)`.
        pub const RESULT_TABLE: &[(i32, &str, &str)] = &[
            (GP_OK, "GP_OK", "No error"),
            $(($code, $symbol, $desc),)*
        ];
    };
}

result_codes! {
    Generic = (-1, "GP_ERROR", "Unspecified error"),
    BadParameters = (-2, "GP_ERROR_BAD_PARAMETERS", "Bad parameters"),
    NoMemory = (-3, "GP_ERROR_NO_MEMORY", "Out of memory"),
    Library = (-4, "GP_ERROR_LIBRARY", "Error loading a library"),
    UnknownPort = (-5, "GP_ERROR_UNKNOWN_PORT", "Unknown port"),
    NotSupported = (-6, "GP_ERROR_NOT_SUPPORTED", "Unsupported operation"),
    Io = (-7, "GP_ERROR_IO", "I/O problem"),
    FixedLimitExceeded = (-8, "GP_ERROR_FIXED_LIMIT_EXCEEDED", "Fixed limit exceeded"),
    Timeout = (-10, "GP_ERROR_TIMEOUT", "Timeout reading from or writing to the port"),
    IoSupportedSerial = (-20, "GP_ERROR_IO_SUPPORTED_SERIAL", "Serial port not supported"),
    IoSupportedUsb = (-21, "GP_ERROR_IO_SUPPORTED_USB", "USB port not supported"),
    IoInit = (-31, "GP_ERROR_IO_INIT", "Error initializing the port"),
    IoRead = (-34, "GP_ERROR_IO_READ", "Error reading from the port"),
    IoWrite = (-35, "GP_ERROR_IO_WRITE", "Error writing to the port"),
    IoUpdate = (-37, "GP_ERROR_IO_UPDATE", "Error updating the port settings"),
    IoSerialSpeed = (-41, "GP_ERROR_IO_SERIAL_SPEED", "Error setting the serial port speed"),
    IoUsbClearHalt = (-51, "GP_ERROR_IO_USB_CLEAR_HALT", "Error clearing a halt condition on the USB port"),
    IoUsbFind = (-52, "GP_ERROR_IO_USB_FIND", "Could not find the requested device on the USB port"),
    IoUsbClaim = (-53, "GP_ERROR_IO_USB_CLAIM", "Could not claim the USB device"),
    IoLock = (-60, "GP_ERROR_IO_LOCK", "Could not lock the device"),
    Hal = (-70, "GP_ERROR_HAL", "libhal error"),
    CorruptedData = (-102, "GP_ERROR_CORRUPTED_DATA", "Corrupted data"),
    FileExists = (-103, "GP_ERROR_FILE_EXISTS", "File exists"),
    ModelNotFound = (-105, "GP_ERROR_MODEL_NOT_FOUND", "Unknown model"),
    DirectoryNotFound = (-107, "GP_ERROR_DIRECTORY_NOT_FOUND", "Directory not found"),
    FileNotFound = (-108, "GP_ERROR_FILE_NOT_FOUND", "File not found"),
    DirectoryExists = (-109, "GP_ERROR_DIRECTORY_EXISTS", "Directory exists"),
    CameraBusy = (-110, "GP_ERROR_CAMERA_BUSY", "I/O in progress"),
    PathNotAbsolute = (-111, "GP_ERROR_PATH_NOT_ABSOLUTE", "Path not absolute"),
    Cancel = (-112, "GP_ERROR_CANCEL", "Cancelled"),
    CameraError = (-113, "GP_ERROR_CAMERA_ERROR", "Camera error"),
    OsFailure = (-114, "GP_ERROR_OS_FAILURE", "OS error"),
    NoSpace = (-115, "GP_ERROR_NO_SPACE", "Not enough space"),
}

impl fmt::Display for DeviceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Lookup from negative result code to its registered kind.
#[derive(Debug)]
pub struct ErrorTaxonomy {
    by_code: HashMap<i32, DeviceErrorKind>,
}

impl ErrorTaxonomy {
    /// Register a kind for every failure code in `table` whose symbol is known.
    ///
    /// Success codes (zero or positive) are skipped.
    pub fn from_table(table: &[(i32, &str, &str)]) -> Self {
        let mut by_code = HashMap::with_capacity(table.len());
        for &(code, symbol, _) in table {
            if code >= GP_OK {
                continue;
            }
            match DeviceErrorKind::from_symbol(symbol) {
                Some(kind) => {
                    by_code.insert(code, kind);
                }
                None => tracing::debug!(code, symbol, "Unrecognized result symbol, not registered"),
            }
        }
        Self { by_code }
    }

    /// The kind registered for `rc`, if any.
    pub fn lookup(&self, rc: i32) -> Option<DeviceErrorKind> {
        self.by_code.get(&rc).copied()
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Whether no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Build the typed error for a failure code.
    ///
    /// `description` is used for codes without a registered kind.
    pub fn error(&self, rc: i32, description: impl Into<String>) -> CameraError {
        match self.lookup(rc) {
            Some(kind) => CameraError::Device {
                kind,
                code: rc,
                description: kind.description().to_string(),
            },
            None => CameraError::Unmapped {
                code: rc,
                description: description.into(),
            },
        }
    }
}

static TAXONOMY: Lazy<ErrorTaxonomy> = Lazy::new(|| ErrorTaxonomy::from_table(RESULT_TABLE));

/// The process-wide taxonomy built from [`RESULT_TABLE`].
pub fn taxonomy() -> &'static ErrorTaxonomy {
    &TAXONOMY
}

/// Description of a result code from the driver table.
pub fn describe_result(rc: i32) -> &'static str {
    RESULT_TABLE
        .iter()
        .find(|(code, _, _)| *code == rc)
        .map(|(_, _, desc)| *desc)
        .unwrap_or("Unknown error")
}

/// Map a result code to its typed error.
pub fn error_from_code(rc: i32) -> CameraError {
    taxonomy().error(rc, describe_result(rc))
}

/// Pass success codes through, map failures to their typed error.
pub fn check(rc: i32) -> Result<i32> {
    if rc >= GP_OK {
        Ok(rc)
    } else {
        Err(error_from_code(rc))
    }
}
