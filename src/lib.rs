//! # Camera configuration
//!
//! Typed, cached access to a digital camera's configuration tree.
//!
//! A camera describes its settings as a tree of widgets: a root window,
//! sections, and typed leaves (text, range, toggle, radio, menu, button,
//! date). This crate wraps that tree behind a [`Camera`] handle that
//!
//! - fetches the tree lazily on first access and indexes it by widget id;
//! - validates and coerces assignments per widget kind, tracking whether
//!   anything is dirty;
//! - pushes edits back with [`Camera::save`], [`Camera::save_single`] or the
//!   batch [`Camera::update`], and discards them with [`Camera::reload`];
//! - re-reads a single widget with [`Camera::refresh_value`], adopting the
//!   device's freshly fetched choice list;
//! - maps every negative driver result code to a typed [`CameraError`].
//!
//! ## Crate Structure
//!
//! - **`camera`**: the [`Camera`] handle and its thread-shared form
//!   [`SharedCamera`].
//! - **`configuration`**: the lazy cache, the flat index view and the save,
//!   update, reload and refresh operations.
//! - **`driver`**: the [`ConfigDriver`] trait implemented by device backends.
//! - **`error`**: [`CameraError`], the crate-wide error type.
//! - **`native`**: [`NativeWidget`], the owned record drivers exchange.
//! - **`result`**: driver result codes and the [`ErrorTaxonomy`].
//! - **`settings`**: TOML settings with environment overrides and presets.
//! - **`widget`**: the [`Widget`] factory, kinds and values.
//! - **`mock`** (feature `mock`, default): [`MockCamera`], a simulated DSLR.
//! - **`gphoto2`** (feature `libgphoto2`): the libgphoto2 backend.

pub mod camera;
pub mod configuration;
pub mod driver;
pub mod error;
#[cfg(feature = "libgphoto2")]
pub mod gphoto2;
#[cfg(feature = "mock")]
pub mod mock;
pub mod native;
pub mod result;
pub mod settings;
pub mod widget;

pub use camera::{Camera, SharedCamera};
pub use configuration::{ConfigView, UpdateOutcome, WidgetMut};
pub use driver::ConfigDriver;
pub use error::{CameraError, Result};
#[cfg(feature = "libgphoto2")]
pub use gphoto2::Gphoto2Driver;
#[cfg(feature = "mock")]
pub use mock::{MockCamera, MockOp};
pub use native::{NativeWidget, RangeSpec, RawValue};
pub use result::{check, error_from_code, DeviceErrorKind, ErrorTaxonomy, ResultCode};
pub use settings::{Preset, Settings};
pub use widget::{Widget, WidgetKind, WidgetValue};
