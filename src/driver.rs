//! The device-driver boundary.
//!
//! A [`ConfigDriver`] performs the actual hardware I/O for one opened camera.
//! It hands configuration to the core as owned [`NativeWidget`] records and
//! reads edits back from the core's [`Widget`] tree. Every call reports
//! failure as the driver's raw negative [`ResultCode`]; the core maps codes
//! through the [`ErrorTaxonomy`](crate::result::ErrorTaxonomy).
//!
//! Driver handles are not reentrant. The core only ever calls a driver from
//! behind `&mut self`, and [`SharedCamera`](crate::SharedCamera) adds a lock
//! when a camera is shared across threads.

use crate::native::NativeWidget;
use crate::result::{describe_result, ResultCode};
use crate::widget::Widget;

/// Configuration access to one camera.
pub trait ConfigDriver: Send {
    /// Fetch the full configuration tree, rooted at a window record.
    fn fetch_tree(&mut self) -> Result<NativeWidget, ResultCode>;

    /// Push the whole tree back to the device.
    ///
    /// Drivers apply only widgets whose `changed` flag is set.
    fn push_tree(&mut self, root: &Widget) -> Result<(), ResultCode>;

    /// Fetch a standalone record for one key, bypassing any cached tree.
    fn fetch_single(&mut self, key: &str) -> Result<NativeWidget, ResultCode>;

    /// Push a single widget back to the device.
    fn push_single(&mut self, key: &str, widget: &Widget) -> Result<(), ResultCode>;

    /// Human-readable description for a result code.
    fn describe(&self, code: i32) -> String {
        describe_result(code).to_string()
    }
}

impl<D: ConfigDriver + ?Sized> ConfigDriver for Box<D> {
    fn fetch_tree(&mut self) -> Result<NativeWidget, ResultCode> {
        (**self).fetch_tree()
    }

    fn push_tree(&mut self, root: &Widget) -> Result<(), ResultCode> {
        (**self).push_tree(root)
    }

    fn fetch_single(&mut self, key: &str) -> Result<NativeWidget, ResultCode> {
        (**self).fetch_single(key)
    }

    fn push_single(&mut self, key: &str, widget: &Widget) -> Result<(), ResultCode> {
        (**self).push_single(key, widget)
    }

    fn describe(&self, code: i32) -> String {
        (**self).describe(code)
    }
}
