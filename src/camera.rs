//! Camera handles.
//!
//! [`Camera`] pairs one opened [`ConfigDriver`] with its configuration cache.
//! Every method that can reach the device takes `&mut self`, so calls on one
//! handle are serialized by construction. [`SharedCamera`] is the
//! cross-thread form: the handle sits behind a mutex and every access goes
//! through [`SharedCamera::with_camera`].

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::configuration::{ConfigCache, UpdateOutcome};
use crate::driver::ConfigDriver;
use crate::error::Result;
use crate::settings::Preset;

/// A camera's configuration, backed by a device driver.
pub struct Camera<D: ConfigDriver> {
    pub(crate) driver: D,
    pub(crate) cache: ConfigCache,
}

impl<D: ConfigDriver> Camera<D> {
    /// Wrap an opened driver. Nothing is fetched until first access.
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            cache: ConfigCache::default(),
        }
    }

    /// The underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The underlying driver, mutably.
    ///
    /// Changes made directly on the device are not seen by the cache until
    /// [`Camera::reload`] or [`Camera::refresh_value`].
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Give up the cache and return the driver.
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Move this camera behind a lock for sharing across threads.
    pub fn into_shared(self) -> SharedCamera<D> {
        SharedCamera::new(self)
    }

    /// Apply a named settings preset, then save once.
    ///
    /// Same policy as [`Camera::update`]: invalid entries are reported in the
    /// outcome and do not stop the rest of the preset.
    pub fn apply_preset(&mut self, preset: &Preset, force: bool) -> Result<UpdateOutcome> {
        debug!(preset = %preset.name(), entries = preset.len(), force, "Applying preset");
        let mut outcome = UpdateOutcome::default();
        let mut pairs = Vec::with_capacity(preset.len());
        for (key, value) in preset.entries() {
            match value {
                Ok(value) => pairs.push((key, value)),
                Err(err) => outcome.failures.push((key.to_string(), err)),
            }
        }
        let applied = self.update(pairs, force)?;
        outcome.saved = applied.saved;
        outcome.failures.extend(applied.failures);
        Ok(outcome)
    }
}

impl<D: ConfigDriver> fmt::Debug for Camera<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Camera")
            .field("loaded", &self.is_loaded())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

/// A [`Camera`] shared across threads.
///
/// The driver handle is not reentrant, so every access holds the lock for
/// its whole duration.
pub struct SharedCamera<D: ConfigDriver> {
    inner: Arc<Mutex<Camera<D>>>,
}

impl<D: ConfigDriver> SharedCamera<D> {
    /// Put a camera behind a lock.
    pub fn new(camera: Camera<D>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(camera)),
        }
    }

    /// Execute a closure with exclusive access to the camera.
    ///
    /// # Example
    ///
    /// ```
    /// # #[cfg(feature = "mock")]
    /// # fn main() -> camera_config::Result<()> {
    /// use camera_config::{Camera, MockCamera};
    ///
    /// let shared = Camera::new(MockCamera::dslr()).into_shared();
    /// let other = shared.clone();
    /// std::thread::spawn(move || other.with_camera(|cam| cam.set("iso", 400)))
    ///     .join()
    ///     .unwrap()?;
    /// assert!(shared.with_camera(|cam| cam.is_dirty()));
    /// # Ok(())
    /// # }
    /// # #[cfg(not(feature = "mock"))]
    /// # fn main() {}
    /// ```
    pub fn with_camera<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Camera<D>) -> R,
    {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}

impl<D: ConfigDriver> Clone for SharedCamera<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: ConfigDriver> fmt::Debug for SharedCamera<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCamera")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}
