//! Cached configuration tree with dirty tracking.
//!
//! The cache moves through three states:
//!
//! - **Empty**: nothing fetched yet (or just reset by [`Camera::reload`]).
//! - **Loaded, clean**: the tree was fetched lazily on first access, or the
//!   last [`Camera::save`] succeeded.
//! - **Loaded, dirty**: at least one value was assigned since then.
//!
//! The flat id → widget index stores child-position paths into the tree, so
//! it never owns or aliases a widget and is rebuilt together with the tree.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "mock")]
//! # fn main() -> camera_config::Result<()> {
//! use camera_config::{Camera, MockCamera};
//!
//! let mut camera = Camera::new(MockCamera::dslr());
//! camera.set("iso", 800)?;
//! assert!(camera.is_dirty());
//! assert!(camera.save()?);
//! assert!(!camera.save()?); // nothing left to push
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "mock"))]
//! # fn main() {}
//! ```

use std::collections::HashMap;
use std::ops::Deref;

use tracing::{debug, info, warn};

use crate::camera::Camera;
use crate::driver::ConfigDriver;
use crate::error::{CameraError, Result};
use crate::result::{taxonomy, ResultCode};
use crate::widget::{Widget, WidgetKind, WidgetPath, WidgetValue};

/// Map a failed driver call to its typed error.
pub(crate) fn device_error<D: ConfigDriver + ?Sized>(driver: &D, rc: ResultCode) -> CameraError {
    let err = taxonomy().error(rc.0, driver.describe(rc.0));
    warn!(code = rc.0, error = %err, "Device call failed");
    err
}

/// A fetched tree and its flat index.
#[derive(Debug)]
pub(crate) struct LoadedTree {
    window: Widget,
    index: HashMap<String, WidgetPath>,
}

impl LoadedTree {
    fn fetch<D: ConfigDriver>(driver: &mut D) -> Result<Self> {
        let native = driver.fetch_tree().map_err(|rc| device_error(&*driver, rc))?;
        let window = Widget::wrap(native)?;
        if window.kind() != WidgetKind::Window {
            warn!(id = %window.id(), kind = %window.kind(), "Configuration root is not a window");
        }
        let index = window.build_index();
        info!(root = %window.id(), widgets = index.len(), "Fetched configuration tree");
        Ok(Self { window, index })
    }

    fn get(&self, key: &str) -> Option<&Widget> {
        self.index.get(key).and_then(|path| self.window.at_path(path))
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Widget> {
        let path = self.index.get(key)?;
        self.window.at_path_mut(path)
    }
}

/// Cached tree plus the dirty flag.
#[derive(Debug, Default)]
pub(crate) struct ConfigCache {
    tree: Option<LoadedTree>,
    dirty: bool,
}

impl ConfigCache {
    /// The loaded tree, fetching it on first access.
    ///
    /// A failed fetch leaves the cache empty.
    fn tree_mut<D: ConfigDriver>(&mut self, driver: &mut D) -> Result<&mut LoadedTree> {
        match self.tree {
            Some(ref mut tree) => Ok(tree),
            None => {
                let fresh = LoadedTree::fetch(driver)?;
                Ok(self.tree.insert(fresh))
            }
        }
    }

    fn entry(&mut self, key: &str) -> Option<WidgetMut<'_>> {
        let Self { tree, dirty } = self;
        let widget = tree.as_mut()?.get_mut(key)?;
        Some(WidgetMut { widget, dirty })
    }

    fn reset(&mut self) {
        self.tree = None;
        self.dirty = false;
    }
}

/// Borrowed, read-only view of the flat configuration index.
///
/// Iteration is in sorted key order.
#[derive(Debug, Clone, Copy)]
pub struct ConfigView<'a> {
    tree: &'a LoadedTree,
}

impl<'a> ConfigView<'a> {
    /// Widget for `key`, or `None` if unknown.
    pub fn get(&self, key: &str) -> Option<&'a Widget> {
        self.tree.get(key)
    }

    /// Check if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.tree.index.contains_key(key)
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<&'a str> {
        let mut keys: Vec<&'a str> = self.tree.index.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// All `(key, widget)` pairs, sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Widget)> + 'a {
        let tree = self.tree;
        self.keys()
            .into_iter()
            .filter_map(move |key| tree.get(key).map(|w| (key, w)))
    }

    /// Number of indexed widgets.
    pub fn len(&self) -> usize {
        self.tree.index.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.index.is_empty()
    }
}

/// Mutable handle to one cached widget.
///
/// Writes through this handle flag the configuration dirty, exactly as
/// [`Camera::set`] does.
#[derive(Debug)]
pub struct WidgetMut<'a> {
    widget: &'a mut Widget,
    dirty: &'a mut bool,
}

impl WidgetMut<'_> {
    /// Validate and store a new value, then flag the configuration dirty.
    ///
    /// On failure neither the widget nor the dirty flag changes.
    pub fn set_value(&mut self, value: impl Into<WidgetValue>) -> Result<()> {
        self.widget.set_value(value.into())?;
        *self.dirty = true;
        Ok(())
    }

    /// Flag the widget changed so the next save re-applies it even if its
    /// value is unchanged.
    pub fn mark_changed(&mut self) {
        self.widget.set_changed(true);
        *self.dirty = true;
    }
}

impl Deref for WidgetMut<'_> {
    type Target = Widget;

    fn deref(&self) -> &Widget {
        self.widget
    }
}

/// Result of [`Camera::update`].
#[derive(Debug, Default)]
pub struct UpdateOutcome {
    /// Whether the final save pushed anything.
    pub saved: bool,
    /// Keys whose assignment failed validation, in input order.
    pub failures: Vec<(String, CameraError)>,
}

impl UpdateOutcome {
    /// Check if every pair was applied.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<D: ConfigDriver> Camera<D> {
    /// The configuration tree, fetched from the device on first call.
    pub fn window(&mut self) -> Result<&Widget> {
        Ok(&self.cache.tree_mut(&mut self.driver)?.window)
    }

    /// The flat id → widget index over the whole tree.
    pub fn config(&mut self) -> Result<ConfigView<'_>> {
        let tree = self.cache.tree_mut(&mut self.driver)?;
        Ok(ConfigView { tree })
    }

    /// Widget for `key`, or `None` if the configuration has no such key.
    ///
    /// Only a failed lazy fetch produces an error.
    pub fn get(&mut self, key: &str) -> Result<Option<&Widget>> {
        Ok(self.cache.tree_mut(&mut self.driver)?.get(key))
    }

    /// Mutable handle for `key`, or `None` if unknown.
    pub fn get_mut(&mut self, key: &str) -> Result<Option<WidgetMut<'_>>> {
        self.cache.tree_mut(&mut self.driver)?;
        Ok(self.cache.entry(key))
    }

    /// Assign a value to `key`, marking the configuration dirty.
    ///
    /// Nothing reaches the device until [`Camera::save`].
    ///
    /// # Errors
    ///
    /// [`CameraError::UnknownKey`] if `key` is absent, otherwise the widget's
    /// validation errors. The dirty flag is untouched on failure.
    pub fn set(&mut self, key: &str, value: impl Into<WidgetValue>) -> Result<()> {
        self.cache.tree_mut(&mut self.driver)?;
        let mut entry = self.cache.entry(key).ok_or_else(|| CameraError::UnknownKey {
            key: key.to_string(),
        })?;
        entry.set_value(value)
    }

    /// Whether values were assigned since the last reset or successful save.
    pub fn is_dirty(&self) -> bool {
        self.cache.dirty
    }

    /// Whether a tree is currently cached.
    pub fn is_loaded(&self) -> bool {
        self.cache.tree.is_some()
    }

    /// Push the whole tree to the device.
    ///
    /// Returns `false` without a device call when nothing is dirty. On
    /// failure the configuration stays dirty so a retry is meaningful.
    pub fn save(&mut self) -> Result<bool> {
        if !self.cache.dirty {
            debug!("Configuration clean, nothing to save");
            return Ok(false);
        }
        let tree = self.cache.tree_mut(&mut self.driver)?;
        self.driver
            .push_tree(&tree.window)
            .map_err(|rc| device_error(&self.driver, rc))?;
        tree.window.clear_changed();
        self.cache.dirty = false;
        info!("Configuration saved");
        Ok(true)
    }

    /// Push one widget to the device if it has pending changes.
    ///
    /// Returns `false` without a device call when the widget is unchanged.
    /// The configuration stays dirty while any other widget is still changed.
    pub fn save_single(&mut self, key: &str) -> Result<bool> {
        let tree = self.cache.tree_mut(&mut self.driver)?;
        let widget = tree.get(key).ok_or_else(|| CameraError::UnknownKey {
            key: key.to_string(),
        })?;
        if !widget.is_changed() {
            debug!(key, "Widget unchanged, nothing to save");
            return Ok(false);
        }
        self.driver
            .push_single(key, widget)
            .map_err(|rc| device_error(&self.driver, rc))?;
        if let Some(widget) = tree.get_mut(key) {
            widget.set_changed(false);
        }
        if !tree.window.any_changed() {
            self.cache.dirty = false;
        }
        info!(key, "Widget saved");
        Ok(true)
    }

    /// Assign every pair, then save once.
    ///
    /// Pairs are applied independently: a validation failure on one key is
    /// recorded in [`UpdateOutcome::failures`] and later keys are still
    /// attempted. With `force`, every successfully assigned widget is flagged
    /// changed so the device re-applies it even if the value is the same.
    ///
    /// # Errors
    ///
    /// Device errors (from the lazy fetch or the save) abort the update.
    pub fn update<I, K, V>(&mut self, pairs: I, force: bool) -> Result<UpdateOutcome>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<WidgetValue>,
    {
        let mut failures = Vec::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            match self.set(key, value) {
                Ok(()) => {
                    if force {
                        if let Some(mut entry) = self.cache.entry(key) {
                            entry.mark_changed();
                        }
                    }
                }
                Err(err) if err.is_validation() => {
                    warn!(key, error = %err, "Skipping invalid setting");
                    failures.push((key.to_string(), err));
                }
                Err(err) => return Err(err),
            }
        }
        let saved = self.save()?;
        Ok(UpdateOutcome { saved, failures })
    }

    /// Drop the cached tree and fetch it again. All unsaved edits are lost.
    pub fn reload(&mut self) -> Result<()> {
        if let Some(old) = self.cache.tree.take() {
            debug!(widgets = old.index.len(), "Discarding configuration tree");
        }
        self.cache.reset();
        self.cache.tree_mut(&mut self.driver)?;
        info!("Configuration reloaded");
        Ok(())
    }

    /// Re-read one widget from the device without reloading the tree.
    ///
    /// If the widget is cached, its value, choice list and read-only flag are
    /// replaced by the device's, and it is not flagged changed. A toggle seen
    /// in its auto state stays tri-state from then on. The cached
    /// widget takes ownership of the freshly fetched choice buffer; the stale
    /// buffer leaves with the temporary widget. Keys that are not cached get
    /// their value returned but are not added to the tree.
    pub fn refresh_value(&mut self, key: &str) -> Result<WidgetValue> {
        let native = self
            .driver
            .fetch_single(key)
            .map_err(|rc| device_error(&self.driver, rc))?;
        let mut fresh = Widget::wrap(native)?;
        let value = fresh.value()?;
        let readonly = fresh.is_readonly();
        let tristate = fresh.is_tristate();

        match self.cache.tree.as_mut().and_then(|tree| tree.get_mut(key)) {
            Some(cached) => {
                cached.assign_raw(fresh.take_raw());
                cached.swap_choices(&mut fresh);
                cached.set_readonly(readonly);
                if tristate {
                    cached.set_tristate(true);
                }
                cached.set_changed(false);
                debug!(key, value = %value, choices = cached.choices().len(), "Refreshed cached widget");
            }
            None => {
                warn!(key, "Refreshed key is not cached, value not merged");
            }
        }

        drop(fresh);
        Ok(value)
    }
}
