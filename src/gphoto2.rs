//! libgphoto2 backend.
//!
//! [`Gphoto2Driver`] owns one initialized libgphoto2 camera and its context
//! and implements [`ConfigDriver`] on top of `gp_camera_get_config`,
//! `gp_camera_set_config` and their single-widget variants. Native widget
//! trees are copied into owned [`NativeWidget`] records and freed right
//! away; pushes re-fetch a native tree, write the changed values into it by
//! name, flag each of them changed and hand the tree back to the camera.

#![allow(unsafe_code)]

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr::{self, NonNull};

use tracing::{debug, info, warn};

use gphoto2_sys::{CameraWidget, GPContext};

use crate::driver::ConfigDriver;
use crate::error::Result;
use crate::native::{NativeWidget, RangeSpec, RawValue};
use crate::result::{error_from_code, ResultCode, GP_OK};
use crate::settings::CameraSettings;
use crate::widget::{Widget, WidgetKind};

const GP_ERROR_BAD_PARAMETERS: c_int = -2;
const GP_ERROR_MODEL_NOT_FOUND: c_int = -105;
const GP_ERROR_UNKNOWN_PORT: c_int = -5;

fn gp(rc: c_int) -> std::result::Result<c_int, ResultCode> {
    if rc < GP_OK {
        Err(ResultCode(rc))
    } else {
        Ok(rc)
    }
}

/// Copy a driver-owned C string; null becomes empty.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn owned_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

fn c_string(s: &str) -> std::result::Result<CString, ResultCode> {
    CString::new(s).map_err(|_| ResultCode(GP_ERROR_BAD_PARAMETERS))
}

/// A native widget tree allocated by libgphoto2, freed on drop.
struct NativeTree {
    root: NonNull<CameraWidget>,
}

impl NativeTree {
    fn new(root: *mut CameraWidget) -> std::result::Result<Self, ResultCode> {
        NonNull::new(root)
            .map(|root| Self { root })
            .ok_or(ResultCode(GP_ERROR_BAD_PARAMETERS))
    }

    fn as_ptr(&self) -> *mut CameraWidget {
        self.root.as_ptr()
    }

    /// Descendant by name, or the root itself if it carries that name.
    fn child_by_name(&self, name: &str) -> std::result::Result<*mut CameraWidget, ResultCode> {
        let c_name = c_string(name)?;
        // SAFETY: root is a valid tree we own; the name pointer outlives the call.
        unsafe {
            let mut own: *const c_char = ptr::null();
            gp(gphoto2_sys::gp_widget_get_name(self.as_ptr(), &mut own))?;
            if owned_str(own) == name {
                return Ok(self.as_ptr());
            }
            let mut child: *mut CameraWidget = ptr::null_mut();
            gp(gphoto2_sys::gp_widget_get_child_by_name(
                self.as_ptr(),
                c_name.as_ptr(),
                &mut child,
            ))?;
            if child.is_null() {
                return Err(ResultCode(GP_ERROR_BAD_PARAMETERS));
            }
            Ok(child)
        }
    }
}

impl Drop for NativeTree {
    fn drop(&mut self) {
        // SAFETY: root came from gp_camera_get_(single_)config and is freed once.
        let rc = unsafe { gphoto2_sys::gp_widget_free(self.as_ptr()) };
        if rc < GP_OK {
            warn!(code = rc, "Failed to free native widget tree");
        }
    }
}

/// Copy one native widget (and its subtree) into an owned record.
///
/// # Safety
///
/// `w` must point to a live widget.
unsafe fn read_widget(w: *mut CameraWidget) -> std::result::Result<NativeWidget, ResultCode> {
    let mut ty: gphoto2_sys::CameraWidgetType = 0;
    gp(gphoto2_sys::gp_widget_get_type(w, &mut ty))?;

    let mut name: *const c_char = ptr::null();
    let mut label: *const c_char = ptr::null();
    let mut info: *const c_char = ptr::null();
    let mut readonly: c_int = 0;
    gp(gphoto2_sys::gp_widget_get_name(w, &mut name))?;
    gp(gphoto2_sys::gp_widget_get_label(w, &mut label))?;
    gp(gphoto2_sys::gp_widget_get_info(w, &mut info))?;
    gp(gphoto2_sys::gp_widget_get_readonly(w, &mut readonly))?;

    let mut record = NativeWidget::new(ty as i32, owned_str(name), owned_str(label))
        .with_info(owned_str(info));
    record.readonly = readonly != 0;

    match WidgetKind::from_raw(record.type_tag) {
        Some(WidgetKind::Window | WidgetKind::Section) => {
            let count = gp(gphoto2_sys::gp_widget_count_children(w))?;
            for i in 0..count {
                let mut child: *mut CameraWidget = ptr::null_mut();
                gp(gphoto2_sys::gp_widget_get_child(w, i, &mut child))?;
                if !child.is_null() {
                    record.children.push(read_widget(child)?);
                }
            }
        }
        Some(WidgetKind::Text) => {
            let mut text: *const c_char = ptr::null();
            gp(gphoto2_sys::gp_widget_get_value(w, &mut text as *mut _ as *mut c_void))?;
            record.value = RawValue::Text(owned_str(text));
        }
        Some(WidgetKind::Radio | WidgetKind::Menu) => {
            let mut text: *const c_char = ptr::null();
            gp(gphoto2_sys::gp_widget_get_value(w, &mut text as *mut _ as *mut c_void))?;
            record.value = RawValue::Text(owned_str(text));
            let count = gp(gphoto2_sys::gp_widget_count_choices(w))?;
            record.choices.reserve(count as usize);
            for i in 0..count {
                let mut choice: *const c_char = ptr::null();
                gp(gphoto2_sys::gp_widget_get_choice(w, i, &mut choice))?;
                record.choices.push(owned_str(choice));
            }
        }
        Some(WidgetKind::Range) => {
            let mut value: f32 = 0.0;
            gp(gphoto2_sys::gp_widget_get_value(w, &mut value as *mut f32 as *mut c_void))?;
            let (mut min, mut max, mut step) = (0.0f32, 0.0f32, 0.0f32);
            gp(gphoto2_sys::gp_widget_get_range(w, &mut min, &mut max, &mut step))?;
            record.value = RawValue::Float(value);
            record.range = Some(RangeSpec::new(min, max, step));
        }
        Some(WidgetKind::Toggle | WidgetKind::Date) => {
            let mut value: c_int = 0;
            gp(gphoto2_sys::gp_widget_get_value(w, &mut value as *mut c_int as *mut c_void))?;
            record.value = RawValue::Int(value);
        }
        Some(WidgetKind::Button) | None => {}
    }
    Ok(record)
}

/// Write an owned value into a native widget and flag it changed.
///
/// `gp_widget_set_value` only raises the flag when the value differs, so the
/// flag is set explicitly: a widget the core marked changed is re-applied by
/// the camera even when the value is the one it already holds.
///
/// # Safety
///
/// `w` must point to a live widget of a kind matching `value`.
unsafe fn stage_value(w: *mut CameraWidget, value: &RawValue) -> std::result::Result<(), ResultCode> {
    match value {
        RawValue::None => {}
        RawValue::Text(s) => {
            let c = c_string(s)?;
            gp(gphoto2_sys::gp_widget_set_value(w, c.as_ptr() as *const c_void))?;
        }
        RawValue::Float(f) => {
            gp(gphoto2_sys::gp_widget_set_value(w, f as *const f32 as *const c_void))?;
        }
        RawValue::Int(i) => {
            gp(gphoto2_sys::gp_widget_set_value(w, i as *const i32 as *const c_void))?;
        }
    }
    gp(gphoto2_sys::gp_widget_set_changed(w, 1)).map(drop)
}

/// One opened libgphoto2 camera.
///
/// The camera is released with `gp_camera_exit` when the driver is dropped.
pub struct Gphoto2Driver {
    camera: NonNull<gphoto2_sys::Camera>,
    context: NonNull<GPContext>,
}

// SAFETY: the camera and context are only reached through `&mut self`, so
// libgphoto2 never sees concurrent calls on them. Moving them between
// threads is fine as long as calls stay serialized.
unsafe impl Send for Gphoto2Driver {}

impl Gphoto2Driver {
    /// Open the camera described by `settings`, autodetecting what is unset.
    ///
    /// # Errors
    ///
    /// The mapped libgphoto2 error if the context cannot be created, the
    /// model or port is unknown, or camera initialization fails.
    pub fn open(settings: &CameraSettings) -> Result<Self> {
        // SAFETY: every pointer below is checked before use and released on
        // the error paths by Drop once the driver value exists.
        unsafe {
            let context = NonNull::new(gphoto2_sys::gp_context_new())
                .ok_or_else(|| error_from_code(GP_ERROR_BAD_PARAMETERS))?;

            let mut camera: *mut gphoto2_sys::Camera = ptr::null_mut();
            if let Err(rc) = gp(gphoto2_sys::gp_camera_new(&mut camera)) {
                gphoto2_sys::gp_context_unref(context.as_ptr());
                return Err(error_from_code(rc.0));
            }
            let Some(camera) = NonNull::new(camera) else {
                gphoto2_sys::gp_context_unref(context.as_ptr());
                return Err(error_from_code(GP_ERROR_BAD_PARAMETERS));
            };
            let driver = Self { camera, context };

            if let Some(model) = settings.model.as_deref() {
                driver.select_model(model).map_err(|rc| error_from_code(rc.0))?;
            }
            if let Some(port) = settings.port.as_deref() {
                driver.select_port(port).map_err(|rc| error_from_code(rc.0))?;
            }

            gp(gphoto2_sys::gp_camera_init(driver.camera.as_ptr(), driver.context.as_ptr()))
                .map_err(|rc| error_from_code(rc.0))?;
            info!(
                model = settings.model.as_deref().unwrap_or("autodetect"),
                port = settings.port.as_deref().unwrap_or("autodetect"),
                "Opened libgphoto2 camera"
            );
            Ok(driver)
        }
    }

    unsafe fn select_model(&self, model: &str) -> std::result::Result<(), ResultCode> {
        let c_model = c_string(model)?;
        let mut list: *mut gphoto2_sys::CameraAbilitiesList = ptr::null_mut();
        gp(gphoto2_sys::gp_abilities_list_new(&mut list))?;
        let result = (|| {
            gp(gphoto2_sys::gp_abilities_list_load(list, self.context.as_ptr()))?;
            let index = gphoto2_sys::gp_abilities_list_lookup_model(list, c_model.as_ptr());
            if index < GP_OK {
                return Err(ResultCode(GP_ERROR_MODEL_NOT_FOUND));
            }
            let mut abilities = gphoto2_sys::CameraAbilities::default();
            gp(gphoto2_sys::gp_abilities_list_get_abilities(list, index, &mut abilities))?;
            gp(gphoto2_sys::gp_camera_set_abilities(self.camera.as_ptr(), abilities))
        })();
        gphoto2_sys::gp_abilities_list_free(list);
        result.map(drop)
    }

    unsafe fn select_port(&self, port: &str) -> std::result::Result<(), ResultCode> {
        let c_port = c_string(port)?;
        let mut list: *mut gphoto2_sys::GPPortInfoList = ptr::null_mut();
        gp(gphoto2_sys::gp_port_info_list_new(&mut list))?;
        let result = (|| {
            gp(gphoto2_sys::gp_port_info_list_load(list))?;
            let index = gphoto2_sys::gp_port_info_list_lookup_path(list, c_port.as_ptr());
            if index < GP_OK {
                return Err(ResultCode(GP_ERROR_UNKNOWN_PORT));
            }
            let mut info: gphoto2_sys::GPPortInfo = ptr::null_mut();
            gp(gphoto2_sys::gp_port_info_list_get_info(list, index, &mut info))?;
            gp(gphoto2_sys::gp_camera_set_port_info(self.camera.as_ptr(), info))
        })();
        gphoto2_sys::gp_port_info_list_free(list);
        result.map(drop)
    }

    fn get_config(&mut self) -> std::result::Result<NativeTree, ResultCode> {
        let mut root: *mut CameraWidget = ptr::null_mut();
        // SAFETY: camera and context are valid for the driver's lifetime.
        gp(unsafe {
            gphoto2_sys::gp_camera_get_config(self.camera.as_ptr(), &mut root, self.context.as_ptr())
        })?;
        NativeTree::new(root)
    }

    fn get_single_config(&mut self, key: &CStr) -> std::result::Result<NativeTree, ResultCode> {
        let mut root: *mut CameraWidget = ptr::null_mut();
        // SAFETY: camera and context are valid; key is NUL-terminated.
        gp(unsafe {
            gphoto2_sys::gp_camera_get_single_config(
                self.camera.as_ptr(),
                key.as_ptr(),
                &mut root,
                self.context.as_ptr(),
            )
        })?;
        NativeTree::new(root)
    }
}

impl ConfigDriver for Gphoto2Driver {
    fn fetch_tree(&mut self) -> std::result::Result<NativeWidget, ResultCode> {
        let tree = self.get_config()?;
        // SAFETY: the tree stays alive until `tree` drops at the end of scope.
        unsafe { read_widget(tree.as_ptr()) }
    }

    fn push_tree(&mut self, root: &Widget) -> std::result::Result<(), ResultCode> {
        let tree = self.get_config()?;
        let mut written = 0usize;
        for widget in root.descendants().into_iter().filter(|w| w.is_changed()) {
            let target = tree.child_by_name(widget.id())?;
            // SAFETY: target belongs to `tree`, which is alive.
            unsafe { stage_value(target, &widget.native().value)? };
            written += 1;
        }
        debug!(written, "Pushing configuration tree");
        // SAFETY: camera, tree and context are all valid here.
        gp(unsafe {
            gphoto2_sys::gp_camera_set_config(self.camera.as_ptr(), tree.as_ptr(), self.context.as_ptr())
        })
        .map(drop)
    }

    fn fetch_single(&mut self, key: &str) -> std::result::Result<NativeWidget, ResultCode> {
        let c_key = c_string(key)?;
        let tree = self.get_single_config(&c_key)?;
        // SAFETY: the tree stays alive until `tree` drops at the end of scope.
        unsafe { read_widget(tree.as_ptr()) }
    }

    fn push_single(&mut self, key: &str, widget: &Widget) -> std::result::Result<(), ResultCode> {
        let c_key = c_string(key)?;
        let tree = self.get_single_config(&c_key)?;
        // SAFETY: tree is alive; camera and context are valid.
        unsafe {
            stage_value(tree.as_ptr(), &widget.native().value)?;
            gp(gphoto2_sys::gp_camera_set_single_config(
                self.camera.as_ptr(),
                c_key.as_ptr(),
                tree.as_ptr(),
                self.context.as_ptr(),
            ))
            .map(drop)
        }
    }

    fn describe(&self, code: i32) -> String {
        // SAFETY: gp_result_as_string returns a static string for any code.
        unsafe { owned_str(gphoto2_sys::gp_result_as_string(code)) }
    }
}

impl Drop for Gphoto2Driver {
    fn drop(&mut self) {
        debug!("Closing libgphoto2 camera");
        // SAFETY: camera and context are valid and owned; each is released once.
        unsafe {
            let rc = gphoto2_sys::gp_camera_exit(self.camera.as_ptr(), self.context.as_ptr());
            if rc < GP_OK {
                warn!(code = rc, "Error closing camera");
            }
            gphoto2_sys::gp_camera_free(self.camera.as_ptr());
            gphoto2_sys::gp_context_unref(self.context.as_ptr());
        }
    }
}

impl std::fmt::Debug for Gphoto2Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gphoto2Driver")
            .field("camera", &self.camera)
            .finish()
    }
}
