//! In-process simulated camera.
//!
//! [`MockCamera`] implements [`ConfigDriver`] over an in-memory tree shaped
//! like a DSLR's configuration. It behaves the way libgphoto2 camera drivers
//! do where it matters to the cache:
//!
//! - pushes apply only widgets flagged changed, all-or-nothing;
//! - `whitebalance` choices depend on `expprogram` (only `Automatic` in the
//!   `Auto` program), so a push can change another widget's choice list;
//! - every fetch hands out freshly allocated records.
//!
//! Tests can inject failures with [`MockCamera::fail_next`] and inspect the
//! write log, push counts, and the address of the last choice buffer handed
//! out for each key.

use std::collections::HashMap;

use tracing::debug;

use crate::driver::ConfigDriver;
use crate::native::{tag, NativeWidget, RawValue};
use crate::result::ResultCode;
use crate::widget::Widget;

const GP_ERROR_BAD_PARAMETERS: i32 = -2;
const GP_ERROR_NOT_SUPPORTED: i32 = -6;

const WHITE_BALANCE_ALL: &[&str] = &[
    "Automatic",
    "Daylight",
    "Fluorescent",
    "Tungsten",
    "Flash",
    "Cloudy",
    "Shade",
    "Preset",
];
const WHITE_BALANCE_AUTO: &[&str] = &["Automatic"];

/// Device operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    /// [`ConfigDriver::fetch_tree`]
    FetchTree,
    /// [`ConfigDriver::push_tree`]
    PushTree,
    /// [`ConfigDriver::fetch_single`]
    FetchSingle,
    /// [`ConfigDriver::push_single`]
    PushSingle,
}

/// Simulated camera driver.
#[derive(Debug)]
pub struct MockCamera {
    device: NativeWidget,
    failures: HashMap<MockOp, i32>,
    calls: HashMap<MockOp, usize>,
    writes: Vec<String>,
    issued_choices: HashMap<String, usize>,
}

impl MockCamera {
    /// Simulate a camera with the given configuration tree.
    pub fn new(device: NativeWidget) -> Self {
        let mut mock = Self {
            device,
            failures: HashMap::new(),
            calls: HashMap::new(),
            writes: Vec::new(),
            issued_choices: HashMap::new(),
        };
        mock.apply_dependencies();
        mock
    }

    /// A DSLR-like configuration tree.
    pub fn dslr() -> Self {
        Self::new(dslr_tree())
    }

    /// Make the next call of `op` fail with `code`.
    pub fn fail_next(&mut self, op: MockOp, code: i32) {
        self.failures.insert(op, code);
    }

    /// Number of calls made for `op`, failed ones included.
    pub fn calls(&self, op: MockOp) -> usize {
        self.calls.get(&op).copied().unwrap_or(0)
    }

    /// Ids written to the device, in order.
    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    /// Forget the write log.
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    /// Device-side value for `key`.
    pub fn device_value(&self, key: &str) -> Option<&RawValue> {
        self.device.find(key).map(|w| &w.value)
    }

    /// Device-side choices for `key`.
    pub fn device_choices(&self, key: &str) -> Option<&[String]> {
        self.device.find(key).map(|w| w.choices.as_slice())
    }

    /// Change a value on the device behind the cache's back.
    pub fn set_device_value(&mut self, key: &str, value: RawValue) -> bool {
        let found = match self.device.find_mut(key) {
            Some(w) => {
                w.value = value;
                true
            }
            None => false,
        };
        self.apply_dependencies();
        found
    }

    /// Replace a choice list on the device.
    pub fn set_device_choices<I, S>(&mut self, key: &str, choices: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.device.find_mut(key) {
            Some(w) => {
                w.choices = choices.into_iter().map(Into::into).collect();
                true
            }
            None => false,
        }
    }

    /// Change the read-only flag on the device.
    pub fn set_device_readonly(&mut self, key: &str, readonly: bool) -> bool {
        match self.device.find_mut(key) {
            Some(w) => {
                w.readonly = readonly;
                true
            }
            None => false,
        }
    }

    /// Address of the choice buffer last handed out by `fetch_single(key)`.
    pub fn last_choices_addr(&self, key: &str) -> Option<usize> {
        self.issued_choices.get(key).copied()
    }

    fn begin(&mut self, op: MockOp) -> Result<(), ResultCode> {
        *self.calls.entry(op).or_insert(0) += 1;
        match self.failures.remove(&op) {
            Some(code) => {
                debug!(?op, code, "Injected mock failure");
                Err(ResultCode(code))
            }
            None => Ok(()),
        }
    }

    /// Apply `(id, value)` writes, all or nothing.
    fn apply(&mut self, writes: Vec<(String, RawValue)>) -> Result<(), ResultCode> {
        for (id, _) in &writes {
            match self.device.find(id) {
                None => return Err(ResultCode(GP_ERROR_BAD_PARAMETERS)),
                Some(w) if w.readonly => return Err(ResultCode(GP_ERROR_NOT_SUPPORTED)),
                Some(_) => {}
            }
        }
        for (id, value) in writes {
            if let Some(w) = self.device.find_mut(&id) {
                w.value = value;
            }
            self.writes.push(id);
        }
        self.apply_dependencies();
        Ok(())
    }

    fn apply_dependencies(&mut self) {
        let auto = matches!(
            self.device.find("expprogram").map(|w| &w.value),
            Some(RawValue::Text(p)) if p == "Auto"
        );
        if let Some(wb) = self.device.find_mut("whitebalance") {
            let allowed = if auto { WHITE_BALANCE_AUTO } else { WHITE_BALANCE_ALL };
            if wb.choices.iter().map(String::as_str).ne(allowed.iter().copied()) {
                wb.choices = allowed.iter().map(|s| s.to_string()).collect();
            }
            let current_allowed = matches!(&wb.value, RawValue::Text(v) if allowed.contains(&v.as_str()));
            if !current_allowed {
                wb.value = RawValue::Text(allowed[0].to_string());
            }
        }
    }
}

impl ConfigDriver for MockCamera {
    fn fetch_tree(&mut self) -> Result<NativeWidget, ResultCode> {
        self.begin(MockOp::FetchTree)?;
        Ok(self.device.clone())
    }

    fn push_tree(&mut self, root: &Widget) -> Result<(), ResultCode> {
        self.begin(MockOp::PushTree)?;
        let writes = root
            .descendants()
            .into_iter()
            .filter(|w| w.is_changed())
            .map(|w| (w.id().to_string(), w.native().value.clone()))
            .collect();
        self.apply(writes)
    }

    fn fetch_single(&mut self, key: &str) -> Result<NativeWidget, ResultCode> {
        self.begin(MockOp::FetchSingle)?;
        let mut record = self
            .device
            .find(key)
            .cloned()
            .ok_or(ResultCode(GP_ERROR_BAD_PARAMETERS))?;
        record.children.clear();
        if !record.choices.is_empty() {
            self.issued_choices
                .insert(key.to_string(), record.choices.as_ptr() as usize);
        }
        Ok(record)
    }

    fn push_single(&mut self, key: &str, widget: &Widget) -> Result<(), ResultCode> {
        self.begin(MockOp::PushSingle)?;
        if !widget.is_changed() {
            return Ok(());
        }
        self.apply(vec![(key.to_string(), widget.native().value.clone())])
    }
}

fn text(name: &str, label: &str, value: &str) -> NativeWidget {
    NativeWidget::new(tag::TEXT, name, label).with_value(RawValue::Text(value.to_string()))
}

fn choice(type_tag: i32, name: &str, label: &str, value: &str, choices: &[&str]) -> NativeWidget {
    NativeWidget::new(type_tag, name, label)
        .with_value(RawValue::Text(value.to_string()))
        .with_choices(choices.iter().copied())
}

fn dslr_tree() -> NativeWidget {
    let actions = NativeWidget::new(tag::SECTION, "actions", "Camera Actions")
        .with_child(
            NativeWidget::new(tag::TOGGLE, "autofocusdrive", "Drive Nikon DSLR Autofocus")
                .with_value(RawValue::Int(0)),
        )
        .with_child(
            NativeWidget::new(tag::RANGE, "manualfocusdrive", "Drive Nikon DSLR Manual focus")
                .with_value(RawValue::Float(0.0))
                .with_range(-32767.0, 32767.0, 1.0),
        )
        .with_child(
            NativeWidget::new(tag::TOGGLE, "viewfinder", "Nikon Viewfinder")
                .with_value(RawValue::Int(0)),
        )
        .with_child(NativeWidget::new(tag::BUTTON, "resetsettings", "Reset Camera Settings"));

    let settings = NativeWidget::new(tag::SECTION, "settings", "Camera Settings")
        .with_child(
            NativeWidget::new(tag::DATE, "datetime", "Camera Date and Time")
                .with_value(RawValue::Int(1_700_000_000)),
        )
        .with_child(text("artist", "Artist", ""))
        .with_child(text("copyright", "Copyright", ""))
        .with_child(
            NativeWidget::new(tag::TOGGLE, "autoflash", "Auto Flash")
                .with_value(RawValue::Int(2))
                .tristate(),
        )
        .with_child(choice(
            tag::RADIO,
            "capturetarget",
            "Capture Target",
            "Internal RAM",
            &["Internal RAM", "Memory card"],
        ));

    let status = NativeWidget::new(tag::SECTION, "status", "Camera Status Information")
        .with_child(text("serialnumber", "Serial Number", "3012345").readonly())
        .with_child(text("manufacturer", "Camera Manufacturer", "Nikon Corporation").readonly())
        .with_child(text("cameramodel", "Camera Model", "D750").readonly())
        .with_child(text("batterylevel", "Battery Level", "80%").readonly());

    let imgsettings = NativeWidget::new(tag::SECTION, "imgsettings", "Image Settings")
        .with_child(choice(
            tag::RADIO,
            "iso",
            "ISO Speed",
            "100",
            &["100", "200", "400", "800", "1600", "3200", "6400"],
        ))
        .with_child(choice(
            tag::RADIO,
            "whitebalance",
            "WhiteBalance",
            "Automatic",
            WHITE_BALANCE_ALL,
        ));

    let capturesettings = NativeWidget::new(tag::SECTION, "capturesettings", "Capture Settings")
        .with_child(choice(
            tag::RADIO,
            "expprogram",
            "Exposure Program",
            "M",
            &["M", "P", "A", "S", "Auto"],
        ))
        .with_child(choice(
            tag::RADIO,
            "f-number",
            "F-Number",
            "f/4",
            &["f/1.8", "f/2.8", "f/4", "f/5.6", "f/8", "f/11", "f/16"],
        ))
        .with_child(choice(
            tag::MENU,
            "shutterspeed2",
            "Shutter Speed 2",
            "1/125",
            &[
                "1/4000", "1/2000", "1/1000", "1/500", "1/250", "1/125", "1/60", "1/30", "1/15",
                "1/8", "1/4", "1/2", "1", "2", "30", "Bulb",
            ],
        ))
        .with_child(choice(
            tag::RADIO,
            "focusmode",
            "Focus Mode",
            "AF-S",
            &["Manual", "AF-S", "AF-C", "AF-A"],
        ))
        .with_child(
            NativeWidget::new(tag::RANGE, "exposurecompensation", "Exposure Compensation")
                .with_value(RawValue::Float(0.0))
                .with_range(-3.0, 3.0, 0.5),
        );

    NativeWidget::new(tag::WINDOW, "main", "Camera and Driver Configuration")
        .with_child(actions)
        .with_child(settings)
        .with_child(status)
        .with_child(imgsettings)
        .with_child(capturesettings)
}
