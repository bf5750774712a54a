//! Driver-facing widget records.
//!
//! A [`NativeWidget`] is what a [`ConfigDriver`](crate::driver::ConfigDriver)
//! hands over when it fetches configuration: the raw type tag, the raw value,
//! and the variable-length choices buffer, exactly as the driver reported
//! them. The record is owned; wrapping it in a [`Widget`](crate::Widget)
//! moves it, and every later write lands in the moved record.

/// libgphoto2 widget type tags.
pub mod tag {
    /// Root window.
    pub const WINDOW: i32 = 0;
    /// Grouping section.
    pub const SECTION: i32 = 1;
    /// Free-form text.
    pub const TEXT: i32 = 2;
    /// Bounded numeric slider.
    pub const RANGE: i32 = 3;
    /// On/off switch.
    pub const TOGGLE: i32 = 4;
    /// One-of-many, radio buttons.
    pub const RADIO: i32 = 5;
    /// One-of-many, drop-down.
    pub const MENU: i32 = 6;
    /// Action trigger.
    pub const BUTTON: i32 = 7;
    /// Unix timestamp.
    pub const DATE: i32 = 8;
}

/// Raw widget value as stored by the driver.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    /// Containers and buttons.
    #[default]
    None,
    /// Text, radio and menu widgets.
    Text(String),
    /// Range widgets.
    Float(f32),
    /// Toggle (0/1/2) and date (unix seconds) widgets.
    Int(i32),
}

/// Bounds of a range widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSpec {
    /// Lowest accepted value.
    pub min: f32,
    /// Highest accepted value.
    pub max: f32,
    /// Grid spacing; zero or negative means continuous.
    pub step: f32,
}

impl RangeSpec {
    /// Create a new range.
    pub fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    /// Check if `value` lies within `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= f64::from(self.min) && value <= f64::from(self.max)
    }

    /// Snap an in-range value onto the step grid.
    ///
    /// Values already on the grid (within a small relative tolerance) are
    /// returned unchanged so that an exact write reads back exactly.
    pub fn snap(&self, value: f64) -> f64 {
        let step = f64::from(self.step);
        if step <= 0.0 {
            return value;
        }
        let min = f64::from(self.min);
        let steps = (value - min) / step;
        let nearest = steps.round();
        if (steps - nearest).abs() <= 1e-4 {
            return value;
        }
        (min + nearest * step).clamp(min, f64::from(self.max))
    }
}

/// One node of the driver's configuration tree.
#[derive(Debug, Clone, Default)]
pub struct NativeWidget {
    /// Raw type tag, see [`tag`].
    pub type_tag: i32,
    /// Stable key, unique within the tree.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Driver help text.
    pub info: String,
    /// The driver refuses writes when set.
    pub readonly: bool,
    /// Set when the value was written since the driver last consumed it.
    pub changed: bool,
    /// Toggle reports a third "auto" state.
    pub tristate: bool,
    /// Current value.
    pub value: RawValue,
    /// Allowed values for radio and menu widgets.
    pub choices: Vec<String>,
    /// Bounds for range widgets.
    pub range: Option<RangeSpec>,
    /// Child records for window and section widgets.
    pub children: Vec<NativeWidget>,
}

impl NativeWidget {
    /// Create an empty record of the given type.
    pub fn new(type_tag: i32, name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            type_tag,
            name: name.into(),
            label: label.into(),
            ..Default::default()
        }
    }

    /// Set the value.
    pub fn with_value(mut self, value: RawValue) -> Self {
        self.value = value;
        self
    }

    /// Set the choices buffer.
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Set the range bounds.
    pub fn with_range(mut self, min: f32, max: f32, step: f32) -> Self {
        self.range = Some(RangeSpec::new(min, max, step));
        self
    }

    /// Mark the record read-only.
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Mark a toggle as tri-state.
    pub fn tristate(mut self) -> Self {
        self.tristate = true;
        self
    }

    /// Set the help text.
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    /// Append a child record.
    pub fn with_child(mut self, child: NativeWidget) -> Self {
        self.children.push(child);
        self
    }

    /// Find a record by name, depth-first.
    pub fn find(&self, name: &str) -> Option<&NativeWidget> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Find a record by name, depth-first, mutably.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut NativeWidget> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(name))
    }
}
