//! Configuration widgets.
//!
//! A [`Widget`] is one node of a camera's configuration tree: either a
//! container (window, section) or a typed setting. [`Widget::wrap`] is the
//! factory: it takes a driver record by value, resolves its type tag to a
//! [`WidgetKind`] and moves the record (value and choices buffer included)
//! into the widget. Writes go into that owned record, which is what the
//! driver reads back on save.
//!
//! Widgets are edited through the [`Camera`](crate::Camera) so that every
//! successful write also marks the configuration dirty.

mod kind;
mod value;

use std::collections::HashMap;

use chrono::DateTime;
use tracing::{debug, warn};

use crate::error::{CameraError, Result};
use crate::native::{NativeWidget, RangeSpec, RawValue};

pub use kind::WidgetKind;
pub use value::WidgetValue;

/// Child positions leading from the root to a widget.
pub(crate) type WidgetPath = Vec<usize>;

/// Raw toggle encodings.
const TOGGLE_OFF: i32 = 0;
const TOGGLE_ON: i32 = 1;
const TOGGLE_AUTO: i32 = 2;

/// A node in the configuration tree.
#[derive(Debug)]
pub struct Widget {
    kind: WidgetKind,
    native: NativeWidget,
    children: Vec<Widget>,
}

impl Widget {
    /// Wrap a driver record, recursively wrapping its children.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::UnknownWidgetType`] if this record or any
    /// descendant carries an unrecognized type tag.
    pub fn wrap(mut native: NativeWidget) -> Result<Self> {
        let kind = WidgetKind::from_raw(native.type_tag).ok_or(CameraError::UnknownWidgetType {
            tag: native.type_tag,
        })?;

        if native.value == RawValue::Int(TOGGLE_AUTO) && kind == WidgetKind::Toggle {
            native.tristate = true;
        }

        let children = std::mem::take(&mut native.children)
            .into_iter()
            .map(Widget::wrap)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            kind,
            native,
            children,
        })
    }

    /// Stable key, unique within the tree.
    pub fn id(&self) -> &str {
        &self.native.name
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        &self.native.label
    }

    /// Driver help text.
    pub fn info(&self) -> &str {
        &self.native.info
    }

    /// Widget kind.
    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    /// Whether the driver refuses writes.
    pub fn is_readonly(&self) -> bool {
        self.native.readonly
    }

    /// Whether the value was written since the driver last consumed it.
    pub fn is_changed(&self) -> bool {
        self.native.changed
    }

    /// Whether a toggle accepts the "auto" state.
    pub fn is_tristate(&self) -> bool {
        self.native.tristate
    }

    /// Allowed values; empty unless the kind supports choices.
    pub fn choices(&self) -> &[String] {
        &self.native.choices
    }

    /// Range bounds, for range widgets.
    pub fn range(&self) -> Option<RangeSpec> {
        self.native.range
    }

    /// Child widgets; empty for leaves.
    pub fn children(&self) -> &[Widget] {
        &self.children
    }

    /// Direct child by id.
    pub fn child(&self, id: &str) -> Option<&Widget> {
        self.children.iter().find(|c| c.id() == id)
    }

    /// Descendant (or self) by id, depth-first.
    pub fn find(&self, id: &str) -> Option<&Widget> {
        if self.id() == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// The owned driver record, as drivers read it back on save.
    ///
    /// Children live in [`Widget::children`], not in the record.
    pub fn native(&self) -> &NativeWidget {
        &self.native
    }

    /// Self and all descendants in depth-first pre-order.
    pub fn descendants(&self) -> Vec<&Widget> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Widget>) {
        out.push(self);
        for child in &self.children {
            child.collect(out);
        }
    }

    /// Current value decoded per kind.
    ///
    /// # Errors
    ///
    /// [`CameraError::NotSupported`] for window, section and button widgets;
    /// [`CameraError::InvalidValue`] if the driver stored a raw value that
    /// does not match the kind.
    pub fn value(&self) -> Result<WidgetValue> {
        use WidgetKind::*;

        match (self.kind, &self.native.value) {
            (Window | Section | Button, _) => Err(self.not_supported()),
            (Text | Radio | Menu, RawValue::Text(s)) => Ok(WidgetValue::Text(s.clone())),
            (Text | Radio | Menu, RawValue::None) => Ok(WidgetValue::Text(String::new())),
            (Range, RawValue::Float(f)) => Ok(WidgetValue::Float(*f)),
            (Range, RawValue::Int(i)) => Ok(WidgetValue::Float(*i as f32)),
            (Toggle, RawValue::Int(TOGGLE_AUTO)) => Ok(WidgetValue::Auto),
            (Toggle, RawValue::Int(i)) => Ok(WidgetValue::Bool(*i != TOGGLE_OFF)),
            (Toggle, RawValue::None) => Ok(WidgetValue::Bool(false)),
            (Date, RawValue::Int(secs)) => DateTime::from_timestamp(i64::from(*secs), 0)
                .map(WidgetValue::Date)
                .ok_or_else(|| self.invalid(format!("timestamp {} out of range", secs))),
            (kind, raw) => Err(self.invalid(format!("driver reported {:?} for a {} widget", raw, kind))),
        }
    }

    /// Validate, coerce and store a new value.
    ///
    /// Marks the widget changed only if the stored raw value differs.
    pub(crate) fn set_value(&mut self, value: WidgetValue) -> Result<()> {
        if self.native.readonly {
            return Err(CameraError::ReadOnly {
                id: self.id().to_string(),
            });
        }
        let raw = self.coerce(value)?;
        let changed = self.assign_raw(raw);
        debug!(id = %self.id(), changed, "Widget value set");
        Ok(())
    }

    /// Store a raw value without validation. Returns whether it differed.
    pub(crate) fn assign_raw(&mut self, raw: RawValue) -> bool {
        if self.native.value == raw {
            return false;
        }
        self.native.value = raw;
        self.native.changed = true;
        true
    }

    /// Move the raw value out, leaving `RawValue::None`.
    pub(crate) fn take_raw(&mut self) -> RawValue {
        std::mem::take(&mut self.native.value)
    }

    pub(crate) fn set_changed(&mut self, changed: bool) {
        self.native.changed = changed;
    }

    pub(crate) fn set_readonly(&mut self, readonly: bool) {
        self.native.readonly = readonly;
    }

    pub(crate) fn set_tristate(&mut self, tristate: bool) {
        self.native.tristate = tristate;
    }

    /// Exchange choice buffers with `other`.
    ///
    /// Each buffer keeps exactly one owner: afterwards `self` owns what
    /// `other` held and `other` owns what `self` held.
    pub(crate) fn swap_choices(&mut self, other: &mut Widget) {
        std::mem::swap(&mut self.native.choices, &mut other.native.choices);
    }

    pub(crate) fn clear_changed(&mut self) {
        self.native.changed = false;
        for child in &mut self.children {
            child.clear_changed();
        }
    }

    pub(crate) fn any_changed(&self) -> bool {
        self.native.changed || self.children.iter().any(Widget::any_changed)
    }

    pub(crate) fn at_path(&self, path: &[usize]) -> Option<&Widget> {
        path.iter()
            .try_fold(self, |node, &i| node.children.get(i))
    }

    pub(crate) fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Widget> {
        path.iter()
            .try_fold(self, |node, &i| node.children.get_mut(i))
    }

    /// Build the id → path index over this subtree, first id wins.
    pub(crate) fn build_index(&self) -> HashMap<String, WidgetPath> {
        let mut index = HashMap::new();
        let mut path = Vec::new();
        self.index_into(&mut path, &mut index);
        index
    }

    fn index_into(&self, path: &mut WidgetPath, index: &mut HashMap<String, WidgetPath>) {
        if index.contains_key(self.id()) {
            warn!(id = %self.id(), "Duplicate widget id, keeping first occurrence");
        } else {
            index.insert(self.id().to_string(), path.clone());
        }
        for (i, child) in self.children.iter().enumerate() {
            path.push(i);
            child.index_into(path, index);
            path.pop();
        }
    }

    fn coerce(&self, value: WidgetValue) -> Result<RawValue> {
        use WidgetKind::*;

        match self.kind {
            Window | Section | Button => Err(self.not_supported()),
            Text => Ok(RawValue::Text(value.to_string())),
            Radio | Menu => {
                let text = value.to_string();
                if self.native.choices.iter().any(|c| *c == text) {
                    Ok(RawValue::Text(text))
                } else {
                    Err(CameraError::InvalidChoice {
                        id: self.id().to_string(),
                        value: text,
                        choices: self.native.choices.clone(),
                    })
                }
            }
            Range => {
                let v = value
                    .as_f64()
                    .ok_or_else(|| self.invalid(format!("'{}' is not numeric", value)))?;
                if !v.is_finite() {
                    return Err(self.invalid(format!("{} is not finite", v)));
                }
                let v = match self.native.range {
                    Some(range) if !range.contains(v) => {
                        return Err(CameraError::OutOfRange {
                            id: self.id().to_string(),
                            value: v,
                            min: range.min,
                            max: range.max,
                        })
                    }
                    Some(range) => range.snap(v),
                    None => v,
                };
                Ok(RawValue::Float(v as f32))
            }
            Toggle => {
                let raw = match &value {
                    WidgetValue::Bool(b) => Some(if *b { TOGGLE_ON } else { TOGGLE_OFF }),
                    WidgetValue::Auto => Some(TOGGLE_AUTO),
                    WidgetValue::Int(i @ 0..=2) => Some(*i as i32),
                    WidgetValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                        "1" | "on" | "true" => Some(TOGGLE_ON),
                        "0" | "off" | "false" => Some(TOGGLE_OFF),
                        "2" | "auto" => Some(TOGGLE_AUTO),
                        _ => None,
                    },
                    _ => None,
                }
                .ok_or_else(|| self.invalid(format!("'{}' is not a toggle state", value)))?;
                if raw == TOGGLE_AUTO && !self.native.tristate {
                    return Err(self.invalid("toggle has no auto state".to_string()));
                }
                Ok(RawValue::Int(raw))
            }
            Date => {
                let (secs, nanos) = match &value {
                    WidgetValue::Date(dt) => (dt.timestamp(), dt.timestamp_subsec_nanos()),
                    WidgetValue::Int(i) => (*i, 0),
                    WidgetValue::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                        .map(|dt| (dt.timestamp(), dt.timestamp_subsec_nanos()))
                        .map_err(|e| self.invalid(format!("'{}': {}", s, e)))?,
                    _ => return Err(self.invalid(format!("'{}' is not a timestamp", value))),
                };
                // The device stores whole seconds
                if nanos != 0 {
                    return Err(self.invalid(format!("'{}' has sub-second precision", value)));
                }
                i32::try_from(secs)
                    .map(RawValue::Int)
                    .map_err(|_| self.invalid(format!("timestamp {} does not fit the device", secs)))
            }
        }
    }

    fn not_supported(&self) -> CameraError {
        CameraError::NotSupported {
            id: self.id().to_string(),
            kind: self.kind,
        }
    }

    fn invalid(&self, reason: String) -> CameraError {
        CameraError::InvalidValue {
            id: self.id().to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::tag;
    use chrono::{TimeZone, Utc};

    fn radio() -> Widget {
        Widget::wrap(
            NativeWidget::new(tag::RADIO, "iso", "ISO Speed")
                .with_value(RawValue::Text("100".into()))
                .with_choices(["100", "200", "400"]),
        )
        .unwrap()
    }

    #[test]
    fn test_factory_rejects_unknown_tag() {
        let err = Widget::wrap(NativeWidget::new(99, "x", "X")).unwrap_err();
        assert!(matches!(err, CameraError::UnknownWidgetType { tag: 99 }));

        let nested = NativeWidget::new(tag::WINDOW, "main", "Main")
            .with_child(NativeWidget::new(-3, "bad", "Bad"));
        assert!(Widget::wrap(nested).is_err());
    }

    #[test]
    fn test_factory_moves_choices() {
        let native = NativeWidget::new(tag::MENU, "wb", "WB").with_choices(["Auto", "Daylight"]);
        let buffer = native.choices.as_ptr();
        let widget = Widget::wrap(native).unwrap();
        assert_eq!(widget.choices().as_ptr(), buffer);
    }

    #[test]
    fn test_radio_choice_validation() {
        let mut w = radio();
        w.set_value(200.into()).unwrap();
        assert_eq!(w.value().unwrap(), WidgetValue::Text("200".into()));
        assert!(w.is_changed());

        let err = w.set_value("123".into()).unwrap_err();
        assert!(matches!(err, CameraError::InvalidChoice { .. }));
        assert_eq!(w.value().unwrap(), WidgetValue::Text("200".into()));
    }

    #[test]
    fn test_same_value_does_not_mark_changed() {
        let mut w = radio();
        w.set_value("100".into()).unwrap();
        assert!(!w.is_changed());
    }

    #[test]
    fn test_readonly_rejected_before_coercion() {
        let mut w = Widget::wrap(
            NativeWidget::new(tag::TEXT, "serialnumber", "Serial Number")
                .with_value(RawValue::Text("123".into()))
                .readonly(),
        )
        .unwrap();
        let err = w.set_value("456".into()).unwrap_err();
        assert!(matches!(err, CameraError::ReadOnly { .. }));
    }

    #[test]
    fn test_range_bounds_and_snap() {
        let mut w = Widget::wrap(
            NativeWidget::new(tag::RANGE, "zoom", "Zoom")
                .with_value(RawValue::Float(0.0))
                .with_range(0.0, 10.0, 0.5),
        )
        .unwrap();

        w.set_value(2.5f32.into()).unwrap();
        assert_eq!(w.value().unwrap(), WidgetValue::Float(2.5));

        w.set_value("3.1".into()).unwrap();
        assert_eq!(w.value().unwrap(), WidgetValue::Float(3.0));

        let err = w.set_value(11.into()).unwrap_err();
        assert!(matches!(err, CameraError::OutOfRange { .. }));

        let err = w.set_value("wide".into()).unwrap_err();
        assert!(matches!(err, CameraError::InvalidValue { .. }));
    }

    #[test]
    fn test_toggle_states() {
        let mut w = Widget::wrap(
            NativeWidget::new(tag::TOGGLE, "autofocusdrive", "Drive Nikon DSLR Autofocus")
                .with_value(RawValue::Int(0)),
        )
        .unwrap();
        w.set_value(true.into()).unwrap();
        assert_eq!(w.value().unwrap(), WidgetValue::Bool(true));
        w.set_value("off".into()).unwrap();
        assert_eq!(w.value().unwrap(), WidgetValue::Bool(false));
        assert!(w.set_value(WidgetValue::Auto).is_err());

        let tri = Widget::wrap(
            NativeWidget::new(tag::TOGGLE, "flash", "Flash").with_value(RawValue::Int(2)),
        )
        .unwrap();
        assert!(tri.is_tristate());
        assert_eq!(tri.value().unwrap(), WidgetValue::Auto);
    }

    #[test]
    fn test_date_round_trip() {
        let mut w = Widget::wrap(
            NativeWidget::new(tag::DATE, "datetime", "Camera Date and Time")
                .with_value(RawValue::Int(0)),
        )
        .unwrap();
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        w.set_value(dt.into()).unwrap();
        assert_eq!(w.value().unwrap(), WidgetValue::Date(dt));

        let err = w.set_value(i64::MAX.into()).unwrap_err();
        assert!(matches!(err, CameraError::InvalidValue { .. }));
    }

    #[test]
    fn test_date_rejects_sub_second() {
        let mut w = Widget::wrap(
            NativeWidget::new(tag::DATE, "datetime", "Camera Date and Time")
                .with_value(RawValue::Int(0)),
        )
        .unwrap();
        let fractional = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
        let err = w.set_value(fractional.into()).unwrap_err();
        assert!(matches!(err, CameraError::InvalidValue { .. }));

        let err = w.set_value("2023-11-14T22:13:20.5Z".into()).unwrap_err();
        assert!(matches!(err, CameraError::InvalidValue { .. }));
        assert!(!w.is_changed());

        let whole = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        w.set_value(whole.into()).unwrap();
        assert_eq!(w.value().unwrap(), WidgetValue::Date(whole));
        w.set_value("2023-11-14T22:13:20Z".into()).unwrap();
        assert_eq!(w.value().unwrap(), WidgetValue::Date(whole));
    }

    #[test]
    fn test_containers_have_no_value() {
        let mut w = Widget::wrap(NativeWidget::new(tag::SECTION, "settings", "Settings")).unwrap();
        assert!(matches!(w.value(), Err(CameraError::NotSupported { .. })));
        assert!(matches!(
            w.set_value("x".into()),
            Err(CameraError::NotSupported { .. })
        ));
    }

    #[test]
    fn test_index_paths() {
        let root = Widget::wrap(
            NativeWidget::new(tag::WINDOW, "main", "Main")
                .with_child(
                    NativeWidget::new(tag::SECTION, "settings", "Settings")
                        .with_child(NativeWidget::new(tag::TEXT, "artist", "Artist"))
                        .with_child(NativeWidget::new(tag::TEXT, "artist", "Duplicate")),
                )
                .with_child(NativeWidget::new(tag::TEXT, "owner", "Owner")),
        )
        .unwrap();
        let index = root.build_index();
        assert_eq!(index.len(), 4);
        assert_eq!(index["artist"], vec![0, 0]);
        assert_eq!(index["owner"], vec![1]);
        assert_eq!(root.at_path(&index["artist"]).map(Widget::label), Some("Artist"));
        assert!(index["main"].is_empty());
    }
}
