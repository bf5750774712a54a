//! Widget kinds and their capabilities.

use std::fmt;

use crate::native::tag;

/// Closed set of widget kinds, numbered as the driver tags them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum WidgetKind {
    /// Root of the configuration tree.
    Window = tag::WINDOW,
    /// Group of related settings.
    Section = tag::SECTION,
    /// Free-form text.
    Text = tag::TEXT,
    /// Bounded numeric value.
    Range = tag::RANGE,
    /// On/off switch, optionally with an auto state.
    Toggle = tag::TOGGLE,
    /// One of a fixed choice list, shown as radio buttons.
    Radio = tag::RADIO,
    /// One of a fixed choice list, shown as a drop-down.
    Menu = tag::MENU,
    /// Action trigger without a value.
    Button = tag::BUTTON,
    /// Date and time, in unix seconds.
    Date = tag::DATE,
}

impl WidgetKind {
    /// Convert from the raw driver type tag.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            tag::WINDOW => Some(Self::Window),
            tag::SECTION => Some(Self::Section),
            tag::TEXT => Some(Self::Text),
            tag::RANGE => Some(Self::Range),
            tag::TOGGLE => Some(Self::Toggle),
            tag::RADIO => Some(Self::Radio),
            tag::MENU => Some(Self::Menu),
            tag::BUTTON => Some(Self::Button),
            tag::DATE => Some(Self::Date),
            _ => None,
        }
    }

    /// Raw driver type tag.
    pub fn raw(self) -> i32 {
        self as i32
    }

    /// Window and section widgets group other widgets.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Window | Self::Section)
    }

    /// Whether the kind carries a readable value.
    pub fn has_value(self) -> bool {
        !matches!(self, Self::Window | Self::Section | Self::Button)
    }

    /// Radio and menu widgets restrict values to a choice list.
    pub fn supports_choices(self) -> bool {
        matches!(self, Self::Radio | Self::Menu)
    }

    /// Range widgets carry `(min, max, step)` bounds.
    pub fn supports_range(self) -> bool {
        matches!(self, Self::Range)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Window => "window",
            Self::Section => "section",
            Self::Text => "text",
            Self::Range => "range",
            Self::Toggle => "toggle",
            Self::Radio => "radio",
            Self::Menu => "menu",
            Self::Button => "button",
            Self::Date => "date",
        };
        f.write_str(label)
    }
}
