//! Typed client-update instructions and the buffer that carries them
//!
//! Every collection mutation appends zero or more [`Instruction`]s to an
//! [`UpdateChannel`]. The request layer drains the channel once per request
//! and forwards the instructions, in order, to the client renderer.
//! Serialization to the wire only happens at that boundary.

use crate::geometry::Coordinate;
use crate::render::ElementName;
use crate::style::Rgb;
use geo::Rect;

/// A visual element that can be added to the live scene
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum Element {
    /// Container holding every element of one route
    Group,
    Polyline {
        points: Vec<Coordinate>,
        color: Rgb,
        weight: f64,
        opacity: f64,
    },
    CircleMarker {
        at: Coordinate,
        radius: f64,
        color: Rgb,
        weight: f64,
        fill_color: Rgb,
        fill_opacity: f64,
    },
    PolygonMarker {
        at: Coordinate,
        sides: u8,
        radius: f64,
        rotation: f64,
        color: Rgb,
        fill_color: Rgb,
        fill_opacity: f64,
    },
}

/// Partial style update; `None` fields are left as they are on the client
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StylePatch {
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub color: Option<Rgb>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub weight: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub opacity: Option<f64>,
    /// `Some(None)` resets to a solid line and travels as `null`
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "double_option")
    )]
    pub dash_array: Option<Option<String>>,
}

/// A present field (even `null`) is `Some`; an absent one falls back to the
/// field default
#[cfg(feature = "serde")]
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    <Option<T> as serde::Deserialize>::deserialize(deserializer).map(Some)
}

impl StylePatch {
    pub fn color(color: Rgb) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }

    pub fn weight(weight: f64) -> Self {
        Self {
            weight: Some(weight),
            ..Self::default()
        }
    }
}

/// Rectangle the client view should frame
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewBounds {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl From<Rect<f64>> for ViewBounds {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            south_west: Coordinate::new(rect.min().y, rect.min().x),
            north_east: Coordinate::new(rect.max().y, rect.max().x),
        }
    }
}

/// One `label: value` line of a popup
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopupRow {
    pub label: String,
    pub value: String,
}

impl PopupRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Popup text; the renderer is responsible for escaping
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Popup {
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub title: Option<String>,
    pub rows: Vec<PopupRow>,
}

/// A single ordered client update
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "op", rename_all = "snake_case")
)]
pub enum Instruction {
    /// Create `element` and bind it to `handle`; `parent = None` attaches it
    /// to the map itself
    AddElement {
        handle: ElementName,
        parent: Option<ElementName>,
        element: Element,
    },
    RemoveElement {
        handle: ElementName,
    },
    SetStyle {
        handle: ElementName,
        patch: StylePatch,
    },
    SetVisibility {
        handle: ElementName,
        visible: bool,
    },
    SetView {
        bounds: ViewBounds,
    },
    /// `at = None` anchors the popup at the centre of the current view
    ShowPopup {
        at: Option<Coordinate>,
        popup: Popup,
    },
    Redraw {
        handle: ElementName,
    },
    /// Start the client's freehand polyline tool
    BeginDraw,
    /// Put the given polyline in vertex-edit mode
    BeginEdit {
        handle: ElementName,
    },
}

/// Append-only buffer of pending instructions, drained once per request
#[derive(Clone, Debug, Default)]
pub struct UpdateChannel {
    pending: Vec<Instruction>,
}

impl UpdateChannel {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, instruction: Instruction) {
        self.pending.push(instruction);
    }

    #[inline]
    pub fn extend(&mut self, instructions: impl IntoIterator<Item = Instruction>) {
        self.pending.extend(instructions);
    }

    /// Instructions queued since the last drain
    #[inline]
    pub fn pending(&self) -> &[Instruction] {
        &self.pending
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every pending instruction, leaving the buffer empty
    pub fn drain(&mut self) -> Vec<Instruction> {
        std::mem::take(&mut self.pending)
    }

    /// Serialize the pending instructions as a JSON array, then clear them
    ///
    /// On a serialization error nothing is removed.
    #[cfg(feature = "serde")]
    pub fn drain_json(&mut self) -> serde_json::Result<String> {
        let json = serde_json::to_string(&self.pending)?;
        self.pending.clear();
        Ok(json)
    }
}
