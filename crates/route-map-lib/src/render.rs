//! Render handles: stable names for the client-side elements of each route
//!
//! Every route in a collection owns a [`RouteHandles`] bundle. Instructions
//! address client elements only through these names, so the client can keep a
//! flat name -> element table and apply updates without any other context.

use crate::Route;
use crate::style::Rgb;
use crate::update::{Element, Instruction};
use smallvec::{SmallVec, smallvec};
use std::fmt;

const START_FILL: Rgb = Rgb::new(0x00, 0x80, 0x00);
const END_FILL: Rgb = Rgb::new(0xFF, 0x00, 0x00);
const MARKER_RADIUS: f64 = 9.0;
const GLYPH_RADIUS: f64 = 3.0;

/// Globally addressable name of one client element
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ElementName(String);

impl ElementName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a route inside a collection
///
/// It is the name of the route's polyline element, so a click on the client
/// reports the identifier directly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct RouteId(String);

impl RouteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&ElementName> for RouteId {
    fn from(name: &ElementName) -> Self {
        Self(name.0.clone())
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out unique element names; never reuses a sequence number
#[derive(Clone, Debug, Default)]
pub(crate) struct HandleAllocator {
    next: u64,
}

impl HandleAllocator {
    fn next_seq(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

/// Names of every client element belonging to one route
#[derive(Clone, Debug, PartialEq)]
pub struct RouteHandles {
    pub group: ElementName,
    pub polyline: ElementName,
    /// Circle then triangle glyph
    pub start_markers: SmallVec<[ElementName; 2]>,
    /// Circle then square glyph
    pub end_markers: SmallVec<[ElementName; 2]>,
}

impl RouteHandles {
    /// Allocate a fresh bundle; all names share one sequence number
    pub(crate) fn allocate(allocator: &mut HandleAllocator) -> Self {
        let seq = allocator.next_seq();
        let name = |kind: &str| ElementName(format!("{kind}_{seq:06x}"));
        Self {
            group: name("feature_group"),
            polyline: name("poly_line"),
            start_markers: smallvec![name("start_circle"), name("start_glyph")],
            end_markers: smallvec![name("end_circle"), name("end_glyph")],
        }
    }

    pub fn route_id(&self) -> RouteId {
        RouteId::from(&self.polyline)
    }

    pub fn markers(&self) -> impl Iterator<Item = &ElementName> {
        self.start_markers.iter().chain(self.end_markers.iter())
    }

    /// Instructions that create every element of `route` under these handles
    ///
    /// The group comes first so that children can reference it as parent.
    pub fn scene_instructions(&self, route: &Route, min_render_width: f64) -> Vec<Instruction> {
        let points = route.points();
        // Routes always hold at least one point
        let (first, last) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Vec::new(),
        };
        let style = route.style();

        let add = |handle: &ElementName, parent: Option<&ElementName>, element: Element| {
            Instruction::AddElement {
                handle: handle.clone(),
                parent: parent.cloned(),
                element,
            }
        };
        let circle = |at, fill_color| Element::CircleMarker {
            at,
            radius: MARKER_RADIUS,
            color: Rgb::WHITE,
            weight: 1.0,
            fill_color,
            fill_opacity: 1.0,
        };
        let glyph = |at, sides, rotation| Element::PolygonMarker {
            at,
            sides,
            radius: GLYPH_RADIUS,
            rotation,
            color: Rgb::WHITE,
            fill_color: Rgb::WHITE,
            fill_opacity: 1.0,
        };

        let mut out = Vec::with_capacity(2 + self.start_markers.len() + self.end_markers.len());
        out.push(add(&self.group, None, Element::Group));
        out.push(add(
            &self.polyline,
            Some(&self.group),
            Element::Polyline {
                points: points.to_vec(),
                color: style.color,
                weight: style.render_width(min_render_width),
                opacity: 1.0,
            },
        ));

        let end_elements = [circle(last, END_FILL), glyph(last, 4, 45.0)];
        for (handle, element) in self.end_markers.iter().zip(end_elements) {
            out.push(add(handle, Some(&self.group), element));
        }
        let start_elements = [circle(first, START_FILL), glyph(first, 3, 0.0)];
        for (handle, element) in self.start_markers.iter().zip(start_elements) {
            out.push(add(handle, Some(&self.group), element));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coordinate;
    use crate::style::Style;

    #[test]
    fn test_allocated_names_are_unique() {
        let mut allocator = HandleAllocator::default();
        let a = RouteHandles::allocate(&mut allocator);
        let b = RouteHandles::allocate(&mut allocator);
        assert_ne!(a.polyline, b.polyline);
        assert_ne!(a.route_id(), b.route_id());
        assert_eq!(a.polyline.as_str(), "poly_line_000001");
        assert_eq!(a.route_id().as_str(), "poly_line_000001");
        assert_eq!(a.markers().count(), 4);
    }

    #[test]
    fn test_scene_instructions_layout() {
        let mut allocator = HandleAllocator::default();
        let handles = RouteHandles::allocate(&mut allocator);
        let route = Route::new(
            "r",
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)],
        )
        .unwrap()
        .with_style(Style::new(Rgb::new(1, 2, 3), 1.5));

        let instructions = handles.scene_instructions(&route, 3.0);
        assert_eq!(instructions.len(), 6);
        assert!(matches!(
            &instructions[0],
            Instruction::AddElement { handle, parent: None, element: Element::Group } if *handle == handles.group
        ));
        match &instructions[1] {
            Instruction::AddElement {
                handle,
                parent,
                element: Element::Polyline { weight, color, points, .. },
            } => {
                assert_eq!(*handle, handles.polyline);
                assert_eq!(parent.as_ref(), Some(&handles.group));
                assert_eq!(*weight, 3.0);
                assert_eq!(*color, Rgb::new(1, 2, 3));
                assert_eq!(points.len(), 2);
            }
            other => panic!("unexpected instruction {other:?}"),
        }
        for instruction in &instructions[2..] {
            assert!(matches!(
                instruction,
                Instruction::AddElement { parent: Some(p), .. } if *p == handles.group
            ));
        }
    }
}
