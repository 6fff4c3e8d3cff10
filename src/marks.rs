//! Inline mark glyphs (`<mark ...>`) and the shape factory seam.

extern crate alloc;

use alloc::string::String;

use crate::attributes::AttributeMap;
use crate::color::Color;

/// Drawable shape of a mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkShape {
    Circle,
    Ellipse,
    Square,
    Rectangle,
    Triangle,
    Diamond,
    Line,
}

impl MarkShape {
    /// Parse a shape name case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let shape = match name.trim().to_ascii_lowercase().as_str() {
            "circle" | "dot" => Self::Circle,
            "ellipse" | "oval" => Self::Ellipse,
            "square" => Self::Square,
            "rectangle" | "rect" | "box" => Self::Rectangle,
            "triangle" => Self::Triangle,
            "diamond" | "rhombus" => Self::Diamond,
            "line" | "dash" => Self::Line,
            _ => return None,
        };
        Some(shape)
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
            Self::Square => "square",
            Self::Rectangle => "rectangle",
            Self::Triangle => "triangle",
            Self::Diamond => "diamond",
            Self::Line => "line",
        }
    }
}

/// Everything a shape factory gets to build one mark.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkRequest<'a> {
    /// Attributes written on the tag.
    pub attributes: &'a AttributeMap,
    /// Edge length used when `width`/`height` are absent.
    pub default_size_px: f32,
    /// Fill used when `fill` is absent (the current text color).
    pub default_fill: Option<Color>,
}

/// Resolved, drawable mark.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkSpec {
    pub shape: MarkShape,
    pub width: f32,
    pub height: f32,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
    /// Optional tooltip/accessible text from a `title` attribute.
    pub title: Option<String>,
}

/// Builds drawable marks from tag attributes.
pub trait ShapeFactory {
    /// Resolve a mark; `None` drops it from the output.
    fn build(&self, request: &MarkRequest<'_>) -> Option<MarkSpec>;
}

/// Default factory covering the built-in [`MarkShape`]s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StandardShapes;

impl ShapeFactory for StandardShapes {
    fn build(&self, request: &MarkRequest<'_>) -> Option<MarkSpec> {
        let attrs = request.attributes;
        let shape = match attrs.get("shape") {
            Some(name) => MarkShape::from_name(name).unwrap_or_else(|| {
                log::debug!("unknown mark shape '{}'; using circle", name);
                MarkShape::Circle
            }),
            None => MarkShape::Circle,
        };
        let fallback = request.default_size_px.max(0.0);
        let positive = |key: &str| attrs.get_f32(key).filter(|v| *v >= 0.0);
        let width = positive("width");
        let height = positive("height");
        // A single given dimension keeps squares and circles square.
        let (width, height) = match (width, height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, w),
            (None, Some(h)) => (h, h),
            (None, None) => (fallback, fallback),
        };
        let fill = attrs.get_color("fill").or(request.default_fill);
        let stroke = attrs.get_color("stroke");
        let stroke_width = positive("stroke-width")
            .or_else(|| positive("strokeWidth"))
            .unwrap_or(if stroke.is_some() { 1.0 } else { 0.0 });
        Some(MarkSpec {
            shape,
            width,
            height,
            fill,
            stroke,
            stroke_width,
            title: attrs.get("title").map(String::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(raw: &str, size: f32, fill: Option<Color>) -> MarkSpec {
        let attrs = AttributeMap::parse(raw);
        StandardShapes
            .build(&MarkRequest {
                attributes: &attrs,
                default_size_px: size,
                default_fill: fill,
            })
            .expect("standard shapes always build")
    }

    #[test]
    fn missing_stroke_defaults_to_none() {
        let spec = build(r#"shape="Circle" width="8" fill="red""#, 10.0, None);
        assert_eq!(spec.shape, MarkShape::Circle);
        assert_eq!(spec.width, 8.0);
        assert_eq!(spec.height, 8.0);
        assert_eq!(spec.fill, Some(Color::rgb(255, 0, 0)));
        assert_eq!(spec.stroke, None);
        assert_eq!(spec.stroke_width, 0.0);
    }

    #[test]
    fn bare_mark_uses_current_size_and_color() {
        let blue = Color::rgb(0, 0, 255);
        let spec = build("", 9.0, Some(blue));
        assert_eq!(spec.shape, MarkShape::Circle);
        assert_eq!((spec.width, spec.height), (9.0, 9.0));
        assert_eq!(spec.fill, Some(blue));
    }

    #[test]
    fn unknown_shape_falls_back_to_circle() {
        let spec = build(r#"shape="Hexagon" width=4 height=2 stroke=black"#, 10.0, None);
        assert_eq!(spec.shape, MarkShape::Circle);
        assert_eq!((spec.width, spec.height), (4.0, 2.0));
        assert_eq!(spec.stroke, Some(Color::BLACK));
        assert_eq!(spec.stroke_width, 1.0);
    }

    #[test]
    fn shape_names_are_case_insensitive() {
        assert_eq!(MarkShape::from_name("DIAMOND"), Some(MarkShape::Diamond));
        assert_eq!(MarkShape::from_name(" rect "), Some(MarkShape::Rectangle));
        assert_eq!(MarkShape::from_name("star"), None);
    }
}
