use richlabel::{Color, ErrorPhase, LabelError, MarkShape, TextStyle};
use serde::{Deserialize, Serialize};

/// Serializable RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        Self {
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        }
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::rgba(color.r, color.g, color.b, color.a)
    }
}

/// Resolved style passed to renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTextStyle {
    /// Chosen family.
    pub family: String,
    /// Numeric weight.
    pub weight: u16,
    /// Italic flag.
    pub italic: bool,
    /// Size in pixels.
    pub size_px: f32,
    /// Text color; `None` uses the surface foreground.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
}

impl From<&TextStyle> for ResolvedTextStyle {
    fn from(style: &TextStyle) -> Self {
        Self {
            family: style.family.clone(),
            weight: style.weight,
            italic: style.italic,
            size_px: style.size_px,
            color: style.color.map(Rgba::from),
        }
    }
}

impl ResolvedTextStyle {
    pub fn is_bold(&self) -> bool {
        self.weight >= richlabel::WEIGHT_BOLD
    }
}

/// Text draw command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextCommand {
    /// Left x.
    pub x: i32,
    /// Baseline y, already adjusted for super/subscript shift.
    pub baseline_y: i32,
    /// Content.
    pub text: String,
    /// Resolved style.
    pub style: ResolvedTextStyle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorationKind {
    Underline,
    Strikethrough,
}

/// Horizontal decoration line under or through a text command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorationCommand {
    pub kind: DecorationKind,
    /// Start x.
    pub x: i32,
    /// Top y of the line.
    pub y: i32,
    /// Length.
    pub width: u32,
    /// Thickness.
    pub thickness: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
}

/// Drawable mark geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkGlyph {
    Circle,
    Ellipse,
    Square,
    Rectangle,
    Triangle,
    Diamond,
    Line,
}

impl From<MarkShape> for MarkGlyph {
    fn from(shape: MarkShape) -> Self {
        match shape {
            MarkShape::Circle => Self::Circle,
            MarkShape::Ellipse => Self::Ellipse,
            MarkShape::Square => Self::Square,
            MarkShape::Rectangle => Self::Rectangle,
            MarkShape::Triangle => Self::Triangle,
            MarkShape::Diamond => Self::Diamond,
            MarkShape::Line => Self::Line,
        }
    }
}

/// Inline or trailing mark.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkCommand {
    pub glyph: MarkGlyph,
    /// Left x of the bounding box.
    pub x: i32,
    /// Top y of the bounding box.
    pub y: i32,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Rgba>,
    pub stroke_width: u32,
    /// Whether the mark was deferred to the label edge.
    #[serde(default)]
    pub trailing: bool,
}

/// Inline image box; pending images draw as placeholders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCommand {
    /// Image source.
    pub src: String,
    /// Alternate text.
    pub alt: String,
    /// Left x.
    pub x: i32,
    /// Top y.
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Load still in flight when laid out.
    pub pending: bool,
}

/// Filled rectangle, used for the label background.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectCommand {
    /// Left x.
    pub x: i32,
    /// Top y.
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub color: Rgba,
}

/// Layout output commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    /// Label background, always first when present.
    Background(RectCommand),
    /// Draw text.
    Text(TextCommand),
    /// Underline or strike line.
    Decoration(DecorationCommand),
    /// Draw a mark glyph.
    Mark(MarkCommand),
    /// Draw an image or its placeholder.
    Image(ImageCommand),
}

/// Positioned draw commands for one label.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedLabel {
    /// Bounding width in pixels.
    pub width: u32,
    /// Bounding height in pixels.
    pub height: u32,
    /// Number of laid-out lines.
    pub line_count: usize,
    /// Commands in paint order.
    pub commands: Vec<DrawCommand>,
}

impl RenderedLabel {
    /// Text commands in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &TextCommand> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Text(text) => Some(text),
            _ => None,
        })
    }

    /// Mark commands in paint order.
    pub fn marks(&self) -> impl Iterator<Item = &MarkCommand> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Mark(mark) => Some(mark),
            _ => None,
        })
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, LabelError> {
        serde_json::to_string(self)
            .map_err(|e| LabelError::new(ErrorPhase::Export, "EXPORT_JSON_ENCODE", e.to_string()))
    }

    /// Parse JSON produced by [`RenderedLabel::to_json`].
    pub fn from_json(json: &str) -> Result<Self, LabelError> {
        serde_json::from_str(json)
            .map_err(|e| LabelError::new(ErrorPhase::Export, "EXPORT_JSON_DECODE", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RenderedLabel {
        RenderedLabel {
            width: 40,
            height: 16,
            line_count: 1,
            commands: vec![
                DrawCommand::Background(RectCommand {
                    x: 0,
                    y: 0,
                    width: 40,
                    height: 16,
                    color: Rgba::from(Color::rgb(0x20, 0x20, 0x20)),
                }),
                DrawCommand::Text(TextCommand {
                    x: 2,
                    baseline_y: 12,
                    text: "ok".to_string(),
                    style: ResolvedTextStyle {
                        family: "Sans".to_string(),
                        weight: richlabel::WEIGHT_BOLD,
                        italic: false,
                        size_px: 12.0,
                        color: None,
                    },
                }),
                DrawCommand::Mark(MarkCommand {
                    glyph: MarkGlyph::from(MarkShape::Diamond),
                    x: 30,
                    y: 4,
                    width: 8,
                    height: 8,
                    fill: Some(Rgba::from(Color::rgb(255, 0, 0))),
                    stroke: None,
                    stroke_width: 0,
                    trailing: true,
                }),
            ],
        }
    }

    #[test]
    fn json_uses_op_tags_and_omits_absent_colors() {
        let json = sample().to_json().expect("encode");
        assert!(json.contains(r#""op":"background""#));
        assert!(json.contains(r#""op":"text""#));
        assert!(json.contains(r#""glyph":"diamond""#));
        assert!(!json.contains(r#""stroke""#));
        assert_eq!(RenderedLabel::from_json(&json).expect("decode"), sample());
    }

    #[test]
    fn malformed_json_reports_export_error() {
        let err = RenderedLabel::from_json("{\"width\":").expect_err("truncated json");
        assert_eq!(err.phase, ErrorPhase::Export);
        assert_eq!(err.code, "EXPORT_JSON_DECODE");
    }

    #[test]
    fn filters_texts_and_marks() {
        let label = sample();
        assert_eq!(label.texts().count(), 1);
        assert!(label.texts().all(|t| t.style.is_bold()));
        let glyphs: Vec<_> = label.marks().map(|m| m.glyph).collect();
        assert_eq!(glyphs, vec![MarkGlyph::Diamond]);
    }

    #[test]
    fn rgba_round_trips_through_color() {
        let color = Color::rgba(1, 2, 3, 4);
        assert_eq!(Color::from(Rgba::from(color)), color);
    }
}
