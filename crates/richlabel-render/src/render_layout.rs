use richlabel::{ImageState, InlineImage, LabelContent, LabelItem, MarkSpec, TextStyle};

use crate::render_ir::{
    DecorationCommand, DecorationKind, DrawCommand, ImageCommand, MarkCommand, MarkGlyph,
    RectCommand, RenderedLabel, ResolvedTextStyle, Rgba, TextCommand,
};

/// Text measurement hook supplied by the drawing backend.
pub trait TextMeasurer {
    /// Measure rendered text width for the provided style.
    fn measure_text_px(&self, text: &str, style: &TextStyle) -> f32;

    /// Distance from the top of the line box to the baseline.
    fn ascent_px(&self, style: &TextStyle) -> f32 {
        style.size_px * 0.8
    }

    /// Full line box height.
    fn line_height_px(&self, style: &TextStyle) -> f32 {
        style.size_px * 1.2
    }
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn measure_text_px(&self, text: &str, style: &TextStyle) -> f32 {
        (**self).measure_text_px(text, style)
    }

    fn ascent_px(&self, style: &TextStyle) -> f32 {
        (**self).ascent_px(style)
    }

    fn line_height_px(&self, style: &TextStyle) -> f32 {
        (**self).line_height_px(style)
    }
}

/// Glyph-class width model for when no font metrics are available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeuristicTextMeasurer;

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure_text_px(&self, text: &str, style: &TextStyle) -> f32 {
        let family = style.family.to_ascii_lowercase();
        let monospace = family.contains("mono") || family.contains("fixed");
        let em_sum: f32 = if monospace {
            text.chars().map(|ch| if ch == ' ' { 0.52 } else { 0.58 }).sum()
        } else {
            text.chars().map(glyph_em_width).sum()
        };
        let mut scale = 1.0;
        if style.is_bold() {
            scale += 0.03;
        }
        if style.italic {
            scale += 0.01;
        }
        em_sum * style.size_px * scale
    }
}

fn glyph_em_width(ch: char) -> f32 {
    match ch {
        ' ' | '\u{00A0}' => 0.32,
        '\t' => 1.28,
        'i' | 'l' | 'I' | '|' | '!' => 0.24,
        '.' | ',' | ':' | ';' | '\'' | '"' | '`' => 0.23,
        '-' | '\u{2010}' | '\u{2013}' | '\u{2014}' => 0.34,
        '(' | ')' | '[' | ']' | '{' | '}' => 0.30,
        'f' | 't' | 'j' | 'r' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' | '%' | '&' | '#' => 0.74,
        c if c.is_ascii_digit() => 0.52,
        c if c.is_ascii_uppercase() => 0.64,
        c if c.is_ascii_lowercase() => 0.52,
        c if c.is_whitespace() => 0.32,
        c if c.is_ascii_punctuation() => 0.42,
        _ => 0.56,
    }
}

/// Which edge deferred marks are drawn at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarkAnchor {
    /// After the last item of the last line.
    #[default]
    Trailing,
    /// Before the first item of the first line.
    Leading,
    /// Whichever edge is geometrically closer to `reference_x`.
    Nearest { reference_x: i32 },
}

/// Layout configuration for a single label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Left x of the label box.
    pub origin_x: i32,
    /// Top y of the label box.
    pub origin_y: i32,
    /// Inner padding on every side.
    pub padding_px: i32,
    /// Extra gap between lines.
    pub line_gap_px: i32,
    /// Gap between deferred marks and the text.
    pub mark_gap_px: i32,
    /// Edge policy for deferred marks.
    pub anchor: MarkAnchor,
    /// Edge length of an image whose size is still unknown.
    pub placeholder_px: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin_x: 0,
            origin_y: 0,
            padding_px: 0,
            line_gap_px: 2,
            mark_gap_px: 2,
            anchor: MarkAnchor::Trailing,
            placeholder_px: 16,
        }
    }
}

impl LayoutConfig {
    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.origin_x = x;
        self.origin_y = y;
        self
    }

    pub fn with_padding(mut self, padding_px: i32) -> Self {
        self.padding_px = padding_px;
        self
    }

    pub fn with_anchor(mut self, anchor: MarkAnchor) -> Self {
        self.anchor = anchor;
        self
    }
}

#[derive(Clone, Copy, Debug)]
enum Piece<'a> {
    Text {
        text: &'a str,
        style: &'a TextStyle,
        width: f32,
    },
    Mark {
        spec: &'a MarkSpec,
        trailing: bool,
    },
    Image {
        image: &'a InlineImage,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Default)]
struct Line<'a> {
    pieces: Vec<(f32, Piece<'a>)>,
    width: f32,
    above: f32,
    below: f32,
}

impl<'a> Line<'a> {
    fn push(&mut self, piece: Piece<'a>, width: f32, above: f32, below: f32) {
        self.pieces.push((self.width, piece));
        self.width += width;
        self.grow(above, below);
    }

    fn grow(&mut self, above: f32, below: f32) {
        self.above = self.above.max(above);
        self.below = self.below.max(below);
    }

    fn shift_right(&mut self, dx: f32) {
        for (x, _) in self.pieces.iter_mut() {
            *x += dx;
        }
        self.width += dx;
    }
}

/// Positions interpreted label content into draw commands.
#[derive(Clone, Debug)]
pub struct LabelLayout<M = HeuristicTextMeasurer> {
    config: LayoutConfig,
    measurer: M,
}

impl LabelLayout<HeuristicTextMeasurer> {
    /// Layout with the heuristic measurer.
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            measurer: HeuristicTextMeasurer,
        }
    }
}

impl<M: TextMeasurer> LabelLayout<M> {
    /// Layout with a backend-specific measurer.
    pub fn with_measurer(config: LayoutConfig, measurer: M) -> Self {
        Self { config, measurer }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out `content` as a block of lines split at newline runs.
    pub fn layout(&self, content: &LabelContent) -> RenderedLabel {
        let mut lines = self.break_lines(content);
        self.place_trailing_marks(content.trailing_marks(), &mut lines);

        let cfg = &self.config;
        let mut commands = Vec::new();
        let mut y = cfg.origin_y.saturating_add(cfg.padding_px) as f32;
        let left = cfg.origin_x.saturating_add(cfg.padding_px) as f32;
        let mut max_width = 0.0f32;
        for (idx, line) in lines.iter().enumerate() {
            if idx > 0 {
                y += cfg.line_gap_px as f32;
            }
            let baseline = y + line.above;
            for (x, piece) in &line.pieces {
                self.emit_piece(&mut commands, left + x, baseline, piece);
            }
            max_width = max_width.max(line.width);
            y += line.above + line.below;
        }

        // Float-to-int casts saturate, so oversized text pins the box at i32::MAX.
        let width = (max_width.ceil() as i32)
            .saturating_add(cfg.padding_px.saturating_mul(2))
            .max(0) as u32;
        let height = (y.ceil() as i32)
            .saturating_sub(cfg.origin_y)
            .saturating_add(cfg.padding_px)
            .max(0) as u32;
        if let Some(bg) = content.background() {
            commands.insert(
                0,
                DrawCommand::Background(RectCommand {
                    x: cfg.origin_x,
                    y: cfg.origin_y,
                    width,
                    height,
                    color: Rgba::from(bg),
                }),
            );
        }
        RenderedLabel {
            width,
            height,
            line_count: lines.len(),
            commands,
        }
    }

    fn break_lines<'a>(&self, content: &'a LabelContent) -> Vec<Line<'a>> {
        let mut lines = vec![Line::default()];
        for item in content.iter() {
            match item {
                LabelItem::Run(run) => {
                    let ascent = self.measurer.ascent_px(&run.style);
                    let line_height = self.measurer.line_height_px(&run.style);
                    let shift = run.style.baseline_shift;
                    for (part_idx, part) in run.text.split('\n').enumerate() {
                        if part_idx > 0 {
                            if let Some(line) = lines.last_mut() {
                                line.grow(ascent, line_height - ascent);
                            }
                            let mut next = Line::default();
                            next.grow(ascent, line_height - ascent);
                            lines.push(next);
                        }
                        if part.is_empty() {
                            continue;
                        }
                        let width = self.measurer.measure_text_px(part, &run.style);
                        if let Some(line) = lines.last_mut() {
                            line.push(
                                Piece::Text {
                                    text: part,
                                    style: &run.style,
                                    width,
                                },
                                width,
                                ascent + shift,
                                line_height - ascent - shift,
                            );
                        }
                    }
                }
                LabelItem::Mark(spec) => {
                    if let Some(line) = lines.last_mut() {
                        line.push(
                            Piece::Mark {
                                spec,
                                trailing: false,
                            },
                            spec.width,
                            spec.height,
                            0.0,
                        );
                    }
                }
                LabelItem::Image(image) => {
                    let placeholder = self.config.placeholder_px as f32;
                    let width = image.width.unwrap_or(placeholder);
                    let height = image.height.unwrap_or(placeholder);
                    if image.width.is_none() || image.height.is_none() {
                        log::debug!("image '{}' has no size yet; using placeholder", image.src);
                    }
                    if let Some(line) = lines.last_mut() {
                        line.push(
                            Piece::Image {
                                image,
                                width,
                                height,
                            },
                            width,
                            height + image.baseline_shift,
                            -image.baseline_shift,
                        );
                    }
                }
            }
        }
        lines
    }

    fn place_trailing_marks<'a>(&self, marks: &'a [MarkSpec], lines: &mut [Line<'a>]) {
        if marks.is_empty() {
            return;
        }
        let gap = self.config.mark_gap_px as f32;
        let leading = match self.config.anchor {
            MarkAnchor::Trailing => false,
            MarkAnchor::Leading => true,
            MarkAnchor::Nearest { reference_x } => {
                let left = self
                    .config
                    .origin_x
                    .saturating_add(self.config.padding_px) as f32;
                let right = left + lines.last().map_or(0.0, |line| line.width);
                let reference = reference_x as f32;
                (reference - left).abs() < (reference - right).abs()
            }
        };

        if leading {
            let Some(first) = lines.first_mut() else {
                return;
            };
            let total: f32 = marks.iter().map(|m| m.width + gap).sum();
            first.shift_right(total);
            let mut x = 0.0;
            for spec in marks {
                first.pieces.push((
                    x,
                    Piece::Mark {
                        spec,
                        trailing: true,
                    },
                ));
                first.grow(spec.height, 0.0);
                x += spec.width + gap;
            }
        } else {
            let Some(last) = lines.last_mut() else {
                return;
            };
            for spec in marks {
                last.width += gap;
                last.push(
                    Piece::Mark {
                        spec,
                        trailing: true,
                    },
                    spec.width,
                    spec.height,
                    0.0,
                );
            }
        }
    }

    fn emit_piece(&self, out: &mut Vec<DrawCommand>, x: f32, baseline: f32, piece: &Piece<'_>) {
        match *piece {
            Piece::Text { text, style, width } => {
                let baseline_y = (baseline - style.baseline_shift).round() as i32;
                let x = x.round() as i32;
                out.push(DrawCommand::Text(TextCommand {
                    x,
                    baseline_y,
                    text: text.to_string(),
                    style: ResolvedTextStyle::from(style),
                }));
                let thickness = (style.size_px / 14.0).round().max(1.0) as u32;
                let color = style.color.map(Rgba::from);
                let width = width.round().max(0.0) as u32;
                if style.underline {
                    out.push(DrawCommand::Decoration(DecorationCommand {
                        kind: DecorationKind::Underline,
                        x,
                        y: baseline_y
                            .saturating_add((style.size_px * 0.1).round().max(1.0) as i32),
                        width,
                        thickness,
                        color,
                    }));
                }
                if style.strikethrough {
                    out.push(DrawCommand::Decoration(DecorationCommand {
                        kind: DecorationKind::Strikethrough,
                        x,
                        y: baseline_y.saturating_sub((style.size_px * 0.3).round() as i32),
                        width,
                        thickness,
                        color,
                    }));
                }
            }
            Piece::Mark { spec, trailing } => {
                out.push(DrawCommand::Mark(MarkCommand {
                    glyph: MarkGlyph::from(spec.shape),
                    x: x.round() as i32,
                    y: (baseline - spec.height).round() as i32,
                    width: spec.width.round().max(0.0) as u32,
                    height: spec.height.round().max(0.0) as u32,
                    fill: spec.fill.map(Rgba::from),
                    stroke: spec.stroke.map(Rgba::from),
                    stroke_width: spec.stroke_width.round().max(0.0) as u32,
                    trailing,
                }));
            }
            Piece::Image {
                image,
                width,
                height,
            } => {
                out.push(DrawCommand::Image(ImageCommand {
                    src: image.src.clone(),
                    alt: image.alt.clone(),
                    x: x.round() as i32,
                    y: (baseline - image.baseline_shift - height).round() as i32,
                    width: width.round().max(0.0) as u32,
                    height: height.round().max(0.0) as u32,
                    pending: matches!(image.state, ImageState::Pending),
                }));
            }
        }
    }
}
