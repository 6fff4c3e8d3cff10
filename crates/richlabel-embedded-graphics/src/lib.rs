//! embedded-graphics renderer for `richlabel-render` labels.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

use embedded_graphics::{
    mono_font::{
        ascii::{
            FONT_10X20, FONT_5X8, FONT_6X10, FONT_6X13_BOLD, FONT_6X13_ITALIC, FONT_7X13,
            FONT_7X13_BOLD, FONT_7X13_ITALIC, FONT_8X13_ITALIC, FONT_9X15, FONT_9X15_BOLD,
            FONT_9X18, FONT_9X18_BOLD,
        },
        MonoFont, MonoTextStyle,
    },
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{
        Circle, Ellipse, Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, Triangle,
    },
    text::{Baseline, Text},
};
use richlabel::TextStyle;
use richlabel_render::{
    DecorationCommand, DrawCommand, ImageCommand, MarkCommand, MarkGlyph, RectCommand,
    RenderedLabel, ResolvedTextStyle, Rgba, TextCommand, TextMeasurer,
};
use std::borrow::Cow;

/// Backend-local font identifier: size bucket in the high bits, variant in
/// the low two.
pub type FontId = u8;

/// Why style-to-font mapping had to fallback to a different face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontFallbackReason {
    UnknownFamily,
    UnsupportedWeightItalic,
}

/// Resolved font selection for a text style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSelection {
    pub font_id: FontId,
    pub fallback_reason: Option<FontFallbackReason>,
}

/// Mono-font backend covering the label size range with five buckets.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonoFontBackend;

impl MonoFontBackend {
    const SIZE_TINY: FontId = 0;
    const SIZE_SMALL: FontId = 1;
    const SIZE_MEDIUM: FontId = 2;
    const SIZE_LARGE: FontId = 3;
    const SIZE_XL: FontId = 4;

    const VARIANT_REGULAR: FontId = 0;
    const VARIANT_ITALIC: FontId = 1;
    const VARIANT_BOLD: FontId = 2;
    const VARIANT_BOLD_ITALIC: FontId = 3;

    fn encode_font_id(size_bucket: FontId, variant: FontId) -> FontId {
        (size_bucket << 2) | (variant & 0x03)
    }

    fn decode_font_id(font_id: FontId) -> (FontId, FontId) {
        (font_id >> 2, font_id & 0x03)
    }

    fn size_bucket_for(size_px: f32) -> FontId {
        if size_px >= 20.0 {
            Self::SIZE_XL
        } else if size_px >= 16.0 {
            Self::SIZE_LARGE
        } else if size_px >= 13.0 {
            Self::SIZE_MEDIUM
        } else if size_px >= 9.0 {
            Self::SIZE_SMALL
        } else {
            Self::SIZE_TINY
        }
    }

    fn variant_for(weight: u16, italic: bool) -> FontId {
        let bold = weight >= richlabel::WEIGHT_BOLD;
        match (bold, italic) {
            (true, true) => Self::VARIANT_BOLD_ITALIC,
            (true, false) => Self::VARIANT_BOLD,
            (false, true) => Self::VARIANT_ITALIC,
            (false, false) => Self::VARIANT_REGULAR,
        }
    }

    /// Face for `font_id`, with the reason when the exact variant is missing.
    pub fn font_for(font_id: FontId) -> (&'static MonoFont<'static>, Option<FontFallbackReason>) {
        let fallback = Some(FontFallbackReason::UnsupportedWeightItalic);
        let (size_bucket, variant) = Self::decode_font_id(font_id);
        match (size_bucket, variant) {
            (Self::SIZE_TINY, Self::VARIANT_REGULAR) => (&FONT_5X8, None),
            (Self::SIZE_TINY, _) => (&FONT_5X8, fallback),
            (Self::SIZE_SMALL, Self::VARIANT_REGULAR) => (&FONT_6X10, None),
            (Self::SIZE_SMALL, Self::VARIANT_ITALIC) => (&FONT_6X13_ITALIC, None),
            (Self::SIZE_SMALL, Self::VARIANT_BOLD) => (&FONT_6X13_BOLD, None),
            (Self::SIZE_SMALL, _) => (&FONT_6X13_BOLD, fallback),
            (Self::SIZE_MEDIUM, Self::VARIANT_REGULAR) => (&FONT_7X13, None),
            (Self::SIZE_MEDIUM, Self::VARIANT_ITALIC) => (&FONT_7X13_ITALIC, None),
            (Self::SIZE_MEDIUM, Self::VARIANT_BOLD) => (&FONT_7X13_BOLD, None),
            (Self::SIZE_MEDIUM, _) => (&FONT_7X13_BOLD, fallback),
            (Self::SIZE_LARGE, Self::VARIANT_REGULAR) => (&FONT_9X15, None),
            (Self::SIZE_LARGE, Self::VARIANT_ITALIC) => (&FONT_8X13_ITALIC, fallback),
            (Self::SIZE_LARGE, Self::VARIANT_BOLD) => (&FONT_9X15_BOLD, None),
            (Self::SIZE_LARGE, _) => (&FONT_9X15_BOLD, fallback),
            (Self::SIZE_XL, Self::VARIANT_REGULAR) => (&FONT_10X20, None),
            (Self::SIZE_XL, Self::VARIANT_ITALIC) => (&FONT_9X18, fallback),
            (Self::SIZE_XL, Self::VARIANT_BOLD) => (&FONT_9X18_BOLD, None),
            _ => (&FONT_9X18_BOLD, fallback),
        }
    }

    fn family_supported(family: &str) -> bool {
        matches!(
            family.trim().to_ascii_lowercase().as_str(),
            "monospace" | "mono" | "fixed" | "system" | "serif" | "sans" | "sans-serif"
        )
    }

    /// Map style attributes to a face.
    pub fn resolve(&self, family: &str, weight: u16, italic: bool, size_px: f32) -> FontSelection {
        let font_id =
            Self::encode_font_id(Self::size_bucket_for(size_px), Self::variant_for(weight, italic));
        let (_, style_fallback) = Self::font_for(font_id);
        let fallback_reason = style_fallback.or_else(|| {
            (!Self::family_supported(family)).then_some(FontFallbackReason::UnknownFamily)
        });
        FontSelection {
            font_id,
            fallback_reason,
        }
    }

    /// Resolve a render command style.
    pub fn resolve_style(&self, style: &ResolvedTextStyle) -> FontSelection {
        self.resolve(&style.family, style.weight, style.italic, style.size_px)
    }
}

fn normalize_text_for_mono(text: &str) -> Cow<'_, str> {
    if text.is_ascii() {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{00A0}' => out.push(' '),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            c if c.is_ascii() => out.push(c),
            _ => out.push('?'),
        }
    }
    Cow::Owned(out)
}

/// `TextMeasurer` that matches what [`EgRenderer`] will draw.
#[derive(Clone, Copy, Debug, Default)]
pub struct EgTextMeasurer {
    backend: MonoFontBackend,
}

impl EgTextMeasurer {
    pub fn new() -> Self {
        Self::default()
    }

    fn font(&self, style: &TextStyle) -> &'static MonoFont<'static> {
        let selection = self
            .backend
            .resolve(&style.family, style.weight, style.italic, style.size_px);
        MonoFontBackend::font_for(selection.font_id).0
    }
}

impl TextMeasurer for EgTextMeasurer {
    fn measure_text_px(&self, text: &str, style: &TextStyle) -> f32 {
        let font = self.font(style);
        let advance = font.character_size.width + font.character_spacing;
        let glyphs = normalize_text_for_mono(text).chars().count() as u32;
        (glyphs * advance) as f32
    }

    fn ascent_px(&self, style: &TextStyle) -> f32 {
        self.font(style).baseline as f32
    }

    fn line_height_px(&self, style: &TextStyle) -> f32 {
        self.font(style).character_size.height as f32
    }
}

/// Renderer configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EgRenderConfig {
    /// Clear display before drawing.
    pub clear_first: bool,
    /// Clear color.
    pub clear_color: Rgb888,
    /// Color for text and decorations with no explicit color.
    pub foreground: Rgb888,
    /// Outline color for image boxes.
    pub placeholder: Rgb888,
}

impl Default for EgRenderConfig {
    fn default() -> Self {
        Self {
            clear_first: false,
            clear_color: Rgb888::WHITE,
            foreground: Rgb888::BLACK,
            placeholder: Rgb888::new(0x80, 0x80, 0x80),
        }
    }
}

/// Counters collected while rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EgRenderDiagnostics {
    pub text_runs: usize,
    pub unknown_family_fallbacks: usize,
    pub weight_italic_fallbacks: usize,
    pub pending_images: usize,
}

/// Draw-command executor for `Rgb888` embedded-graphics targets.
#[derive(Clone, Debug, Default)]
pub struct EgRenderer {
    cfg: EgRenderConfig,
    backend: MonoFontBackend,
    diagnostics: EgRenderDiagnostics,
}

impl EgRenderer {
    pub fn new(cfg: EgRenderConfig) -> Self {
        Self {
            cfg,
            backend: MonoFontBackend,
            diagnostics: EgRenderDiagnostics::default(),
        }
    }

    pub fn config(&self) -> &EgRenderConfig {
        &self.cfg
    }

    /// Counters accumulated since construction or the last reset.
    pub fn diagnostics(&self) -> EgRenderDiagnostics {
        self.diagnostics
    }

    pub fn reset_diagnostics(&mut self) {
        self.diagnostics = EgRenderDiagnostics::default();
    }

    /// Draw every command of `label` in order.
    pub fn render<D>(&mut self, label: &RenderedLabel, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        if self.cfg.clear_first {
            display.clear(self.cfg.clear_color)?;
        }
        for cmd in &label.commands {
            self.draw_command(display, cmd)?;
        }
        Ok(())
    }

    fn draw_command<D>(&mut self, display: &mut D, cmd: &DrawCommand) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        match cmd {
            DrawCommand::Background(rect) => self.draw_background(display, rect),
            DrawCommand::Text(text) => self.draw_text(display, text),
            DrawCommand::Decoration(deco) => self.draw_decoration(display, deco),
            DrawCommand::Mark(mark) => draw_mark(display, mark),
            DrawCommand::Image(image) => self.draw_image(display, image),
        }
    }

    fn draw_background<D>(&self, display: &mut D, rect: &RectCommand) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let Some(color) = opaque(Some(rect.color)) else {
            return Ok(());
        };
        let bounds = display.bounding_box();
        let Some(area) = clip_to(&bounds, rect.x, rect.y, rect.width, rect.height) else {
            return Ok(());
        };
        area.into_styled(PrimitiveStyle::with_fill(color))
            .draw(display)
    }

    fn draw_text<D>(&mut self, display: &mut D, cmd: &TextCommand) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let selection = self.backend.resolve_style(&cmd.style);
        self.diagnostics.text_runs += 1;
        match selection.fallback_reason {
            Some(FontFallbackReason::UnknownFamily) => {
                self.diagnostics.unknown_family_fallbacks += 1;
            }
            Some(FontFallbackReason::UnsupportedWeightItalic) => {
                self.diagnostics.weight_italic_fallbacks += 1;
            }
            None => {}
        }
        let color = match cmd.style.color {
            Some(color) if color.a == 0 => return Ok(()),
            Some(color) => rgb(color),
            None => self.cfg.foreground,
        };
        let (font, _) = MonoFontBackend::font_for(selection.font_id);
        let normalized = normalize_text_for_mono(&cmd.text);
        let glyphs = u32::try_from(normalized.chars().count()).unwrap_or(u32::MAX);
        let advance = font.character_size.width + font.character_spacing;
        let glyph_height = font.character_size.height;
        let visible = clip_to(
            &display.bounding_box(),
            cmd.x,
            cmd.baseline_y
                .saturating_sub(i32::try_from(glyph_height).unwrap_or(i32::MAX)),
            glyphs.saturating_mul(advance),
            glyph_height.saturating_mul(2),
        );
        if visible.is_none() {
            return Ok(());
        }
        Text::with_baseline(
            normalized.as_ref(),
            Point::new(cmd.x, cmd.baseline_y),
            MonoTextStyle::new(font, color),
            Baseline::Alphabetic,
        )
        .draw(display)?;
        Ok(())
    }

    fn draw_decoration<D>(&self, display: &mut D, cmd: &DecorationCommand) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let color = match cmd.color {
            Some(color) if color.a == 0 => return Ok(()),
            Some(color) => rgb(color),
            None => self.cfg.foreground,
        };
        let bounds = display.bounding_box();
        let Some(area) = clip_to(&bounds, cmd.x, cmd.y, cmd.width, cmd.thickness.max(1)) else {
            return Ok(());
        };
        area.into_styled(PrimitiveStyle::with_fill(color))
            .draw(display)
    }

    fn draw_image<D>(&mut self, display: &mut D, cmd: &ImageCommand) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        if cmd.pending {
            self.diagnostics.pending_images += 1;
        }
        if !shape_fits(&display.bounding_box(), cmd.x, cmd.y, cmd.width, cmd.height) {
            log::debug!(
                "skipping {}x{} image at ({}, {})",
                cmd.width,
                cmd.height,
                cmd.x,
                cmd.y
            );
            return Ok(());
        }
        let top_left = Point::new(cmd.x, cmd.y);
        Rectangle::new(top_left, Size::new(cmd.width, cmd.height))
            .into_styled(PrimitiveStyle::with_stroke(self.cfg.placeholder, 1))
            .draw(display)?;
        if cmd.pending {
            // Extents are bounded by shape_fits, so the casts are exact.
            if cmd.width > 1 && cmd.height > 1 {
                let bottom_right =
                    top_left + Point::new(cmd.width as i32 - 1, cmd.height as i32 - 1);
                Line::new(top_left, bottom_right)
                    .into_styled(PrimitiveStyle::with_stroke(self.cfg.placeholder, 1))
                    .draw(display)?;
            }
        }
        Ok(())
    }
}

fn rgb(color: Rgba) -> Rgb888 {
    Rgb888::new(color.r, color.g, color.b)
}

fn opaque(color: Option<Rgba>) -> Option<Rgb888> {
    color.filter(|c| c.a > 0).map(rgb)
}

/// Largest mark or image edge the renderer draws.
const MAX_SHAPE_EXTENT_PX: u32 = 4096;

/// Part of the `width`x`height` box at `(x, y)` that lies inside `area`.
///
/// Computed in `i64` so boxes near the `i32` limits cannot overflow.
fn clip_to(area: &Rectangle, x: i32, y: i32, width: u32, height: u32) -> Option<Rectangle> {
    let area_right = i64::from(area.top_left.x) + i64::from(area.size.width);
    let area_bottom = i64::from(area.top_left.y) + i64::from(area.size.height);
    let left = i64::from(x).max(i64::from(area.top_left.x));
    let top = i64::from(y).max(i64::from(area.top_left.y));
    let right = (i64::from(x) + i64::from(width)).min(area_right);
    let bottom = (i64::from(y) + i64::from(height)).min(area_bottom);
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rectangle::new(
        Point::new(i32::try_from(left).ok()?, i32::try_from(top).ok()?),
        Size::new(
            u32::try_from(right - left).ok()?,
            u32::try_from(bottom - top).ok()?,
        ),
    ))
}

/// Whether a shape is small enough to draw and touches `area`.
fn shape_fits(area: &Rectangle, x: i32, y: i32, width: u32, height: u32) -> bool {
    width <= MAX_SHAPE_EXTENT_PX
        && height <= MAX_SHAPE_EXTENT_PX
        && clip_to(area, x, y, width.max(1), height.max(1)).is_some()
}

fn draw_mark<D>(display: &mut D, cmd: &MarkCommand) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let fill = opaque(cmd.fill);
    let stroke = opaque(cmd.stroke).filter(|_| cmd.stroke_width > 0);
    if fill.is_none() && stroke.is_none() {
        return Ok(());
    }
    let mut builder = PrimitiveStyleBuilder::new();
    if let Some(fill) = fill {
        builder = builder.fill_color(fill);
    }
    if let Some(stroke) = stroke {
        builder = builder.stroke_color(stroke).stroke_width(cmd.stroke_width);
    }
    let style = builder.build();
    if !shape_fits(&display.bounding_box(), cmd.x, cmd.y, cmd.width, cmd.height) {
        log::debug!(
            "skipping {:?} mark {}x{} at ({}, {})",
            cmd.glyph,
            cmd.width,
            cmd.height,
            cmd.x,
            cmd.y
        );
        return Ok(());
    }

    let (w, h) = (cmd.width, cmd.height);
    let (wi, hi) = (w as i32, h as i32);
    let top_left = Point::new(cmd.x, cmd.y);
    let right = cmd.x.saturating_add(wi - 1);
    let bottom = cmd.y.saturating_add(hi - 1);
    let mid_x = cmd.x.saturating_add(wi / 2);
    let mid_y = cmd.y.saturating_add(hi / 2);
    match cmd.glyph {
        MarkGlyph::Circle => Circle::new(top_left, w.min(h))
            .into_styled(style)
            .draw(display),
        MarkGlyph::Ellipse => Ellipse::new(top_left, Size::new(w, h))
            .into_styled(style)
            .draw(display),
        MarkGlyph::Square => Rectangle::new(top_left, Size::new(w.min(h), w.min(h)))
            .into_styled(style)
            .draw(display),
        MarkGlyph::Rectangle => Rectangle::new(top_left, Size::new(w, h))
            .into_styled(style)
            .draw(display),
        MarkGlyph::Triangle => Triangle::new(
            Point::new(mid_x, cmd.y),
            Point::new(right, bottom),
            Point::new(cmd.x, bottom),
        )
        .into_styled(style)
        .draw(display),
        MarkGlyph::Diamond => {
            Triangle::new(
                Point::new(mid_x, cmd.y),
                Point::new(right, mid_y),
                Point::new(cmd.x, mid_y),
            )
            .into_styled(style)
            .draw(display)?;
            Triangle::new(
                Point::new(cmd.x, mid_y),
                Point::new(right, mid_y),
                Point::new(mid_x, bottom),
            )
            .into_styled(style)
            .draw(display)
        }
        MarkGlyph::Line => {
            let color = stroke.or(fill).unwrap_or(Rgb888::BLACK);
            Line::new(Point::new(cmd.x, mid_y), Point::new(right, mid_y))
                .into_styled(PrimitiveStyle::with_stroke(color, h.max(1)))
                .draw(display)
        }
    }
}
