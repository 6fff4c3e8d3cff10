//! Style-stack interpreter: markup string in, ordered styled items out.
//!
//! The walk follows the scanner's events left to right. Text between two
//! tags becomes a run styled by the state *before* the second tag applies;
//! each tag then mutates the [`StyleState`](crate::style) (toggles, pushes,
//! pops, script shifts) or emits a mark, image or line break.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use rand::Rng;

use crate::attributes::AttributeMap;
use crate::color::{Color, ColorSpec};
use crate::images::{
    ImageCache, ImageEntry, ImageInfo, ImageRequest, ImageState, InlineImage, NoImageCache,
};
use crate::marks::{MarkRequest, MarkSpec, ShapeFactory, StandardShapes};
use crate::scanner::{scan_events, EventKind, MarkupEvent};
use crate::style::{DefaultStyle, FontCatalog, StyleState, TextStyle};

/// Where `<mark>` glyphs are emitted. Images stay inline in both modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarkPlacement {
    /// In document order among the runs.
    #[default]
    Inline,
    /// Collected at the trailing edge, in reverse document order.
    Trailing,
}

/// Interpreter options.
#[derive(Clone, Debug, PartialEq)]
pub struct InterpretOptions {
    /// Style unmarked text starts from.
    pub default_style: DefaultStyle,
    /// Families `<font>` may switch to.
    pub fonts: FontCatalog,
    /// Treat input without a leading `<html>` as plain text.
    pub require_html_tag: bool,
    /// Mark emission mode.
    pub mark_placement: MarkPlacement,
    /// Default mark edge length as a fraction of the current font size.
    pub mark_scale: f32,
}

impl Default for InterpretOptions {
    fn default() -> Self {
        Self {
            default_style: DefaultStyle::default(),
            fonts: FontCatalog::permissive(),
            require_html_tag: false,
            mark_placement: MarkPlacement::Inline,
            mark_scale: 0.7,
        }
    }
}

impl InterpretOptions {
    pub fn with_default_style(mut self, style: DefaultStyle) -> Self {
        self.default_style = style;
        self
    }

    pub fn with_fonts(mut self, fonts: FontCatalog) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_require_html_tag(mut self, require: bool) -> Self {
        self.require_html_tag = require;
        self
    }

    pub fn with_mark_placement(mut self, placement: MarkPlacement) -> Self {
        self.mark_placement = placement;
        self
    }

    pub fn with_mark_scale(mut self, scale: f32) -> Self {
        self.mark_scale = scale;
        self
    }
}

/// Text with its resolved style.
#[derive(Clone, Debug, PartialEq)]
pub struct StyledRun {
    pub text: String,
    pub style: TextStyle,
}

/// One output item.
#[derive(Clone, Debug, PartialEq)]
pub enum LabelItem {
    /// Styled text run.
    Run(StyledRun),
    /// Inline mark glyph.
    Mark(MarkSpec),
    /// Inline image or its placeholder.
    Image(InlineImage),
}

/// Interpreter output for one markup string.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelContent {
    items: Vec<LabelItem>,
    background: Option<Color>,
    trailing_marks: Vec<MarkSpec>,
    image_requests: Vec<ImageRequest>,
}

impl LabelContent {
    /// Build from pre-collected items.
    pub fn from_items(items: Vec<LabelItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Set the document background.
    pub fn with_background(mut self, background: Option<Color>) -> Self {
        self.background = background;
        self
    }

    /// Set trailing marks, already in emission order.
    pub fn with_trailing_marks(mut self, marks: Vec<MarkSpec>) -> Self {
        self.trailing_marks = marks;
        self
    }

    /// Ordered items excluding trailing marks.
    pub fn iter(&self) -> impl Iterator<Item = &LabelItem> {
        self.items.iter()
    }

    /// Items as a slice.
    pub fn items(&self) -> &[LabelItem] {
        &self.items
    }

    /// Text runs only.
    pub fn runs(&self) -> impl Iterator<Item = &StyledRun> {
        self.items.iter().filter_map(|item| match item {
            LabelItem::Run(run) => Some(run),
            _ => None,
        })
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs().map(|run| run.text.as_str()).collect()
    }

    /// Document background from the last `<bg>`.
    pub fn background(&self) -> Option<Color> {
        self.background
    }

    /// Marks deferred to the trailing edge, in emission order.
    pub fn trailing_marks(&self) -> &[MarkSpec] {
        &self.trailing_marks
    }

    /// Cache misses the caller should fetch.
    pub fn image_requests(&self) -> &[ImageRequest] {
        &self.image_requests
    }
}

/// Markup interpreter bound to a set of options.
#[derive(Clone, Debug, Default)]
pub struct MarkupInterpreter {
    options: InterpretOptions,
}

impl MarkupInterpreter {
    pub fn new(options: InterpretOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &InterpretOptions {
        &self.options
    }

    /// Interpret with no image cache, the standard shapes, and a thread rng.
    pub fn interpret(&self, markup: &str) -> LabelContent {
        self.interpret_with(
            markup,
            &mut NoImageCache,
            &StandardShapes,
            &mut rand::thread_rng(),
        )
    }

    /// Interpret against a caller-owned image cache.
    pub fn interpret_with_cache<C: ImageCache + ?Sized>(
        &self,
        markup: &str,
        cache: &mut C,
    ) -> LabelContent {
        self.interpret_with(markup, cache, &StandardShapes, &mut rand::thread_rng())
    }

    /// Interpret with every collaborator supplied explicitly.
    pub fn interpret_with<C, S, R>(
        &self,
        markup: &str,
        cache: &mut C,
        shapes: &S,
        rng: &mut R,
    ) -> LabelContent
    where
        C: ImageCache + ?Sized,
        S: ShapeFactory + ?Sized,
        R: Rng,
    {
        let defaults = &self.options.default_style;
        let mut walk = Walk {
            options: &self.options,
            markup,
            state: StyleState::new(defaults),
            content: LabelContent::default(),
            cache,
            shapes,
            rng,
        };

        if self.options.require_html_tag && !markup.starts_with("<html>") {
            if !markup.is_empty() {
                walk.content.items.push(LabelItem::Run(StyledRun {
                    text: markup.to_string(),
                    style: defaults.text_style(),
                }));
            }
            return walk.finish();
        }

        let mut segment_start = 0usize;
        for event in scan_events(markup) {
            if event.position > segment_start {
                walk.emit_text(segment_start, event.position);
            }
            segment_start = event.segment_end;
            walk.apply(&event);
        }
        if segment_start < markup.len() {
            walk.emit_text(segment_start, markup.len());
        }
        walk.finish()
    }
}

struct Walk<'a, C: ?Sized, S: ?Sized, R> {
    options: &'a InterpretOptions,
    markup: &'a str,
    state: StyleState,
    content: LabelContent,
    cache: &'a mut C,
    shapes: &'a S,
    rng: &'a mut R,
}

impl<C, S, R> Walk<'_, C, S, R>
where
    C: ImageCache + ?Sized,
    S: ShapeFactory + ?Sized,
    R: Rng,
{
    fn emit_text(&mut self, start: usize, end: usize) {
        let Some(text) = self.markup.get(start..end) else {
            return;
        };
        if text.is_empty() {
            return;
        }
        self.content.items.push(LabelItem::Run(StyledRun {
            text: text.to_string(),
            style: self.state.snapshot(),
        }));
    }

    fn apply(&mut self, event: &MarkupEvent) {
        let st = &mut self.state;
        match event.kind {
            EventKind::HtmlStart | EventKind::HtmlEnd => {}
            EventKind::BoldStart => st.toggles.bold = true,
            EventKind::BoldEnd => st.toggles.bold = false,
            EventKind::ItalicStart => st.toggles.italic = true,
            EventKind::ItalicEnd => st.toggles.italic = false,
            EventKind::StrikeStart => st.toggles.strike = true,
            EventKind::StrikeEnd => st.toggles.strike = false,
            EventKind::UnderlineStart => st.toggles.underline = true,
            EventKind::UnderlineEnd => st.toggles.underline = false,
            EventKind::SuperscriptStart => st.begin_superscript(),
            EventKind::SuperscriptEnd => st.end_superscript(),
            EventKind::SubscriptStart => st.begin_subscript(),
            EventKind::SubscriptEnd => st.end_subscript(),
            EventKind::FontFamilyStart => {
                let family = self.resolve_family(event.argument());
                self.state.push_family(&family);
            }
            EventKind::FontFamilyEnd => st.pop_family(),
            EventKind::FontSizeStart => {
                let size = event.argument().and_then(parse_size);
                if size.is_none() {
                    log::debug!(
                        "ignoring non-numeric size {:?} at offset {}",
                        event.argument,
                        event.position
                    );
                }
                st.push_size(size);
            }
            EventKind::FontSizeEnd => st.pop_size(),
            EventKind::ColorStart => {
                let color = self.resolve_color(event);
                self.state.push_color(color);
            }
            EventKind::ColorEnd => st.pop_color(),
            EventKind::Background => {
                if let Some(color) = self.resolve_color(event) {
                    self.content.background = Some(color);
                }
            }
            EventKind::Mark => self.apply_mark(event),
            EventKind::Image => self.apply_image(event),
            EventKind::LineBreak => {
                self.content.items.push(LabelItem::Run(StyledRun {
                    text: "\n".to_string(),
                    style: self.state.snapshot(),
                }));
                self.state.reset_baseline();
            }
        }
    }

    fn resolve_family(&self, requested: Option<&str>) -> String {
        let default_family = &self.options.default_style.font.family;
        let Some(requested) = requested.map(str::trim).filter(|f| !f.is_empty()) else {
            return default_family.clone();
        };
        if self.options.fonts.contains(requested) {
            requested.to_string()
        } else {
            log::debug!(
                "font family '{}' unavailable; falling back to '{}'",
                requested,
                default_family
            );
            default_family.clone()
        }
    }

    fn resolve_color(&mut self, event: &MarkupEvent) -> Option<Color> {
        let raw = event.argument()?;
        match ColorSpec::parse(raw) {
            Some(spec) => Some(spec.resolve(&mut *self.rng)),
            None => {
                log::debug!("ignoring invalid color '{}' at offset {}", raw, event.position);
                None
            }
        }
    }

    fn apply_mark(&mut self, event: &MarkupEvent) {
        let attributes = AttributeMap::parse(event.argument().unwrap_or_default());
        let request = MarkRequest {
            attributes: &attributes,
            default_size_px: self.state.size_px() * self.options.mark_scale,
            default_fill: self.state.color(),
        };
        let Some(spec) = self.shapes.build(&request) else {
            return;
        };
        match self.options.mark_placement {
            MarkPlacement::Inline => self.content.items.push(LabelItem::Mark(spec)),
            MarkPlacement::Trailing => self.content.trailing_marks.push(spec),
        }
    }

    fn apply_image(&mut self, event: &MarkupEvent) {
        let attributes = AttributeMap::parse(event.argument().unwrap_or_default());
        let Some(src) = attributes.get("src").map(str::trim).filter(|s| !s.is_empty()) else {
            log::debug!("ignoring <img> without src at offset {}", event.position);
            return;
        };

        let state = match self.cache.get(src) {
            Some(ImageEntry::Ready(info)) => ImageState::Ready(info),
            Some(ImageEntry::Pending) => ImageState::Pending,
            None => {
                self.cache.insert(src, ImageEntry::Pending);
                if !self.content.image_requests.iter().any(|r| r.src == src) {
                    self.content.image_requests.push(ImageRequest {
                        src: src.to_string(),
                        position: event.position,
                    });
                }
                ImageState::Pending
            }
        };

        let intrinsic = match state {
            ImageState::Ready(info) => Some(info),
            ImageState::Pending => None,
        };
        let (width, height) = display_size(
            attributes.get_f32("width").filter(|v| *v > 0.0),
            attributes.get_f32("height").filter(|v| *v > 0.0),
            intrinsic,
        );
        let size = self.state.size_px();
        let baseline_shift = match height {
            Some(h) => self.state.baseline_shift() - (h * 0.5 - size),
            None => self.state.baseline_shift(),
        };
        self.content.items.push(LabelItem::Image(InlineImage {
            src: src.to_string(),
            alt: attributes.get("alt").unwrap_or_default().to_string(),
            width,
            height,
            baseline_shift,
            state,
        }));
    }

    fn finish(mut self) -> LabelContent {
        self.content.trailing_marks.reverse();
        if self.content.items.is_empty() && self.content.trailing_marks.is_empty() {
            self.content.items.push(LabelItem::Run(StyledRun {
                text: " ".to_string(),
                style: self.options.default_style.text_style(),
            }));
        }
        self.content
    }
}

fn parse_size(raw: &str) -> Option<f32> {
    let value: f32 = raw.trim().trim_end_matches("px").trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

// Missing dimensions follow the intrinsic aspect ratio when it is known.
fn display_size(
    width: Option<f32>,
    height: Option<f32>,
    intrinsic: Option<ImageInfo>,
) -> (Option<f32>, Option<f32>) {
    match (width, height, intrinsic) {
        (Some(w), Some(h), _) => (Some(w), Some(h)),
        (Some(w), None, Some(info)) if info.width > 0.0 => {
            (Some(w), Some(w * info.height / info.width))
        }
        (None, Some(h), Some(info)) if info.height > 0.0 => {
            (Some(h * info.width / info.height), Some(h))
        }
        (None, None, Some(info)) => (Some(info.width), Some(info.height)),
        (w, h, _) => (w, h),
    }
}
