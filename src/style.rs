//! Style model: ambient defaults, the interpreter's mutable state, and the
//! resolved per-run snapshot.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::color::Color;

/// Numeric weight used for regular text.
pub const WEIGHT_NORMAL: u16 = 400;
/// Numeric weight forced by `<b>`.
pub const WEIGHT_BOLD: u16 = 700;

/// Font size factor applied by `<sup>` and `<sub>`.
pub const SCRIPT_SCALE: f32 = 0.8;
/// Baseline shift applied by `<sup>` and `<sub>`, as a fraction of font size.
pub const SCRIPT_SHIFT: f32 = 0.3;

/// Base font description.
#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    /// Family name.
    pub family: String,
    /// Intrinsic numeric weight.
    pub weight: u16,
    /// Intrinsic italic posture.
    pub italic: bool,
    /// Size in pixels.
    pub size_px: f32,
}

impl FontSpec {
    /// Regular-weight upright font.
    pub fn new(family: impl Into<String>, size_px: f32) -> Self {
        Self {
            family: family.into(),
            weight: WEIGHT_NORMAL,
            italic: false,
            size_px,
        }
    }

    /// Override intrinsic weight.
    pub fn with_weight(mut self, weight: u16) -> Self {
        self.weight = weight;
        self
    }

    /// Override intrinsic posture.
    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new("System", 13.0)
    }
}

/// Caller-supplied ambient style every label starts from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DefaultStyle {
    /// Base font.
    pub font: FontSpec,
    /// Base text color; `None` inherits from the rendering surface.
    pub color: Option<Color>,
}

impl DefaultStyle {
    /// Default style with `font` and inherited color.
    pub fn new(font: FontSpec) -> Self {
        Self { font, color: None }
    }

    /// Override base color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Resolved style of unmarked text.
    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            family: self.font.family.clone(),
            weight: self.font.weight,
            italic: self.font.italic,
            size_px: self.font.size_px,
            color: self.color,
            strikethrough: false,
            underline: false,
            baseline_shift: 0.0,
        }
    }
}

/// Families a rendering surface can actually draw.
///
/// An empty catalog accepts every family.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FontCatalog {
    families: Vec<String>,
}

impl FontCatalog {
    /// Catalog that accepts any family.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Catalog restricted to `families` (matched case-insensitively).
    pub fn with_families<I, S>(families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            families: families
                .into_iter()
                .map(|family| normalize_family(family.as_ref()))
                .filter(|family| !family.is_empty())
                .collect(),
        }
    }

    /// Whether `family` can be used.
    pub fn contains(&self, family: &str) -> bool {
        self.families.is_empty() || self.families.contains(&normalize_family(family))
    }
}

pub(crate) fn normalize_family(family: &str) -> String {
    family
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_ascii_lowercase()
}

/// Fully resolved style of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Font family.
    pub family: String,
    /// Numeric weight.
    pub weight: u16,
    /// Italic posture.
    pub italic: bool,
    /// Font size in pixels.
    pub size_px: f32,
    /// Text color; `None` inherits.
    pub color: Option<Color>,
    /// Strike-through decoration.
    pub strikethrough: bool,
    /// Underline decoration.
    pub underline: bool,
    /// Vertical offset in pixels, positive raises the run.
    pub baseline_shift: f32,
}

impl TextStyle {
    /// Whether weight is bold or heavier.
    pub fn is_bold(&self) -> bool {
        self.weight >= WEIGHT_BOLD
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Script {
    Super,
    Sub,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ScriptFrame {
    script: Script,
    delta: f32,
}

/// Inline toggles set by `<b>`, `<i>`, `<a>` and `<u>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ActiveToggles {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub underline: bool,
}

/// Mutable interpreter state.
#[derive(Clone, Debug)]
pub(crate) struct StyleState {
    base: FontSpec,
    family: String,
    size_px: f32,
    color: Option<Color>,
    baseline_shift: f32,
    pub toggles: ActiveToggles,
    family_stack: SmallVec<[String; 4]>,
    size_stack: SmallVec<[f32; 4]>,
    color_stack: SmallVec<[Option<Color>; 4]>,
    script_stack: SmallVec<[ScriptFrame; 4]>,
}

impl StyleState {
    pub fn new(defaults: &DefaultStyle) -> Self {
        Self {
            base: defaults.font.clone(),
            family: defaults.font.family.clone(),
            size_px: defaults.font.size_px,
            color: defaults.color,
            baseline_shift: 0.0,
            toggles: ActiveToggles::default(),
            family_stack: SmallVec::new(),
            size_stack: SmallVec::new(),
            color_stack: SmallVec::new(),
            script_stack: SmallVec::new(),
        }
    }

    /// Snapshot for the next run. Active toggles override the base font.
    pub fn snapshot(&self) -> TextStyle {
        TextStyle {
            family: self.family.clone(),
            weight: if self.toggles.bold {
                WEIGHT_BOLD
            } else {
                self.base.weight
            },
            italic: self.toggles.italic || self.base.italic,
            size_px: self.size_px,
            color: self.color,
            strikethrough: self.toggles.strike,
            underline: self.toggles.underline,
            baseline_shift: self.baseline_shift,
        }
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn baseline_shift(&self) -> f32 {
        self.baseline_shift
    }

    pub fn push_family(&mut self, family: &str) {
        let previous = core::mem::replace(&mut self.family, family.to_string());
        self.family_stack.push(previous);
    }

    pub fn pop_family(&mut self) {
        if let Some(previous) = self.family_stack.pop() {
            self.family = previous;
        }
    }

    pub fn push_size(&mut self, size_px: Option<f32>) {
        self.size_stack.push(self.size_px);
        if let Some(size_px) = size_px {
            self.size_px = size_px;
        }
    }

    pub fn pop_size(&mut self) {
        if let Some(previous) = self.size_stack.pop() {
            self.size_px = previous;
        }
    }

    pub fn push_color(&mut self, color: Option<Color>) {
        self.color_stack.push(self.color);
        if let Some(color) = color {
            self.color = Some(color);
        }
    }

    pub fn pop_color(&mut self) {
        if let Some(previous) = self.color_stack.pop() {
            self.color = previous;
        }
    }

    /// Shrink first, then raise by a fraction of the shrunken size.
    pub fn begin_superscript(&mut self) {
        self.size_px *= SCRIPT_SCALE;
        let delta = SCRIPT_SHIFT * self.size_px;
        self.baseline_shift += delta;
        self.script_stack.push(ScriptFrame {
            script: Script::Super,
            delta,
        });
    }

    /// Lower by a fraction of the current size first, then shrink.
    pub fn begin_subscript(&mut self) {
        let delta = -SCRIPT_SHIFT * self.size_px;
        self.baseline_shift += delta;
        self.size_px *= SCRIPT_SCALE;
        self.script_stack.push(ScriptFrame {
            script: Script::Sub,
            delta,
        });
    }

    pub fn end_superscript(&mut self) {
        self.end_script(Script::Super);
    }

    pub fn end_subscript(&mut self) {
        self.end_script(Script::Sub);
    }

    // Restores size, then undoes exactly the offset the matching start applied.
    fn end_script(&mut self, script: Script) {
        let Some(idx) = self
            .script_stack
            .iter()
            .rposition(|frame| frame.script == script)
        else {
            return;
        };
        let frame = self.script_stack.remove(idx);
        self.size_px /= SCRIPT_SCALE;
        self.baseline_shift -= frame.delta;
        if self.script_stack.is_empty() && self.baseline_shift.abs() < 1e-4 {
            self.baseline_shift = 0.0;
        }
    }

    pub fn reset_baseline(&mut self) {
        self.baseline_shift = 0.0;
        for frame in self.script_stack.iter_mut() {
            frame.delta = 0.0;
        }
    }
}
