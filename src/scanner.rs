//! Tag scanner for the label markup language.
//!
//! Scanning is a search for the next recognized tag start rather than a
//! tokenization of the whole string: the scanner only inspects positions
//! holding `<`, tries the known tag prefixes there and otherwise moves on.
//! Anything that is not a recognized tag is plain text.

extern crate alloc;

use alloc::string::{String, ToString};

/// Kind of a recognized markup tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    HtmlStart,
    HtmlEnd,
    ItalicStart,
    ItalicEnd,
    BoldStart,
    BoldEnd,
    StrikeStart,
    StrikeEnd,
    UnderlineStart,
    UnderlineEnd,
    SuperscriptStart,
    SuperscriptEnd,
    SubscriptStart,
    SubscriptEnd,
    ColorStart,
    ColorEnd,
    FontSizeStart,
    FontSizeEnd,
    FontFamilyStart,
    FontFamilyEnd,
    Background,
    Mark,
    Image,
    LineBreak,
}

/// Paired style type shared by the Start/End variants of a kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleType {
    Html,
    Italic,
    Bold,
    Strike,
    Underline,
    Superscript,
    Subscript,
    Color,
    FontSize,
    FontFamily,
    Background,
    Mark,
    Image,
    LineBreak,
}

impl EventKind {
    /// Style type with the Start/End suffix stripped.
    pub fn style_type(self) -> StyleType {
        match self {
            Self::HtmlStart | Self::HtmlEnd => StyleType::Html,
            Self::ItalicStart | Self::ItalicEnd => StyleType::Italic,
            Self::BoldStart | Self::BoldEnd => StyleType::Bold,
            Self::StrikeStart | Self::StrikeEnd => StyleType::Strike,
            Self::UnderlineStart | Self::UnderlineEnd => StyleType::Underline,
            Self::SuperscriptStart | Self::SuperscriptEnd => StyleType::Superscript,
            Self::SubscriptStart | Self::SubscriptEnd => StyleType::Subscript,
            Self::ColorStart | Self::ColorEnd => StyleType::Color,
            Self::FontSizeStart | Self::FontSizeEnd => StyleType::FontSize,
            Self::FontFamilyStart | Self::FontFamilyEnd => StyleType::FontFamily,
            Self::Background => StyleType::Background,
            Self::Mark => StyleType::Mark,
            Self::Image => StyleType::Image,
            Self::LineBreak => StyleType::LineBreak,
        }
    }

    /// Whether this kind opens a paired scope.
    pub fn is_start(self) -> bool {
        matches!(
            self,
            Self::HtmlStart
                | Self::ItalicStart
                | Self::BoldStart
                | Self::StrikeStart
                | Self::UnderlineStart
                | Self::SuperscriptStart
                | Self::SubscriptStart
                | Self::ColorStart
                | Self::FontSizeStart
                | Self::FontFamilyStart
        )
    }

    /// Whether this kind closes a paired scope.
    pub fn is_end(self) -> bool {
        matches!(
            self,
            Self::HtmlEnd
                | Self::ItalicEnd
                | Self::BoldEnd
                | Self::StrikeEnd
                | Self::UnderlineEnd
                | Self::SuperscriptEnd
                | Self::SubscriptEnd
                | Self::ColorEnd
                | Self::FontSizeEnd
                | Self::FontFamilyEnd
        )
    }
}

/// One recognized tag occurrence in the source string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkupEvent {
    /// Tag kind.
    pub kind: EventKind,
    /// Byte offset of the tag's `<`.
    pub position: usize,
    /// Byte offset where the following text segment begins.
    pub segment_end: usize,
    /// Tag payload (color, size, family, or an attribute blob).
    pub argument: Option<String>,
}

impl MarkupEvent {
    /// Event with no source span, used for implicit `<html>`/`</html>`.
    pub fn synthetic(kind: EventKind, at: usize) -> Self {
        Self {
            kind,
            position: at,
            segment_end: at,
            argument: None,
        }
    }

    /// Argument as `&str`, if present.
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }
}

struct TagSpec {
    literal: &'static str,
    kind: EventKind,
    takes_argument: bool,
}

const fn plain(literal: &'static str, kind: EventKind) -> TagSpec {
    TagSpec {
        literal,
        kind,
        takes_argument: false,
    }
}

const fn with_argument(literal: &'static str, kind: EventKind) -> TagSpec {
    TagSpec {
        literal,
        kind,
        takes_argument: true,
    }
}

// Declaration order is the match order.
const TAGS: &[TagSpec] = &[
    plain("<html>", EventKind::HtmlStart),
    plain("</html>", EventKind::HtmlEnd),
    plain("<i>", EventKind::ItalicStart),
    plain("</i>", EventKind::ItalicEnd),
    plain("<b>", EventKind::BoldStart),
    plain("</b>", EventKind::BoldEnd),
    plain("<a>", EventKind::StrikeStart),
    plain("</a>", EventKind::StrikeEnd),
    plain("<u>", EventKind::UnderlineStart),
    plain("</u>", EventKind::UnderlineEnd),
    plain("<sup>", EventKind::SuperscriptStart),
    plain("</sup>", EventKind::SuperscriptEnd),
    plain("<sub>", EventKind::SubscriptStart),
    plain("</sub>", EventKind::SubscriptEnd),
    with_argument("<c ", EventKind::ColorStart),
    plain("</c>", EventKind::ColorEnd),
    with_argument("<size ", EventKind::FontSizeStart),
    plain("</size>", EventKind::FontSizeEnd),
    with_argument("<font ", EventKind::FontFamilyStart),
    plain("</font>", EventKind::FontFamilyEnd),
    with_argument("<bg ", EventKind::Background),
    with_argument("<mark ", EventKind::Mark),
    plain("<mark>", EventKind::Mark),
    with_argument("<img ", EventKind::Image),
    plain("<br>", EventKind::LineBreak),
];

/// Try to recognize a tag starting exactly at byte offset `pos`.
///
/// Returns `None` when no known tag prefix matches (including when `pos` is
/// out of range or not on a character boundary).
pub fn scan_tag(text: &str, pos: usize) -> Option<MarkupEvent> {
    let rest = text.get(pos..)?;
    if !rest.starts_with('<') {
        return None;
    }
    let spec = TAGS.iter().find(|spec| rest.starts_with(spec.literal))?;
    let nominal_end = pos + spec.literal.len();
    if !spec.takes_argument {
        let argument = (spec.kind == EventKind::Mark).then(String::new);
        return Some(MarkupEvent {
            kind: spec.kind,
            position: pos,
            segment_end: nominal_end,
            argument,
        });
    }

    let after_keyword = &text[nominal_end..];
    match after_keyword.find('>') {
        Some(close) => Some(MarkupEvent {
            kind: spec.kind,
            position: pos,
            segment_end: nominal_end + close + 1,
            argument: Some(strip_argument(&after_keyword[..close]).to_string()),
        }),
        None => {
            log::debug!(
                "unterminated {:?} tag at offset {}; argument dropped",
                spec.kind,
                pos
            );
            Some(MarkupEvent {
                kind: spec.kind,
                position: pos,
                segment_end: nominal_end,
                argument: None,
            })
        }
    }
}

fn strip_argument(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// Iterator over the recognized tags of a markup string, in order.
///
/// Stops after yielding an explicit `</html>`.
#[derive(Clone, Debug)]
pub struct MarkupEvents<'a> {
    text: &'a str,
    pos: usize,
    done: bool,
}

/// Scan `text` from the beginning.
pub fn scan_events(text: &str) -> MarkupEvents<'_> {
    scan_events_from(text, 0)
}

/// Scan `text` starting at byte offset `pos`.
pub fn scan_events_from(text: &str, pos: usize) -> MarkupEvents<'_> {
    MarkupEvents {
        text,
        pos,
        done: false,
    }
}

impl MarkupEvents<'_> {
    /// Byte offset the next search starts from.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Iterator for MarkupEvents<'_> {
    type Item = MarkupEvent;

    fn next(&mut self) -> Option<MarkupEvent> {
        if self.done {
            return None;
        }
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() {
            let Some(offset) = bytes[self.pos..].iter().position(|&b| b == b'<') else {
                self.pos = bytes.len();
                break;
            };
            let candidate = self.pos + offset;
            match scan_tag(self.text, candidate) {
                Some(event) => {
                    self.pos = event.segment_end.max(candidate + 1);
                    if event.kind == EventKind::HtmlEnd {
                        self.done = true;
                    }
                    return Some(event);
                }
                None => self.pos = candidate + 1,
            }
        }
        self.done = true;
        None
    }
}
