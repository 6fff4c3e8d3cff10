//! `key="value"` attribute blobs carried by `<mark ...>` and `<img ...>` tags.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::color::Color;

/// Parsed tag attributes. Later duplicates overwrite earlier ones.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: BTreeMap<String, String>,
}

impl AttributeMap {
    /// Parse the raw text between a tag keyword and its closing `>`.
    pub fn parse(raw: &str) -> Self {
        let normalized = normalize_attribute_text(raw);
        let mut entries = BTreeMap::new();
        for token in split_unquoted_spaces(&normalized) {
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            entries.insert(key.to_string(), clean_value(value).to_string());
        }
        Self { entries }
    }

    /// Raw string value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Numeric value; `None` when missing or not a finite number.
    pub fn get_f32(&self, key: &str) -> Option<f32> {
        let value: f32 = self.get(key)?.trim().trim_end_matches("px").parse().ok()?;
        value.is_finite().then_some(value)
    }

    /// Color value; `None` when missing or unparseable.
    pub fn get_color(&self, key: &str) -> Option<Color> {
        Color::try_parse(self.get(key)?)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no attribute was parsed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Collapse whitespace runs and remove whitespace around `=` and around the
/// quote that opens a value, so `key = "v"` and `key= "v"` become `key="v"`.
fn normalize_attribute_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    let mut in_quotes = false;
    for ch in raw.trim().chars() {
        if in_quotes {
            out.push(ch);
            if ch == '"' {
                in_quotes = false;
            }
            continue;
        }
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if ch == '=' {
            // A space after a closed value still separates tokens.
            if pending_space && out.ends_with('"') {
                out.push(' ');
            }
            pending_space = false;
            out.push('=');
            continue;
        }
        if pending_space && !out.ends_with('=') && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        if ch == '"' {
            in_quotes = true;
        }
        out.push(ch);
    }
    out
}

fn split_unquoted_spaces(text: &str) -> Vec<&str> {
    let mut tokens = Vec::with_capacity(4);
    let mut start = 0usize;
    let mut in_quotes = false;
    for (idx, ch) in text.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ' ' if !in_quotes => {
                if idx > start {
                    tokens.push(&text[start..idx]);
                }
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

fn clean_value(raw: &str) -> &str {
    let mut value = raw.trim();
    if let Some(stripped) = value.strip_suffix("<br") {
        value = stripped.trim_end();
    }
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value = &value[1..value.len() - 1];
    } else if let Some(stripped) = value.strip_prefix('"') {
        value = stripped;
    }
    value
}
