//! Lossy markup stripping for clipboard, accessibility and search text.

extern crate alloc;

use alloc::string::String;
use quick_xml::escape::unescape;

/// Strip every `<...>` span and every recognized character reference, then
/// collapse whitespace runs to a single space.
///
/// An unclosed `<` drops the rest of the string. A reference is recognized
/// when quick-xml resolves it or it is `&nbsp;`; one that resolves to
/// whitespace leaves a space behind, any other is removed outright. Unknown
/// references and bare `&` stay as written. Leading and trailing whitespace
/// is collapsed but kept.
pub fn extract_plain_text(markup: &str) -> String {
    let stripped = strip_tags(markup);
    let without_refs = strip_references(&stripped);
    collapse_whitespace(&without_refs)
}

fn strip_tags(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

// Longest reference body we try to decode, e.g. `&#x10FFFF;` or `&thetasym;`.
const MAX_REFERENCE_LEN: usize = 10;

fn strip_references(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let semi = candidate
            .char_indices()
            .skip(1)
            .take(MAX_REFERENCE_LEN + 1)
            .find(|(_, ch)| *ch == ';' || *ch == '&' || ch.is_whitespace())
            .filter(|(_, ch)| *ch == ';')
            .map(|(idx, _)| idx);
        let Some(semi) = semi else {
            out.push('&');
            rest = &candidate[1..];
            continue;
        };
        let reference = &candidate[..=semi];
        match unescape(reference) {
            Ok(resolved) if resolved.chars().all(char::is_whitespace) => out.push(' '),
            Ok(_) => {}
            Err(_) if reference.eq_ignore_ascii_case("&nbsp;") => out.push(' '),
            Err(_) => {
                log::trace!("keeping unrecognized character reference {}", reference);
                out.push_str(reference);
            }
        }
        rest = &candidate[semi + 1..];
    }
    out.push_str(rest);
    out
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}
