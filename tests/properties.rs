//! Property-based tests for the interpreter and plain-text extraction.
//!
//! These check that arbitrary input never panics and that style scopes
//! always unwind to the default style.

use proptest::prelude::*;
use richlabel::{
    extract_plain_text, DefaultStyle, FontSpec, InterpretOptions, LabelItem, MarkupInterpreter,
};

fn interpreter() -> MarkupInterpreter {
    MarkupInterpreter::new(
        InterpretOptions::default()
            .with_default_style(DefaultStyle::new(FontSpec::new("Sans", 16.0))),
    )
}

/// Fragments that open and close one style scope each.
fn scope() -> impl Strategy<Value = (&'static str, &'static str)> {
    prop_oneof![
        Just(("<b>", "</b>")),
        Just(("<i>", "</i>")),
        Just(("<u>", "</u>")),
        Just(("<a>", "</a>")),
        Just(("<sup>", "</sup>")),
        Just(("<sub>", "</sub>")),
        Just(("<size 22>", "</size>")),
        Just(("<size \"bogus\">", "</size>")),
        Just(("<c red>", "</c>")),
        Just(("<c \"#12345\">", "</c>")),
        Just(("<font Mono>", "</font>")),
    ]
}

/// Tag soup: known openers and closers, stray brackets and text.
fn tag_soup() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        "[a-z &;#0-9]{0,6}",
        Just("<b>".to_string()),
        Just("</b>".to_string()),
        Just("<sup>".to_string()),
        Just("</sub>".to_string()),
        Just("<size".to_string()),
        Just("<c \"".to_string()),
        Just("</c>".to_string()),
        Just("<br>".to_string()),
        Just("<mark shape=".to_string()),
        Just("<img src=x>".to_string()),
        Just("<html>".to_string()),
        Just("</html>".to_string()),
        Just("<".to_string()),
        Just(">".to_string()),
    ];
    prop::collection::vec(piece, 0..24).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn text_without_tags_is_one_default_run(text in "[^<]{1,64}") {
        let interp = interpreter();
        let content = interp.interpret(&text);
        let runs: Vec<_> = content.runs().collect();
        prop_assert_eq!(runs.len(), 1);
        prop_assert_eq!(&runs[0].text, &text);
        prop_assert_eq!(&runs[0].style, &interp.options().default_style.text_style());
    }

    #[test]
    fn arbitrary_input_never_panics(markup in "\\PC{0,96}") {
        let content = interpreter().interpret(&markup);
        prop_assert!(!content.items().is_empty() || !content.trailing_marks().is_empty());
        let _ = extract_plain_text(&markup);
    }

    #[test]
    fn tag_soup_never_panics(markup in tag_soup()) {
        let content = interpreter().interpret(&markup);
        for item in content.iter() {
            if let LabelItem::Run(run) = item {
                prop_assert!(!run.text.is_empty());
                prop_assert!(run.style.size_px.is_finite() && run.style.size_px > 0.0);
            }
        }
    }

    #[test]
    fn balanced_scopes_unwind_to_default(
        scopes in prop::collection::vec(scope(), 1..8),
        word in "[a-z]{1,8}",
    ) {
        let mut markup = String::new();
        for (open, _) in &scopes {
            markup.push_str(open);
            markup.push_str(&word);
        }
        for (_, close) in scopes.iter().rev() {
            markup.push_str(close);
        }
        markup.push_str("tail");

        let interp = interpreter();
        let content = interp.interpret(&markup);
        let last = content.runs().last().expect("tail run");
        let default = interp.options().default_style.text_style();
        prop_assert_eq!(&last.text, "tail");
        prop_assert_eq!(last.style.baseline_shift, 0.0);
        prop_assert!((last.style.size_px - default.size_px).abs() < 1e-3);
        prop_assert_eq!(last.style.weight, default.weight);
        prop_assert_eq!(last.style.color, default.color);
        prop_assert_eq!(&last.style.family, &default.family);
        prop_assert!(!last.style.italic && !last.style.underline && !last.style.strikethrough);
    }

    #[test]
    fn plain_text_joins_words_with_single_spaces(
        words in prop::collection::vec("[a-zA-Z0-9]{1,8}", 1..10),
    ) {
        let markup: String = words
            .iter()
            .map(|w| format!("<b>{}</b>\n  ", w))
            .collect();
        prop_assert_eq!(extract_plain_text(&markup), format!("{} ", words.join(" ")));
    }
}
