//! Layout and draw commands for `richlabel` content.

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

mod render_ir;
mod render_layout;

pub use render_ir::{
    DecorationCommand, DecorationKind, DrawCommand, ImageCommand, MarkCommand, MarkGlyph,
    RectCommand, RenderedLabel, ResolvedTextStyle, Rgba, TextCommand,
};
pub use render_layout::{
    HeuristicTextMeasurer, LabelLayout, LayoutConfig, MarkAnchor, TextMeasurer,
};
