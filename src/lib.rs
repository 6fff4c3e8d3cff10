//! Inline rich-text label markup.
//!
//! `richlabel` turns strings such as
//! `<html><b>Status:</b> <c "green">online</c><mark shape="Circle"></html>`
//! into an ordered list of styled runs, marks and image placeholders that any
//! text-flow surface can draw. The markup is lenient: unknown tags are text,
//! unmatched closers are ignored and bad colors or sizes keep the previous
//! value, so interpretation never fails.
//!
//! ```
//! use richlabel::MarkupInterpreter;
//!
//! let content = MarkupInterpreter::default().interpret("<b>bold</b> normal");
//! let runs: Vec<_> = content.runs().collect();
//! assert_eq!(runs.len(), 2);
//! assert!(runs[0].style.is_bold());
//! assert_eq!(richlabel::extract_plain_text("<b>Hi</b> <i>there</i>"), "Hi there");
//! ```

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

pub mod attributes;
pub mod color;
pub mod error;
pub mod images;
pub mod interpret;
#[cfg(feature = "async")]
pub mod loader;
pub mod marks;
pub mod plain_text;
pub mod scanner;
pub mod style;

pub use attributes::AttributeMap;
pub use color::{Color, ColorSpec};
pub use error::{ErrorPhase, LabelError, LabelErrorContext};
pub use images::{
    complete_image_load, ImageCache, ImageEntry, ImageInfo, ImageLoadError, ImageRequest,
    ImageState, InlineImage, LoadOutcome, MemoryImageCache, NoImageCache, RetryPolicy,
};
pub use interpret::{
    InterpretOptions, LabelContent, LabelItem, MarkPlacement, MarkupInterpreter, StyledRun,
};
#[cfg(feature = "async")]
pub use loader::{load_image, load_images};
pub use marks::{MarkRequest, MarkShape, MarkSpec, ShapeFactory, StandardShapes};
pub use plain_text::extract_plain_text;
pub use scanner::{
    scan_events, scan_events_from, scan_tag, EventKind, MarkupEvent, MarkupEvents, StyleType,
};
pub use style::{DefaultStyle, FontCatalog, FontSpec, TextStyle, WEIGHT_BOLD, WEIGHT_NORMAL};
