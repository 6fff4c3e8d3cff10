//! Structured errors for the non-interpreting parts of the crate.
//!
//! Interpretation itself never fails: malformed markup degrades to the
//! closest reasonable rendering. `LabelError` covers the surfaces around it
//! (image loading, layout export, the CLI).

extern crate alloc;

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

/// Processing phase an error originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorPhase {
    /// Reading markup input (CLI, files, stdin).
    Input,
    /// Fetching or decoding an inline image.
    ImageLoad,
    /// Laying out interpreted content.
    Layout,
    /// Serializing or deserializing render output.
    Export,
}

impl fmt::Display for ErrorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Input => "input",
            Self::ImageLoad => "image_load",
            Self::Layout => "layout",
            Self::Export => "export",
        };
        f.write_str(name)
    }
}

/// Structured error with a stable machine-readable code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelError {
    /// Processing phase where this error originated.
    pub phase: ErrorPhase,
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: Box<str>,
    /// Optional additional context.
    pub context: Option<Box<LabelErrorContext>>,
}

/// Extended optional context for label errors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelErrorContext {
    /// Where the failing input came from (path, `stdin`, argument).
    pub source: Option<Box<str>>,
    /// Image `src` attribute for image-load failures.
    pub image_src: Option<Box<str>>,
    /// Byte offset into the markup string.
    pub offset: Option<usize>,
    /// 1-based load attempt for retried operations.
    pub attempt: Option<u32>,
}

impl LabelError {
    /// Create an error for `phase` with a stable code.
    pub fn new(phase: ErrorPhase, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            phase,
            code,
            message: message.into().into_boxed_str(),
            context: None,
        }
    }

    fn context_mut(&mut self) -> &mut LabelErrorContext {
        self.context
            .get_or_insert_with(|| Box::new(LabelErrorContext::default()))
    }

    /// Attach an input source description.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.context_mut().source = Some(source.into().into_boxed_str());
        self
    }

    /// Attach the image `src` that failed.
    pub fn with_image_src(mut self, src: impl Into<String>) -> Self {
        self.context_mut().image_src = Some(src.into().into_boxed_str());
        self
    }

    /// Attach a byte offset into the markup.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.context_mut().offset = Some(offset);
        self
    }

    /// Attach the load attempt number.
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.context_mut().attempt = Some(attempt);
        self
    }

    /// Image `src` context, if any.
    pub fn image_src(&self) -> Option<&str> {
        self.context.as_deref().and_then(|ctx| ctx.image_src.as_deref())
    }
}

impl fmt::Display for LabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.phase, self.code, self.message)?;
        if let Some(ctx) = &self.context {
            if let Some(source) = ctx.source.as_deref() {
                write!(f, " [source={}]", source)?;
            }
            if let Some(src) = ctx.image_src.as_deref() {
                write!(f, " [src={}]", src)?;
            }
            if let Some(offset) = ctx.offset {
                write!(f, " [offset={}]", offset)?;
            }
            if let Some(attempt) = ctx.attempt {
                write!(f, " [attempt={}]", attempt)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for LabelError {}
