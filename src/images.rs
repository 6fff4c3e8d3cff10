//! Inline images (`<img ...>`): cache seam, placeholders, and load completion
//! with a single rate-limit retry.
//!
//! The interpreter never blocks on an image. A cache miss produces a pending
//! placeholder plus an [`ImageRequest`]; whoever owns the cache fetches the
//! bytes and feeds the result back through [`complete_image_load`], which
//! updates the cache and decides whether to retry.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::fmt;
use core::time::Duration;

use crate::error::{ErrorPhase, LabelError};

/// Intrinsic image size in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageInfo {
    pub width: f32,
    pub height: f32,
}

impl ImageInfo {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Cache slot for one image source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageEntry {
    /// A load is in flight.
    Pending,
    /// Loaded and measured.
    Ready(ImageInfo),
}

/// Load state carried by an emitted image item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageState {
    /// Waiting for a load; renderers draw a placeholder box.
    Pending,
    /// Ready to draw.
    Ready(ImageInfo),
}

/// Image item in interpreter output.
#[derive(Clone, Debug, PartialEq)]
pub struct InlineImage {
    /// Cache key and fetch location.
    pub src: String,
    /// Alternate text.
    pub alt: String,
    /// Display width in pixels (attribute, else intrinsic when known).
    pub width: Option<f32>,
    /// Display height in pixels (attribute, else intrinsic when known).
    pub height: Option<f32>,
    /// Vertical offset aligning the image with surrounding text.
    pub baseline_shift: f32,
    /// Load state at interpretation time.
    pub state: ImageState,
}

/// A cache miss that the caller should fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRequest {
    /// Image source.
    pub src: String,
    /// Byte offset of the `<img` tag in the markup.
    pub position: usize,
}

/// Key/value store of image load state keyed by `src`.
pub trait ImageCache {
    /// Current entry for `src`.
    fn get(&self, src: &str) -> Option<ImageEntry>;

    /// Insert or replace an entry.
    fn insert(&mut self, src: &str, entry: ImageEntry);

    /// Drop the entry for `src`.
    fn evict(&mut self, src: &str);
}

/// In-memory [`ImageCache`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryImageCache {
    entries: BTreeMap<String, ImageEntry>,
}

impl MemoryImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries (pending included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ImageCache for MemoryImageCache {
    fn get(&self, src: &str) -> Option<ImageEntry> {
        self.entries.get(src).copied()
    }

    fn insert(&mut self, src: &str, entry: ImageEntry) {
        self.entries.insert(src.to_string(), entry);
    }

    fn evict(&mut self, src: &str) {
        self.entries.remove(src);
    }
}

/// Cache that never stores anything; every image stays pending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoImageCache;

impl ImageCache for NoImageCache {
    fn get(&self, _src: &str) -> Option<ImageEntry> {
        None
    }

    fn insert(&mut self, _src: &str, _entry: ImageEntry) {}

    fn evict(&mut self, _src: &str) {}
}

/// Why a fetch failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageLoadError {
    /// Remote asked us to slow down (HTTP 429 and friends).
    RateLimited,
    /// Source does not exist.
    NotFound,
    /// Any other failure.
    Failed(String),
}

impl ImageLoadError {
    /// Classify a free-form failure message from a fetcher.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("429") || lower.contains("too many requests") {
            Self::RateLimited
        } else if lower.contains("404") || lower.contains("not found") {
            Self::NotFound
        } else {
            Self::Failed(message.to_string())
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimited => "IMAGE_RATE_LIMITED",
            Self::NotFound => "IMAGE_NOT_FOUND",
            Self::Failed(_) => "IMAGE_LOAD_FAILED",
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl fmt::Display for ImageLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => f.write_str("rate limited"),
            Self::NotFound => f.write_str("not found"),
            Self::Failed(message) => f.write_str(message),
        }
    }
}

/// Retry behavior for rate-limited loads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Wait before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn never() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Result of feeding one fetch result back.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadOutcome {
    /// Cached as ready; relayout to pick it up.
    Loaded(ImageInfo),
    /// Fetch again after `after`.
    Retry { after: Duration },
    /// Gave up; the notice is for the user, not an error for the caller.
    Failed(LabelError),
}

/// Apply a fetch `result` for `request` to `cache`.
///
/// `attempt` is 1-based. Failures evict the entry; a rate-limited failure is
/// retried while `attempt <= policy.max_retries`.
pub fn complete_image_load<C: ImageCache + ?Sized>(
    cache: &mut C,
    request: &ImageRequest,
    result: Result<ImageInfo, ImageLoadError>,
    attempt: u32,
    policy: &RetryPolicy,
) -> LoadOutcome {
    match result {
        Ok(info) => {
            cache.insert(&request.src, ImageEntry::Ready(info));
            LoadOutcome::Loaded(info)
        }
        Err(err) => {
            cache.evict(&request.src);
            if err.is_rate_limited() && attempt <= policy.max_retries {
                log::info!(
                    "image '{}' rate limited on attempt {}; retrying in {:?}",
                    request.src,
                    attempt,
                    policy.delay
                );
                cache.insert(&request.src, ImageEntry::Pending);
                return LoadOutcome::Retry {
                    after: policy.delay,
                };
            }
            log::warn!("image '{}' failed to load: {}", request.src, err);
            LoadOutcome::Failed(
                LabelError::new(
                    ErrorPhase::ImageLoad,
                    err.code(),
                    alloc::format!("Failed to load image: {}", err),
                )
                .with_image_src(request.src.clone())
                .with_offset(request.position)
                .with_attempt(attempt),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ImageRequest {
        ImageRequest {
            src: "icons/flag.png".to_string(),
            position: 4,
        }
    }

    #[test]
    fn success_caches_ready_entry() {
        let mut cache = MemoryImageCache::new();
        cache.insert("icons/flag.png", ImageEntry::Pending);
        let info = ImageInfo::new(16.0, 12.0);
        let outcome =
            complete_image_load(&mut cache, &request(), Ok(info), 1, &RetryPolicy::default());
        assert_eq!(outcome, LoadOutcome::Loaded(info));
        assert_eq!(cache.get("icons/flag.png"), Some(ImageEntry::Ready(info)));
    }

    #[test]
    fn rate_limit_retries_exactly_once() {
        let mut cache = MemoryImageCache::new();
        let policy = RetryPolicy::default();
        let first = complete_image_load(
            &mut cache,
            &request(),
            Err(ImageLoadError::RateLimited),
            1,
            &policy,
        );
        assert_eq!(
            first,
            LoadOutcome::Retry {
                after: Duration::from_millis(500)
            }
        );
        assert_eq!(cache.get("icons/flag.png"), Some(ImageEntry::Pending));

        let second = complete_image_load(
            &mut cache,
            &request(),
            Err(ImageLoadError::RateLimited),
            2,
            &policy,
        );
        let LoadOutcome::Failed(notice) = second else {
            panic!("second rate limit should give up");
        };
        assert_eq!(notice.code, "IMAGE_RATE_LIMITED");
        assert_eq!(notice.image_src(), Some("icons/flag.png"));
        assert_eq!(cache.get("icons/flag.png"), None);
    }

    #[test]
    fn other_failures_evict_without_retry() {
        let mut cache = MemoryImageCache::new();
        cache.insert("icons/flag.png", ImageEntry::Pending);
        let outcome = complete_image_load(
            &mut cache,
            &request(),
            Err(ImageLoadError::NotFound),
            1,
            &RetryPolicy::default(),
        );
        assert!(matches!(outcome, LoadOutcome::Failed(ref e) if e.code == "IMAGE_NOT_FOUND"));
        assert!(cache.is_empty());
    }

    #[test]
    fn classify_recognizes_rate_limit_signatures() {
        assert_eq!(
            ImageLoadError::classify("Server returned HTTP response code: 429"),
            ImageLoadError::RateLimited
        );
        assert_eq!(
            ImageLoadError::classify("Too Many Requests"),
            ImageLoadError::RateLimited
        );
        assert_eq!(ImageLoadError::classify("404 Not Found"), ImageLoadError::NotFound);
        assert_eq!(
            ImageLoadError::classify("connection reset"),
            ImageLoadError::Failed("connection reset".to_string())
        );
    }
}
