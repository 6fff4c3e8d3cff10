//! Async image fetching on tokio, with the rate-limit retry applied between
//! attempts.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::future::Future;

use crate::images::{
    complete_image_load, ImageCache, ImageInfo, ImageLoadError, ImageRequest, LoadOutcome,
    RetryPolicy,
};

/// Fetch one image until it loads, fails, or runs out of retries.
///
/// Returns either `Loaded` or `Failed`; `Retry` outcomes are consumed here by
/// sleeping for the policy delay. Nothing cancels an in-flight load.
pub async fn load_image<C, F, Fut>(
    cache: &mut C,
    request: &ImageRequest,
    policy: &RetryPolicy,
    fetch: &mut F,
) -> LoadOutcome
where
    C: ImageCache + ?Sized,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<ImageInfo, ImageLoadError>>,
{
    let mut attempt = 1u32;
    loop {
        let result = fetch(request.src.clone()).await;
        match complete_image_load(cache, request, result, attempt, policy) {
            LoadOutcome::Retry { after } => {
                tokio::time::sleep(after).await;
                attempt = attempt.saturating_add(1);
            }
            outcome => return outcome,
        }
    }
}

/// Load every request in order, sharing one cache.
pub async fn load_images<C, F, Fut>(
    cache: &mut C,
    requests: &[ImageRequest],
    policy: &RetryPolicy,
    mut fetch: F,
) -> Vec<LoadOutcome>
where
    C: ImageCache + ?Sized,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<ImageInfo, ImageLoadError>>,
{
    let mut outcomes = Vec::with_capacity(requests.len());
    for request in requests {
        outcomes.push(load_image(cache, request, policy, &mut fetch).await);
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{ImageEntry, MemoryImageCache};
    use alloc::string::ToString;
    use core::time::Duration;

    fn request(src: &str) -> ImageRequest {
        ImageRequest {
            src: src.to_string(),
            position: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_fetch_retries_after_delay() {
        let mut cache = MemoryImageCache::new();
        let mut calls = 0u32;
        let mut fetch = |_src: String| {
            calls += 1;
            let call = calls;
            async move {
                if call == 1 {
                    Err(ImageLoadError::RateLimited)
                } else {
                    Ok(ImageInfo::new(8.0, 8.0))
                }
            }
        };
        let started = tokio::time::Instant::now();
        let outcome =
            load_image(&mut cache, &request("a.png"), &RetryPolicy::default(), &mut fetch).await;
        assert_eq!(outcome, LoadOutcome::Loaded(ImageInfo::new(8.0, 8.0)));
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(
            cache.get("a.png"),
            Some(ImageEntry::Ready(ImageInfo::new(8.0, 8.0)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_rate_limit_gives_up_after_one_retry() {
        let mut cache = MemoryImageCache::new();
        let mut calls = 0u32;
        let mut fetch = |_src: String| {
            calls += 1;
            async { Err(ImageLoadError::RateLimited) }
        };
        let outcome =
            load_image(&mut cache, &request("a.png"), &RetryPolicy::default(), &mut fetch).await;
        let LoadOutcome::Failed(err) = outcome else {
            panic!("expected failure after retry");
        };
        assert_eq!(err.code, "IMAGE_RATE_LIMITED");
        assert_eq!(calls, 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn batch_loads_in_request_order() {
        let mut cache = MemoryImageCache::new();
        let requests = [request("ok.png"), request("missing.png")];
        let outcomes = load_images(&mut cache, &requests, &RetryPolicy::never(), |src| async move {
            if src == "ok.png" {
                Ok(ImageInfo::new(4.0, 2.0))
            } else {
                Err(ImageLoadError::NotFound)
            }
        })
        .await;
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], LoadOutcome::Loaded(_)));
        assert!(matches!(outcomes[1], LoadOutcome::Failed(ref e) if e.code == "IMAGE_NOT_FOUND"));
        assert_eq!(cache.len(), 1);
    }
}
