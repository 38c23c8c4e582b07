//! Fire-and-forget notification hooks.

use std::fmt;
use std::sync::Arc;

use super::types::SearchError;

pub type ErrorHook = Arc<dyn Fn(&SearchError) + Send + Sync>;
pub type CacheHitHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Callbacks invoked once per surfaced failure / cache hit.
///
/// Hooks run synchronously on the task that produced the event and must not
/// block.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use search_session::SessionHooks;
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let counter = hits.clone();
/// let hooks = SessionHooks::new()
///     .on_cache_hit(move |_key| { counter.fetch_add(1, Ordering::Relaxed); })
///     .on_error(|err| eprintln!("search failed: {}", err));
/// ```
#[derive(Clone, Default)]
pub struct SessionHooks {
    on_error: Option<ErrorHook>,
    on_cache_hit: Option<CacheHitHook>,
}

impl SessionHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&SearchError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn on_cache_hit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_cache_hit = Some(Arc::new(hook));
        self
    }

    pub(crate) fn error(&self, error: &SearchError) {
        if let Some(hook) = &self.on_error {
            hook(error);
        }
    }

    pub(crate) fn cache_hit(&self, key: &str) {
        if let Some(hook) = &self.on_cache_hit {
            hook(key);
        }
    }
}

impl fmt::Debug for SessionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHooks")
            .field("on_error", &self.on_error.is_some())
            .field("on_cache_hit", &self.on_cache_hit.is_some())
            .finish()
    }
}
