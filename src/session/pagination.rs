//! Page arithmetic and page navigation.
//!
//! Navigation only moves `page`; fetching the new page is up to the caller.

use tracing::debug;

use crate::config::SearchSessionConfig;
use crate::results::ResultSet;

use super::SearchSession;

/// `ceil(total / page_size)` capped at `max_pages`; 0 while the total is unknown.
pub(crate) fn total_pages<T>(results: Option<&ResultSet<T>>, config: &SearchSessionConfig) -> u32 {
    match results.and_then(|r| r.total) {
        Some(total) => {
            let pages = total.div_ceil(u64::from(config.page_size.max(1)));
            pages.min(u64::from(config.max_pages)) as u32
        }
        None => 0,
    }
}

/// Highest page `set_page` may land on.
pub(crate) fn page_limit<T>(results: Option<&ResultSet<T>>, config: &SearchSessionConfig) -> u32 {
    match results.and_then(|r| r.total) {
        Some(_) => total_pages(results, config).max(1),
        None => config.max_pages.max(1),
    }
}

pub(crate) fn has_next_page<T>(page: u32, results: Option<&ResultSet<T>>, config: &SearchSessionConfig) -> bool {
    match results {
        Some(r) if r.total.is_some() => page < total_pages(results, config),
        Some(r) => r.has_more == Some(true),
        None => false,
    }
}

/// Clamp a requested page into `[1, limit]`.
pub(crate) fn clamp_page(requested: i64, limit: u32) -> u32 {
    requested.clamp(1, i64::from(limit.max(1))) as u32
}

impl<T> SearchSession<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn page(&self) -> u32 {
        self.shared.state.read().page
    }

    #[must_use]
    pub fn total_pages(&self) -> u32 {
        let config = self.config();
        total_pages(self.shared.state.read().results.as_ref(), &config)
    }

    #[must_use]
    pub fn has_next_page(&self) -> bool {
        let config = self.config();
        let state = self.shared.state.read();
        has_next_page(state.page, state.results.as_ref(), &config)
    }

    #[must_use]
    pub fn has_prev_page(&self) -> bool {
        self.shared.state.read().page > 1
    }

    /// A search has settled and returned nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.state.read().results.as_ref().is_some_and(|r| r.is_empty())
    }

    pub fn next_page(&self) {
        if self.has_next_page() {
            self.move_page(|page, _| page + 1);
        }
    }

    /// Step back one page, landing inside the current limit even when a
    /// config change shrank it below the current page.
    pub fn prev_page(&self) {
        self.move_page(|page, limit| clamp_page(i64::from(page) - 1, limit));
    }

    /// Jump to page `page`, clamped into the valid range.
    pub fn set_page(&self, page: i64) {
        self.move_page(|_, limit| clamp_page(page, limit));
    }

    pub fn go_to_first_page(&self) {
        self.move_page(|_, _| 1);
    }

    /// Jump to the last page. No-op while the total is unknown.
    pub fn go_to_last_page(&self) {
        if self.total_pages() > 0 {
            self.move_page(|_, limit| limit);
        }
    }

    fn move_page(&self, to: impl FnOnce(u32, u32) -> u32) {
        let config = self.config();
        let moved = {
            let mut state = self.shared.state.write();
            let limit = page_limit(state.results.as_ref(), &config);
            let target = to(state.page, limit);
            let changed = target != state.page;
            if changed {
                debug!(from = state.page, to = target, "Page changed");
                state.page = target;
            }
            changed
        };
        if moved {
            self.publish();
        }
    }
}
