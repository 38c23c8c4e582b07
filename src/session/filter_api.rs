use serde_json::Value;
use tracing::debug;

use crate::filters::FilterSet;

use super::SearchSession;

impl<T> SearchSession<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn filters(&self) -> FilterSet {
        self.shared.state.read().filters.clone()
    }

    /// Set one filter. A `null` value removes it.
    pub fn set_filter(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        self.edit_filters(|filters| {
            if value.is_null() {
                filters.remove(&key);
            } else {
                filters.insert(key, value);
            }
        });
    }

    /// Replace the whole filter set. `null` values are dropped.
    pub fn set_filters(&self, filters: FilterSet) {
        self.edit_filters(|current| {
            *current = filters.into_iter().filter(|(_, v)| !v.is_null()).collect();
        });
    }

    pub fn remove_filter(&self, key: &str) {
        self.edit_filters(|filters| {
            filters.remove(key);
        });
    }

    pub fn clear_filters(&self) {
        self.edit_filters(FilterSet::clear);
    }

    /// Apply `edit`; if the effective set changed, go back to the first
    /// page (or drop the cursor) and publish.
    fn edit_filters(&self, edit: impl FnOnce(&mut FilterSet)) {
        let mode = self.config().mode;
        let changed = {
            let mut state = self.shared.state.write();
            let before = state.filters.clone();
            edit(&mut state.filters);
            let changed = state.filters != before;
            if changed {
                debug!(filters = state.filters.len(), "Filters changed");
                state.reset_position(mode);
            }
            changed
        };
        if changed {
            self.publish();
        }
    }
}
