//! # Search Session
//!
//! A client-side search session engine: the state and orchestration layer
//! between a search box and a search backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Input Layer                          │
//! │  • set_term() / set_filter() / set_page()                  │
//! │  • Validation (length bounds + custom rules)               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!              (cancel-and-restart debounce, two streams)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SearchSession                          │
//! │  • Generation counters: last issued request wins           │
//! │  • Drop guards clear loading flags on every path           │
//! │  • Snapshot republished on a watch channel                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                  (canonical key: session/term/filters/page)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ResultCache                           │
//! │  • FIFO eviction at capacity                               │
//! │  • Lazy TTL expiry on read                                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ miss
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  SearchBackend (your code)                  │
//! │  • search / suggestions / load_more                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use serde_json::json;
//! use search_session::{InMemoryBackend, SearchSession, SearchSessionConfig};
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let backend = Arc::new(InMemoryBackend::new(
//!     vec![json!({"title": "Rust in Action"}), json!({"title": "Go in Practice"})],
//!     "title",
//! ));
//! let session = SearchSession::<serde_json::Value>::new("main", SearchSessionConfig::default(), backend);
//! let mut updates = session.subscribe();
//!
//! // Keystrokes; only the settled term is searched
//! session.set_term("r");
//! session.set_term("rust");
//! tokio::time::sleep(Duration::from_millis(350)).await;
//!
//! let snapshot = updates.borrow_and_update().clone();
//! assert_eq!(snapshot.debounced_term, "rust");
//! assert_eq!(snapshot.results.map(|r| r.data.len()), Some(1));
//! # }
//! ```
//!
//! ## Features
//!
//! - **Debouncing**: separate quiet periods for search and autocomplete
//! - **Result Cache**: bounded, TTL-expiring, keyed by the full query
//! - **Pagination**: numbered pages or cursor-based infinite scroll
//! - **Autocomplete**: latest-only suggestion fetches with keyboard navigation
//! - **URL Sync**: mirror term/page/filters into a key-value store
//! - **Realtime**: refresh on push updates with reconnect backoff
//!
//! ## Modules
//!
//! - [`session`]: The [`SearchSession`] orchestrating all components
//! - [`backend`]: The [`SearchBackend`] seam and an in-memory implementation
//! - [`cache`]: FIFO/TTL result cache
//! - [`debounce`]: Cancel-and-restart debouncer
//! - [`validation`]: Term validation rules
//! - [`url_sync`]: Key-value store mirroring
//! - [`realtime`]: Push-driven refresh
//! - [`registry`]: Named sessions

pub mod config;
pub mod validation;
pub mod debounce;
pub mod cache;
pub mod key;
pub mod filters;
pub mod results;
pub mod backend;
pub mod session;
pub mod url_sync;
pub mod realtime;
pub mod registry;
pub mod metrics;

// Note: We don't expose a `tracing` module to avoid conflict with the tracing crate

pub use config::{PaginationMode, SearchMode, SearchSessionConfig};
pub use validation::{validate, ValidationRule};
pub use debounce::Debouncer;
pub use cache::{ResultCache, ResultCacheStats};
pub use key::{build_key, KeyParts};
pub use filters::{default_filters, FilterDefinition, FilterOption, FilterSet, FilterType};
pub use results::{ResultSet, Suggestion};
pub use backend::{ErrorKind, FetchError, InMemoryBackend, LoadMoreRequest, SearchBackend, SearchRequest};
pub use session::{
    Direction, LoadingFlags, SearchError, SearchMetrics, SearchSession, SearchSessionBuilder, SessionError,
    SessionHooks, SessionSnapshot, SuggestionState,
};
pub use url_sync::{KeyValueStore, MemoryStore, UrlSync};
pub use realtime::{ConnectionStatus, RealtimeLink, RetryConfig, UpdateChannel, UpdateEvent};
pub use registry::SessionRegistry;
pub use metrics::LatencyTimer;
