//! Search backends.
//!
//! The session never performs transport itself. Everything that leaves the
//! process goes through a [`SearchBackend`] implementation supplied by the
//! embedding application. [`InMemoryBackend`] is a self-contained backend
//! over a fixed document list, useful for tests and demos.

pub mod traits;
pub mod memory;

pub use traits::{ErrorKind, FetchError, LoadMoreRequest, SearchBackend, SearchRequest};
pub use memory::InMemoryBackend;
