//! A thread-safe bidirectional hashmap.
//!
//! A [`ConcurrentBiMap`] stores its pairs once, in a sharded [`ConcurrentStore`]. Its
//! [`Inverse`], its key set, its values and its entry set are all live views over that one
//! store, so a write through any of them is visible through every other. Lookups by key are
//! hashed; lookups by value scan the store.
//!
//! Values are not required to be unique. Inserting a value that another key already holds keeps
//! both pairs, and the inverse then resolves that value to one of the keys, unspecified which.
//!
//! Every operation takes `&self`; clone a map to share it between threads.
//!
//! ```rust
//! use concurrent_bimap::{ConcurrentBiMap, LiveCollection};
//!
//! let map: ConcurrentBiMap<String, u64> = ConcurrentBiMap::new();
//! map.insert("one".to_string(), 1);
//!
//! let inverse = map.inverse();
//! assert_eq!(inverse.get(&1), Some("one".to_string()));
//!
//! inverse.insert(2, "two".to_string());
//! assert_eq!(map.get("two"), Some(2));
//! assert!(map.key_set().contains(&"two".to_string()));
//! ```

#![deny(unused_imports, missing_debug_implementations, unreachable_pub)]
#![cfg_attr(doc, deny(missing_docs, rustdoc::broken_intra_doc_links))]
#![warn(rust_2018_idioms)]

/// The forward map
pub mod concurrent_bimap;
pub use crate::concurrent_bimap::*;

/// The inverse map
pub mod inverse;
pub use crate::inverse::*;

/// The operations shared by both directions
pub mod bimap;
pub use crate::bimap::*;

/// The sharded store behind every map and view
pub mod store;
pub use crate::store::*;

/// Live key, value and entry views
pub mod views;
pub use crate::views::*;

/// A pass-through set wrapper
pub mod forwarding;
pub use crate::forwarding::*;

/// The entry set of an inverse map
pub mod inverse_entries;
pub use crate::inverse_entries::*;

/// Errors returned by views and constructors
pub mod error;
pub use crate::error::*;

/// Various helpful functions
pub(crate) mod utils;

#[cfg(feature = "serde")]
mod serde;
