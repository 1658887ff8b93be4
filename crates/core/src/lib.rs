//! Pressly Core - domain logic shared by the API and CLI.
//!
//! # Architecture
//!
//! The level engine, geo matching and producer scoring are pure functions over
//! plain data. Storage sits behind the [`store::Repository`] port; the only
//! adapter here is in-memory, so the crate stays free of network I/O.
//!
//! # Modules
//!
//! - [`types`] - IDs, coordinates, accounts and producers
//! - [`level`] - Order-count levels, feature gates and interface selection
//! - [`geo`] - Distance, radius search and map framing
//! - [`matching`] - Weighted producer scoring
//! - [`store`] - Storage port and in-memory store

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod geo;
pub mod level;
pub mod matching;
pub mod store;
pub mod types;

pub use types::*;
