//! # Campus Core
//!
//! Domain types and storage-agnostic logic for the campus information backend.
//!
//! - [`time`]: folds the legacy `(date, time-string)` pair of an appointment into one
//!   timezone-aware instant
//! - [`reference`]: short base-62 appointment reference IDs and their allocator
//! - [`approval`]: the two-flag approval gate shared by publishable content
//! - [`slug`]: URL slug derivation and collision suffixing for projects
//! - [`migration`]: the dependency-ordered migration harness
//! - [`models`]: entities and request/response payloads

pub mod approval;
pub mod errors;
pub mod migration;
pub mod models;
pub mod reference;
pub mod slug;
pub mod time;
