//! Image asset pipeline for vehicle listings.
//!
//! Uploaded photographs are validated, rendered into full, medium and
//! thumbnail JPEG derivatives under a per-vehicle directory, and recorded in a
//! SQLite image store. The reconcile sweep removes images of vehicles that no
//! longer exist.

#[cfg(feature = "data")]
pub mod db;
#[cfg(feature = "data")]
pub mod domain;
#[cfg(feature = "server")]
pub mod imaging;
#[cfg(feature = "data")]
pub mod models;
#[cfg(feature = "data")]
pub mod repository;
#[cfg(feature = "data")]
pub mod schema;
#[cfg(feature = "server")]
pub mod services;
#[cfg(feature = "server")]
pub mod storage;
