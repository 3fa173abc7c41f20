//! Location and forecast store for Trailcast
//!
//! Tracks the user's locations by coordinate identity, keeps favourites and
//! recently viewed lists, caches forecasts on disk and queues weather
//! warnings per location.

pub mod error;
pub mod identity;
pub mod location;
pub mod store;
pub mod types;
pub mod warnings;

pub use error::{CoordinateError, StoreError, StoreResult};
pub use identity::{identity_key, Coordinates, LocationKey};
pub use location::Location;
pub use store::{ForecastStore, DEFAULT_RECENT_CAPACITY};
pub use types::*;
pub use warnings::{Severity, Warning, WarningsContainer};
