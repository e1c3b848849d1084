#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation engine for flood impact records.
//!
//! [`aggregate`] turns an [`AggregationQuery`] and a sequence of records
//! into an [`AggregationResult`]. It is a pure function, which is what makes
//! results safe to memoize in the shared [`QueryCache`].

pub mod cache;
pub mod engine;
pub mod statistics;

pub use cache::{CacheStats, DEFAULT_CACHE_CAPACITY, QueryCache};
pub use engine::aggregate;
pub use flood_impact_analytics_models::{
    AggregatedValue, AggregationQuery, AggregationResult, InvalidQueryError,
};
