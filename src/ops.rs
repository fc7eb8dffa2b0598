//! Operator implementations.
//!
//! Each operator is a plain struct holding its source and parameters, built
//! by a method on [`Observable`](crate::observable::Observable). Subscribing
//! wraps the downstream observer in the operator's own observer type and
//! subscribes the source with it.

pub mod amb;
pub mod buffer;
pub mod buffer_time;
pub mod cast;
pub mod catch;
pub mod collect;
pub mod combine_latest;
pub mod concat;
pub mod delay;
pub mod distinct;
pub mod element;
pub mod filter;
pub mod finalize;
pub mod flat_map;
pub mod group_by;
pub mod map;
pub mod merge;
pub mod observe_on;
pub mod reduce;
pub mod retry;
pub mod sample;
pub mod skip;
pub mod start_with;
pub mod subscribe_on;
pub mod switch_map;
pub mod take;
pub mod tap;
pub mod throttle;
pub mod timeout;
pub mod timestamp;
pub mod zip;

pub use group_by::GroupedObservable;
pub use retry::{Forever, RetryConfig, RetryPolicy};
pub use timestamp::{TimeIntervalValue, Timestamped};
