//! # rxcore: reactive streams core
//!
//! Observables, observers, subjects, schedulers and the usual operator set,
//! thread-safe throughout.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use rxcore::prelude::*;
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let c_seen = seen.clone();
//! observable::range(0, 10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(move |v| c_seen.lock().unwrap().push(v));
//! assert_eq!(*seen.lock().unwrap(), vec![0, 4, 8, 12, 16]);
//! ```
//!
//! ## Key concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Cold stream description plus the operator set |
//! | [`Observer`] | Consumes `next`, `error` and `complete` |
//! | [`Subscription`] | Handle that tears a running stream down |
//! | [`Scheduler`] | Decides when and where time-based work runs |
//! | [`Subject`] | Hot multicast primitive, both observer and observable |
//!
//! ## Feature flags
//!
//! - **`thread-pool`** (default): [`ThreadPoolScheduler`], backed by the
//!   `futures` executor, and the process-wide default scheduler built on it.
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Scheduler`]: scheduler::Scheduler
//! [`Subject`]: subject::Subject
//! [`ThreadPoolScheduler`]: scheduler::ThreadPoolScheduler

pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscription;

pub use prelude::*;
