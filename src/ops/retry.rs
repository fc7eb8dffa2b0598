//! Retry and repeat operators
//!
//! Both resubscribe to a cloned source when it terminates: `retry` on error,
//! `repeat` on completion. A [`RetryPolicy`] decides whether another attempt
//! is allowed.
//!
//! Sources that fail synchronously inside `actual_subscribe` would recurse
//! once per attempt. The driver loop below trampolines instead: a terminal
//! event that arrives while a subscription is still being set up only flags
//! the loop to go around again.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::{
//!   Arc, Mutex,
//!   atomic::{AtomicUsize, Ordering},
//! };
//!
//! use rxcore::prelude::*;
//!
//! let attempts = Arc::new(AtomicUsize::new(0));
//! let c_attempts = attempts.clone();
//! let source = observable::create(move |emitter| {
//!   if c_attempts.fetch_add(1, Ordering::SeqCst) < 2 {
//!     emitter.error(RxError::msg("flaky"));
//!   } else {
//!     emitter.next(1);
//!     emitter.complete();
//!   }
//! });
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let c_seen = seen.clone();
//! source.retry(3).subscribe(move |v| c_seen.lock().unwrap().push(v));
//! assert_eq!(*seen.lock().unwrap(), vec![1]);
//! assert_eq!(attempts.load(Ordering::SeqCst), 3);
//! ```

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{SerialSubscription, Subscription},
};

// ==================== Policies ====================

/// Decides whether the source gets another attempt.
///
/// `attempt` counts the resubscriptions already made, so it is `0` when the
/// source terminates for the first time.
pub trait RetryPolicy<Err>: Clone {
  /// Called when the source errors under `retry`.
  fn should_retry(&self, err: &Err, attempt: usize) -> bool;

  /// Called when the source completes under `repeat`.
  fn should_repeat(&self, attempt: usize) -> bool {
    let _ = attempt;
    false
  }

  /// Resets the attempt counter whenever a value arrives.
  fn reset_on_success(&self) -> bool { false }
}

/// At most this many resubscriptions.
impl<Err> RetryPolicy<Err> for usize {
  fn should_retry(&self, _err: &Err, attempt: usize) -> bool { attempt < *self }

  fn should_repeat(&self, attempt: usize) -> bool { attempt < *self }
}

/// Resubscribes without limit.
#[derive(Clone, Copy, Debug, Default)]
pub struct Forever;

impl<Err> RetryPolicy<Err> for Forever {
  fn should_retry(&self, _err: &Err, _attempt: usize) -> bool { true }

  fn should_repeat(&self, _attempt: usize) -> bool { true }
}

/// Builder for a bounded or unbounded policy that can forgive past failures.
///
/// ```rust
/// use rxcore::ops::retry::RetryConfig;
///
/// let config = RetryConfig::new().count(5).reset_on_success();
/// ```
#[derive(Clone, Debug, Default)]
pub struct RetryConfig {
  count: Option<usize>,
  reset_on_success: bool,
}

impl RetryConfig {
  /// Unbounded, never resets.
  pub fn new() -> Self { Self::default() }

  pub fn count(mut self, count: usize) -> Self {
    self.count = Some(count);
    self
  }

  /// Every value emitted by the source resets the attempt counter, so only
  /// consecutive failures count against the limit.
  pub fn reset_on_success(mut self) -> Self {
    self.reset_on_success = true;
    self
  }

  fn allows(&self, attempt: usize) -> bool { self.count.is_none_or(|count| attempt < count) }
}

impl<Err> RetryPolicy<Err> for RetryConfig {
  fn should_retry(&self, _err: &Err, attempt: usize) -> bool { self.allows(attempt) }

  fn should_repeat(&self, attempt: usize) -> bool { self.allows(attempt) }

  fn reset_on_success(&self) -> bool { self.reset_on_success }
}

// ==================== Resubscribe ====================

/// Which terminal event triggers a new attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
  Error,
  Complete,
}

#[derive(Clone)]
pub struct Resubscribe<S, P> {
  pub source: S,
  pub policy: P,
  pub trigger: Trigger,
}

impl<S: ObservableType, P> ObservableType for Resubscribe<S, P> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct ResubscribeState<O> {
  observer: Option<O>,
  attempts: usize,
  subscribing: bool,
  again: bool,
}

pub struct ResubscribeObserver<S, P, O> {
  source: S,
  policy: P,
  trigger: Trigger,
  state: MutArc<ResubscribeState<O>>,
  serial: SerialSubscription,
  // fn pointer keeps `S: CoreObservable<Self>` out of the observer bounds
  subscribe_fn: fn(Self),
}

impl<S: Clone, P: Clone, O> Clone for ResubscribeObserver<S, P, O> {
  fn clone(&self) -> Self {
    Self {
      source: self.source.clone(),
      policy: self.policy.clone(),
      trigger: self.trigger,
      state: self.state.clone(),
      serial: self.serial.clone(),
      subscribe_fn: self.subscribe_fn,
    }
  }
}

impl<S, P, O> ResubscribeObserver<S, P, O>
where
  S: CoreObservable<Self> + Clone,
  S::Unsub: Send + 'static,
  P: Clone,
{
  fn drive(self) {
    loop {
      if self.serial.is_closed() {
        return;
      }
      {
        let mut state = self.state.rc_deref_mut();
        state.subscribing = true;
        state.again = false;
      }
      let unsub = self.source.clone().actual_subscribe(self.clone());
      self.serial.set(unsub);
      let mut state = self.state.rc_deref_mut();
      state.subscribing = false;
      if !state.again {
        return;
      }
    }
  }
}

impl<S, P, O> ResubscribeObserver<S, P, O> {
  fn restart(self) {
    let nested = {
      let mut state = self.state.rc_deref_mut();
      state.attempts += 1;
      tracing::trace!(attempt = state.attempts, trigger = ?self.trigger, "resubscribing");
      if state.subscribing {
        state.again = true;
      }
      state.subscribing
    };
    if !nested {
      (self.subscribe_fn)(self);
    }
  }

  fn attempts(&self) -> usize { self.state.rc_deref_mut().attempts }
}

impl<S, P, O, Item, Err> Observer<Item, Err> for ResubscribeObserver<S, P, O>
where
  O: Observer<Item, Err>,
  P: RetryPolicy<Err>,
{
  fn next(&mut self, value: Item) {
    let mut state = self.state.rc_deref_mut();
    if self.policy.reset_on_success() {
      state.attempts = 0;
    }
    if let Some(observer) = state.observer.as_mut() {
      observer.next(value);
    }
  }

  fn error(self, err: Err) {
    if self.trigger == Trigger::Error && self.policy.should_retry(&err, self.attempts()) {
      self.restart();
    } else {
      let observer = self.state.rc_deref_mut().observer.take();
      if let Some(observer) = observer {
        observer.error(err);
      }
    }
  }

  fn complete(self) {
    if self.trigger == Trigger::Complete
      && RetryPolicy::<Err>::should_repeat(&self.policy, self.attempts())
    {
      self.restart();
    } else {
      let observer = self.state.rc_deref_mut().observer.take();
      if let Some(observer) = observer {
        observer.complete();
      }
    }
  }

  fn is_closed(&self) -> bool {
    self.serial.is_closed() || self.state.rc_deref_mut().observer.as_ref().is_none_or(O::is_closed)
  }
}

impl<S, P, O> CoreObservable<O> for Resubscribe<S, P>
where
  S: CoreObservable<ResubscribeObserver<S, P, O>> + Clone,
  S::Unsub: Send + 'static,
  P: RetryPolicy<S::Err>,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Resubscribe { source, policy, trigger } = self;
    let serial = SerialSubscription::new();
    let driver = ResubscribeObserver {
      source,
      policy,
      trigger,
      state: MutArc::own(ResubscribeState {
        observer: Some(observer),
        attempts: 0,
        subscribing: false,
        again: false,
      }),
      serial: serial.clone(),
      subscribe_fn: ResubscribeObserver::drive,
    };
    driver.drive();
    serial
  }
}
