//! Timestamp and TimeInterval operators
//!
//! Both read the clock of the scheduler they were given, so virtual time
//! works in tests.

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  scheduler::{Duration, Instant, Scheduler},
};

/// A value paired with the time it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamped<T> {
  pub value: T,
  pub timestamp: Instant,
}

/// A value paired with the time elapsed since the previous one (or since
/// subscription, for the first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeIntervalValue<T> {
  pub value: T,
  pub interval: Duration,
}

// ==================== Timestamp ====================

#[derive(Clone)]
pub struct Timestamp<S, SD> {
  pub source: S,
  pub scheduler: SD,
}

impl<S: ObservableType, SD> ObservableType for Timestamp<S, SD> {
  type Item = Timestamped<S::Item>;
  type Err = S::Err;
}

pub struct TimestampObserver<O, SD> {
  observer: O,
  scheduler: SD,
}

impl<O, SD, Item, Err> Observer<Item, Err> for TimestampObserver<O, SD>
where
  O: Observer<Timestamped<Item>, Err>,
  SD: Scheduler,
{
  fn next(&mut self, value: Item) {
    let timestamp = self.scheduler.now();
    self.observer.next(Timestamped { value, timestamp });
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, SD, O> CoreObservable<O> for Timestamp<S, SD>
where
  S: CoreObservable<TimestampObserver<O, SD>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Timestamp { source, scheduler } = self;
    source.actual_subscribe(TimestampObserver { observer, scheduler })
  }
}

// ==================== TimeInterval ====================

#[derive(Clone)]
pub struct TimeInterval<S, SD> {
  pub source: S,
  pub scheduler: SD,
}

impl<S: ObservableType, SD> ObservableType for TimeInterval<S, SD> {
  type Item = TimeIntervalValue<S::Item>;
  type Err = S::Err;
}

pub struct TimeIntervalObserver<O, SD> {
  observer: O,
  scheduler: SD,
  last: Instant,
}

impl<O, SD, Item, Err> Observer<Item, Err> for TimeIntervalObserver<O, SD>
where
  O: Observer<TimeIntervalValue<Item>, Err>,
  SD: Scheduler,
{
  fn next(&mut self, value: Item) {
    let now = self.scheduler.now();
    let interval = now.saturating_duration_since(self.last);
    self.last = now;
    self.observer.next(TimeIntervalValue { value, interval });
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, SD, O> CoreObservable<O> for TimeInterval<S, SD>
where
  S: CoreObservable<TimeIntervalObserver<O, SD>>,
  SD: Scheduler,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let TimeInterval { source, scheduler } = self;
    let last = scheduler.now();
    source.actual_subscribe(TimeIntervalObserver { observer, scheduler, last })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn stamps_with_scheduler_time() {
    TestScheduler::init();
    let start = TestScheduler.now();
    let subject: Subject<i32> = Subject::new();
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    subject
      .clone()
      .timestamp_on(TestScheduler)
      .subscribe(move |v| c_out.lock().unwrap().push(v));
    TestScheduler::advance_by(Duration::from_millis(5));
    subject.clone().next(1);
    assert_eq!(
      *out.lock().unwrap(),
      vec![Timestamped { value: 1, timestamp: start + Duration::from_millis(5) }]
    );
  }

  #[rxcore_macro::test]
  fn measures_gaps() {
    TestScheduler::init();
    let subject: Subject<i32> = Subject::new();
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    subject
      .clone()
      .time_interval_on(TestScheduler)
      .subscribe(move |v| c_out.lock().unwrap().push(v.interval));
    TestScheduler::advance_by(Duration::from_millis(3));
    subject.clone().next(1);
    TestScheduler::advance_by(Duration::from_millis(7));
    subject.clone().next(2);
    subject.clone().next(3);
    assert_eq!(
      *out.lock().unwrap(),
      vec![Duration::from_millis(3), Duration::from_millis(7), Duration::ZERO]
    );
  }
}
