//! Subjects: hot observables you push values into.
//!
//! Every variant is a [`BaseSubject`] with a different retention policy:
//!
//! | alias             | a late subscriber first receives              |
//! |-------------------|-----------------------------------------------|
//! | [`Subject`]       | nothing                                       |
//! | [`BehaviorSubject`] | the latest value (the seed before any `next`) |
//! | [`AsyncSubject`]  | the last value, once the subject completed    |
//! | [`ReplaySubject`] | the retained buffer, by count and/or age      |
//!
//! Terminal state is permanent: subscribing after `complete`/`error` gets
//! the replay (if any) followed by the terminal event.
//!
//! Delivery to one subscriber is serialized through its own slot, so an
//! observer must not push into the very subject it is subscribed to.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use rxcore::prelude::*;
//!
//! let mut subject: BehaviorSubject<i32> = BehaviorSubject::new(0);
//! subject.next(1);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let c_seen = seen.clone();
//! subject.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));
//! subject.next(2);
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
//! ```

mod policy;
mod subject_core;
mod subject_subscription;

use std::sync::Arc;

pub use policy::{AsyncLast, Behavior, Publish, Replay, SubjectPhase, SubjectPolicy};
pub use subject_core::BaseSubject;
pub use subject_subscription::SubjectSubscription;

use crate::{
  error::RxError,
  scheduler::{Duration, Scheduler},
};

pub type Subject<Item, Err = RxError> = BaseSubject<Item, Err, Publish>;
pub type BehaviorSubject<Item, Err = RxError> = BaseSubject<Item, Err, Behavior<Item>>;
pub type AsyncSubject<Item, Err = RxError> = BaseSubject<Item, Err, AsyncLast<Item>>;
pub type ReplaySubject<Item, Err = RxError> = BaseSubject<Item, Err, Replay<Item>>;

impl<Item, Err> BaseSubject<Item, Err, Publish> {
  pub fn new() -> Self { Self::with_policy(Publish) }
}

impl<Item, Err> Default for BaseSubject<Item, Err, Publish> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> BaseSubject<Item, Err, Behavior<Item>> {
  pub fn new(seed: Item) -> Self { Self::with_policy(Behavior { value: seed }) }

  /// The value a new subscriber would receive.
  pub fn value(&self) -> Item
  where
    Item: Clone,
  {
    self.state.rc_deref_mut().policy.value.clone()
  }
}

impl<Item, Err> BaseSubject<Item, Err, AsyncLast<Item>> {
  pub fn new() -> Self { Self::with_policy(AsyncLast::default()) }
}

impl<Item, Err> BaseSubject<Item, Err, Replay<Item>> {
  pub fn unbounded() -> Self { Self::with_policy(Replay::new(None, None)) }

  /// Keeps the last `count` values.
  pub fn with_count(count: usize) -> Self { Self::with_policy(Replay::new(Some(count), None)) }

  /// Keeps values younger than `window`, by the default scheduler's clock.
  pub fn with_window(window: Duration) -> Self { Self::with_policy(Replay::new(None, Some(window))) }

  /// Keeps values younger than `window`, by `clock`.
  pub fn with_window_on<SD: Scheduler + 'static>(window: Duration, clock: SD) -> Self {
    Self::with_policy(Replay::with_clock(None, Some(window), Arc::new(clock)))
  }

  pub fn with_count_and_window(count: usize, window: Duration) -> Self {
    Self::with_policy(Replay::new(Some(count), Some(window)))
  }

  pub fn with_count_and_window_on<SD: Scheduler + 'static>(
    count: usize, window: Duration, clock: SD,
  ) -> Self {
    Self::with_policy(Replay::with_clock(Some(count), Some(window), Arc::new(clock)))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::{
    prelude::*,
    subject::{Publish, SubjectSubscription},
  };

  macro_rules! record {
    ($source:expr) => {{
      let log = Arc::new(Mutex::new(Vec::<String>::new()));
      let (n, e, c) = (log.clone(), log.clone(), log.clone());
      let sub = $source.subscribe_all(
        move |v| n.lock().unwrap().push(format!("{v}")),
        move |err| e.lock().unwrap().push(format!("error: {err}")),
        move || c.lock().unwrap().push("complete".to_string()),
      );
      (log, sub)
    }};
  }

  fn logged(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> { log.lock().unwrap().clone() }

  #[rxcore_macro::test]
  fn plain_forwards_only_live_values() {
    let mut subject: Subject<i32> = Subject::new();
    subject.next(1);
    let (log, _sub) = record!(subject.clone());
    subject.next(2);
    subject.next(3);
    subject.clone().complete();
    subject.next(4);
    assert_eq!(logged(&log), vec!["2", "3", "complete"]);

    let (late, _sub) = record!(subject.clone());
    assert_eq!(logged(&late), vec!["complete"]);
  }

  #[rxcore_macro::test]
  fn terminal_state_is_permanent() {
    let mut subject: Subject<i32> = Subject::new();
    let (log, sub) = record!(subject.clone());
    subject.clone().error(RxError::msg("boom"));
    subject.clone().complete();
    subject.next(1);
    assert!(sub.is_closed());
    assert!(subject.is_terminated());
    assert_eq!(logged(&log), vec!["error: boom"]);

    let (late, _) = record!(subject.clone());
    assert_eq!(logged(&late), vec!["error: boom"]);
  }

  #[rxcore_macro::test]
  fn unsubscribe_removes_only_that_observer() {
    let mut subject: Subject<i32> = Subject::new();
    let (a, sub_a) = record!(subject.clone());
    let (b, _sub_b) = record!(subject.clone());
    assert_eq!(subject.subscriber_count(), 2);

    subject.next(1);
    sub_a.unsubscribe();
    subject.next(2);
    assert_eq!(subject.subscriber_count(), 1);
    assert_eq!(logged(&a), vec!["1"]);
    assert_eq!(logged(&b), vec!["1", "2"]);
  }

  #[rxcore_macro::test]
  fn observer_can_unsubscribe_another_mid_emission() {
    let mut subject: Subject<i32> = Subject::new();
    let victim = Arc::new(Mutex::new(None));
    let c_victim = victim.clone();
    let first = subject.clone().subscribe(move |_| {
      if let Some(sub) = c_victim.lock().unwrap().take() {
        Subscription::unsubscribe(sub);
      }
    });
    let (b, sub_b) = record!(subject.clone());
    *victim.lock().unwrap() = Some(sub_b);

    subject.next(1);
    subject.next(2);
    assert!(logged(&b).is_empty());
    assert_eq!(subject.subscriber_count(), 1);
    first.unsubscribe();
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[rxcore_macro::test]
  fn observer_can_unsubscribe_itself() {
    let mut subject: Subject<i32> = Subject::new();
    let own = Arc::new(Mutex::new(None::<SubjectSubscription<i32, RxError, Publish>>));
    let c_own = own.clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let c_seen = seen.clone();
    let sub = subject.clone().subscribe(move |v| {
      c_seen.lock().unwrap().push(v);
      if let Some(sub) = c_own.lock().unwrap().take() {
        sub.unsubscribe();
      }
    });
    *own.lock().unwrap() = Some(sub);
    subject.next(1);
    subject.next(2);
    assert_eq!(*seen.lock().unwrap(), vec![1]);
  }

  #[rxcore_macro::test]
  fn behavior_replays_latest() {
    let mut subject: BehaviorSubject<i32> = BehaviorSubject::new(0);
    let (first, _) = record!(subject.clone());
    subject.next(1);
    subject.next(2);
    let (second, _) = record!(subject.clone());
    subject.next(3);
    assert_eq!(subject.value(), 3);
    subject.clone().complete();
    let (late, _) = record!(subject.clone());

    assert_eq!(logged(&first), vec!["0", "1", "2", "3", "complete"]);
    assert_eq!(logged(&second), vec!["2", "3", "complete"]);
    assert_eq!(logged(&late), vec!["complete"]);
  }

  #[rxcore_macro::test]
  fn async_releases_last_value_on_completion() {
    let mut subject: AsyncSubject<i32> = AsyncSubject::new();
    let (early, _) = record!(subject.clone());
    subject.next(1);
    subject.next(2);
    assert!(logged(&early).is_empty());
    subject.clone().complete();
    let (late, _) = record!(subject.clone());
    assert_eq!(logged(&early), vec!["2", "complete"]);
    assert_eq!(logged(&late), vec!["2", "complete"]);
  }

  #[rxcore_macro::test]
  fn async_error_never_emits_value() {
    let mut subject: AsyncSubject<i32> = AsyncSubject::new();
    let (early, _) = record!(subject.clone());
    subject.next(1);
    subject.clone().error(RxError::msg("nope"));
    let (late, _) = record!(subject.clone());
    assert_eq!(logged(&early), vec!["error: nope"]);
    assert_eq!(logged(&late), vec!["error: nope"]);
  }

  #[rxcore_macro::test]
  fn replay_count_keeps_tail() {
    let mut subject: ReplaySubject<i32> = ReplaySubject::with_count(2);
    for v in 1..=4 {
      subject.next(v);
    }
    let (live, _) = record!(subject.clone());
    subject.next(5);
    subject.clone().complete();
    let (late, _) = record!(subject.clone());
    assert_eq!(logged(&live), vec!["3", "4", "5", "complete"]);
    assert_eq!(logged(&late), vec!["4", "5", "complete"]);
  }

  #[rxcore_macro::test]
  fn replay_unbounded_after_error() {
    let mut subject: ReplaySubject<i32> = ReplaySubject::unbounded();
    subject.next(1);
    subject.next(2);
    subject.clone().error(RxError::SequenceEmpty);
    let (late, _) = record!(subject.clone());
    assert_eq!(logged(&late), vec!["1", "2", "error: sequence contains no elements"]);
  }

  #[rxcore_macro::test]
  fn replay_window_drops_old_values() {
    TestScheduler::init();
    let mut subject: ReplaySubject<i32> =
      ReplaySubject::with_window_on(Duration::from_millis(100), TestScheduler);
    subject.next(1);
    TestScheduler::advance_by(Duration::from_millis(60));
    subject.next(2);
    TestScheduler::advance_by(Duration::from_millis(60));
    subject.next(3);
    let (late, _) = record!(subject.clone());
    assert_eq!(logged(&late), vec!["2", "3"]);
  }

  #[rxcore_macro::test]
  fn emits_from_another_thread() {
    let subject: Subject<i32> = Subject::new();
    let (log, _sub) = record!(subject.clone());
    let mut producer = subject.clone();
    std::thread::spawn(move || {
      for v in 0..3 {
        producer.next(v);
      }
      producer.complete();
    })
    .join()
    .unwrap();
    assert_eq!(logged(&log), vec!["0", "1", "2", "complete"]);
  }

  #[rxcore_macro::test]
  fn reentrant_next_panics_instead_of_hanging() {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    let subject: Subject<i32> = Subject::new();
    let c_subject = subject.clone();
    subject.clone().subscribe(move |v| {
      if v == 1 {
        c_subject.clone().next(2);
      }
    });
    let result = catch_unwind(AssertUnwindSafe(|| subject.clone().next(1)));
    assert!(result.is_err());

    // The failed delivery leaves nothing behind on this thread.
    let other: Subject<i32> = Subject::new();
    let (log, _sub) = record!(other.clone());
    other.clone().next(7);
    assert_eq!(logged(&log), vec!["7"]);
  }

  #[rxcore_macro::test]
  fn reentrant_complete_panics() {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    let subject: Subject<i32> = Subject::new();
    let c_subject = subject.clone();
    subject.clone().subscribe(move |_| c_subject.clone().complete());
    let result = catch_unwind(AssertUnwindSafe(|| subject.clone().next(1)));
    assert!(result.is_err());
  }

  #[rxcore_macro::test]
  fn reentrant_push_during_replay_panics() {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    let subject: BehaviorSubject<i32> = BehaviorSubject::new(0);
    let c_subject = subject.clone();
    let result = catch_unwind(AssertUnwindSafe(|| {
      subject.clone().subscribe(move |v| {
        if v == 0 {
          c_subject.clone().next(1);
        }
      })
    }));
    assert!(result.is_err());
  }

  #[rxcore_macro::test]
  fn feeding_another_subject_from_a_subscriber_is_fine() {
    let first: Subject<i32> = Subject::new();
    let second: Subject<i32> = Subject::new();
    let (log, _sub) = record!(second.clone());
    let c_second = second.clone();
    first.clone().subscribe(move |v| c_second.clone().next(v * 10));
    first.clone().next(1);
    first.clone().next(2);
    assert_eq!(logged(&log), vec!["10", "20"]);
  }
}
