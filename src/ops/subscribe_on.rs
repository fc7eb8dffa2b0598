//! SubscribeOn operator implementation

use crate::{
  observable::{CoreObservable, ObservableType},
  scheduler::{Scheduler, Task, TaskHandle},
  subscription::{SerialSubscription, SourceWithHandle},
};

/// Subscribes to the source from a task on `scheduler`.
///
/// Only the subscription moves; notifications are delivered wherever the
/// source produces them. Unsubscribing before the task ran cancels it.
#[derive(Clone)]
pub struct SubscribeOn<S, SD> {
  pub source: S,
  pub scheduler: SD,
}

impl<S: ObservableType, SD> ObservableType for SubscribeOn<S, SD> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, SD, O> CoreObservable<O> for SubscribeOn<S, SD>
where
  S: CoreObservable<O> + Send + 'static,
  S::Unsub: Send + 'static,
  O: Send + 'static,
  SD: Scheduler,
{
  type Unsub = SourceWithHandle<SerialSubscription, TaskHandle>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let SubscribeOn { source, scheduler } = self;
    let upstream = SerialSubscription::new();
    let c_upstream = upstream.clone();
    let handle = scheduler.schedule(
      Task::once(move || c_upstream.set(source.actual_subscribe(observer))),
      None,
    );
    SourceWithHandle::new(upstream, handle)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn subscription_runs_in_the_task() {
    TestScheduler::init();
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    observable::range(0, 3)
      .subscribe_on(TestScheduler)
      .subscribe(move |v| c_out.lock().unwrap().push(v));
    assert!(out.lock().unwrap().is_empty());
    TestScheduler::flush();
    assert_eq!(*out.lock().unwrap(), vec![0, 1, 2]);
  }

  #[rxcore_macro::test]
  fn cancel_before_the_task_runs() {
    TestScheduler::init();
    let subject: Subject<i32> = Subject::new();
    let sub = subject.clone().subscribe_on(TestScheduler).subscribe(|_| {});
    sub.unsubscribe();
    TestScheduler::flush();
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[rxcore_macro::test]
  fn unsubscribe_after_the_task_ran() {
    TestScheduler::init();
    let subject: Subject<i32> = Subject::new();
    let sub = subject.clone().subscribe_on(TestScheduler).subscribe(|_| {});
    TestScheduler::flush();
    assert_eq!(subject.subscriber_count(), 1);
    sub.unsubscribe();
    assert_eq!(subject.subscriber_count(), 0);
  }
}
