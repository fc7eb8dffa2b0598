//! ObserveOn operator implementation
//!
//! Notifications are queued and delivered by a drain task on the target
//! scheduler. At most one drain task exists per subscription, so delivery
//! order matches arrival order on every scheduler, the thread pool included.
//!
//! The queue and the observer sit behind separate locks: upstream can keep
//! pushing while a notification is being delivered.

use std::collections::VecDeque;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::{Notification, Observer},
  rc::MutArc,
  scheduler::{Scheduler, Task, TaskState},
  subscription::{CompositeSubscription, Subscription, TupleSubscription},
};

#[derive(Clone)]
pub struct ObserveOn<S, SD> {
  pub source: S,
  pub scheduler: SD,
}

impl<S: ObservableType, SD> ObservableType for ObserveOn<S, SD> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct ObserveOnQueue<Item, Err> {
  pending: VecDeque<Notification<Item, Err>>,
  draining: bool,
}

pub struct ObserveOnObserver<O, Item, Err, SD> {
  observer: MutArc<Option<O>>,
  queue: MutArc<ObserveOnQueue<Item, Err>>,
  drains: CompositeSubscription,
  scheduler: SD,
}

impl<O, Item, Err, SD> ObserveOnObserver<O, Item, Err, SD>
where
  O: Observer<Item, Err> + Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
  SD: Scheduler,
{
  fn push(&self, notification: Notification<Item, Err>) {
    let start = {
      let mut queue = self.queue.rc_deref_mut();
      queue.pending.push_back(notification);
      !std::mem::replace(&mut queue.draining, true)
    };
    if start {
      let observer = self.observer.clone();
      let queue = self.queue.clone();
      let task = Task::from_fn(move || {
        let next = {
          let mut queue = queue.rc_deref_mut();
          let next = queue.pending.pop_front();
          if next.is_none() {
            queue.draining = false;
          }
          next
        };
        match next {
          Some(notification) => {
            notification.deliver(&mut *observer.rc_deref_mut());
            TaskState::Yield
          }
          None => TaskState::Finished,
        }
      });
      self.drains.add(self.scheduler.schedule(task, None));
    }
  }
}

impl<O, Item, Err, SD> Observer<Item, Err> for ObserveOnObserver<O, Item, Err, SD>
where
  O: Observer<Item, Err> + Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
  SD: Scheduler,
{
  fn next(&mut self, value: Item) { self.push(Notification::Next(value)); }

  fn error(self, err: Err) { self.push(Notification::Error(err)); }

  fn complete(self) { self.push(Notification::Complete); }

  fn is_closed(&self) -> bool { self.drains.is_closed() || self.observer.rc_deref_mut().is_none() }
}

impl<S, SD, O> CoreObservable<O> for ObserveOn<S, SD>
where
  S: CoreObservable<
      ObserveOnObserver<O, <S as ObservableType>::Item, <S as ObservableType>::Err, SD>,
    >,
  SD: Scheduler,
{
  type Unsub = TupleSubscription<CompositeSubscription, S::Unsub>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let ObserveOn { source, scheduler } = self;
    let drains = CompositeSubscription::new();
    let observer = ObserveOnObserver {
      observer: MutArc::own(Some(observer)),
      queue: MutArc::own(ObserveOnQueue { pending: VecDeque::new(), draining: false }),
      drains: drains.clone(),
      scheduler,
    };
    TupleSubscription::new(drains, source.actual_subscribe(observer))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn delivers_in_order_on_the_target() {
    TestScheduler::init();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    observable::range(0, 3)
      .observe_on(TestScheduler)
      .subscribe_complete(move |v| n.lock().unwrap().push(v), move || c.lock().unwrap().push(-1));
    assert!(log.lock().unwrap().is_empty());
    TestScheduler::flush();
    assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, -1]);
  }

  #[cfg(feature = "thread-pool")]
  #[rxcore_macro::test]
  fn keeps_order_on_the_pool() {
    use std::sync::mpsc;

    let pool = ThreadPoolScheduler::new().unwrap();
    let (tx, rx) = mpsc::channel();
    let c_tx = tx.clone();
    observable::range(0, 100)
      .observe_on(pool)
      .subscribe_complete(move |v| tx.send(v).unwrap(), move || c_tx.send(-1).unwrap());
    let got: Vec<i64> = rx.iter().take(101).collect();
    let mut expected: Vec<i64> = (0..100).collect();
    expected.push(-1);
    assert_eq!(got, expected);
  }

  #[rxcore_macro::test]
  fn unsubscribe_drops_queued_notifications() {
    TestScheduler::init();
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    let sub = observable::range(0, 3)
      .observe_on(TestScheduler)
      .subscribe(move |v| c_out.lock().unwrap().push(v));
    sub.unsubscribe();
    TestScheduler::flush();
    assert!(out.lock().unwrap().is_empty());
  }
}
