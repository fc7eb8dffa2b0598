//! Delay operator implementation
//!
//! Every notification, terminal ones included, is queued and replayed
//! `delay` later. Each scheduled task delivers the oldest queued
//! notification, so order is kept even on schedulers that do not run tasks
//! in submission order.

use std::collections::VecDeque;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::{Notification, Observer},
  rc::MutArc,
  scheduler::{Duration, Scheduler, Task},
  subscription::{CompositeSubscription, TupleSubscription},
};

#[derive(Clone)]
pub struct Delay<S, SD> {
  pub source: S,
  pub delay: Duration,
  pub scheduler: SD,
}

impl<S: ObservableType, SD> ObservableType for Delay<S, SD> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct DelayState<O, Item, Err> {
  observer: Option<O>,
  queue: VecDeque<Notification<Item, Err>>,
}

pub struct DelayObserver<O, Item, Err, SD> {
  state: MutArc<DelayState<O, Item, Err>>,
  tasks: CompositeSubscription,
  delay: Duration,
  scheduler: SD,
}

impl<O, Item, Err, SD> DelayObserver<O, Item, Err, SD>
where
  O: Observer<Item, Err> + Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
  SD: Scheduler,
{
  fn enqueue(&self, notification: Notification<Item, Err>) {
    self.state.rc_deref_mut().queue.push_back(notification);
    let state = self.state.clone();
    let task = Task::once(move || {
      let mut state = state.rc_deref_mut();
      if let Some(notification) = state.queue.pop_front() {
        notification.deliver(&mut state.observer);
      }
    });
    self.tasks.add(self.scheduler.schedule(task, Some(self.delay)));
  }
}

impl<O, Item, Err, SD> Observer<Item, Err> for DelayObserver<O, Item, Err, SD>
where
  O: Observer<Item, Err> + Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
  SD: Scheduler,
{
  fn next(&mut self, value: Item) { self.enqueue(Notification::Next(value)); }

  fn error(self, err: Err) { self.enqueue(Notification::Error(err)); }

  fn complete(self) { self.enqueue(Notification::Complete); }

  fn is_closed(&self) -> bool {
    self.state.rc_deref_mut().observer.as_ref().is_none_or(O::is_closed)
  }
}

impl<S, SD, O> CoreObservable<O> for Delay<S, SD>
where
  S: CoreObservable<DelayObserver<O, <S as ObservableType>::Item, <S as ObservableType>::Err, SD>>,
  SD: Scheduler,
{
  type Unsub = TupleSubscription<CompositeSubscription, S::Unsub>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Delay { source, delay, scheduler } = self;
    let state = MutArc::own(DelayState { observer: Some(observer), queue: VecDeque::new() });
    let tasks = CompositeSubscription::new();
    let observer = DelayObserver { state, tasks: tasks.clone(), delay, scheduler };
    TupleSubscription::new(tasks, source.actual_subscribe(observer))
  }
}
