//! Sample operator implementation
//!
//! Every `period` the most recent value that arrived since the previous tick
//! is emitted; ticks without a fresh value emit nothing. A value still
//! pending when the source completes is emitted before completion.

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  scheduler::{Duration, Scheduler, Task, TaskHandle, TaskState},
  subscription::{SourceWithHandle, Subscription},
};

#[derive(Clone)]
pub struct Sample<S, SD> {
  pub source: S,
  pub period: Duration,
  pub scheduler: SD,
}

impl<S: ObservableType, SD> ObservableType for Sample<S, SD> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct SampleState<O, Item> {
  observer: Option<O>,
  latest: Option<Item>,
}

pub struct SampleObserver<O, Item> {
  state: MutArc<SampleState<O, Item>>,
  handle: TaskHandle,
}

fn tick<O, Item, Err>((state, period): &mut (MutArc<SampleState<O, Item>>, Duration)) -> TaskState
where
  O: Observer<Item, Err>,
{
  let mut state = state.rc_deref_mut();
  let latest = state.latest.take();
  match state.observer.as_mut() {
    None => TaskState::Finished,
    Some(observer) => {
      if let Some(value) = latest {
        observer.next(value);
      }
      TaskState::Sleeping(*period)
    }
  }
}

impl<O, Item, Err> Observer<Item, Err> for SampleObserver<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.state.rc_deref_mut().latest = Some(value); }

  fn error(self, err: Err) {
    let observer = self.state.rc_deref_mut().observer.take();
    self.handle.unsubscribe();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    let (observer, latest) = {
      let mut state = self.state.rc_deref_mut();
      (state.observer.take(), state.latest.take())
    };
    self.handle.unsubscribe();
    if let Some(mut observer) = observer {
      if let Some(value) = latest {
        observer.next(value);
      }
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool {
    self.state.rc_deref_mut().observer.as_ref().is_none_or(O::is_closed)
  }
}

impl<S, SD, O> CoreObservable<O> for Sample<S, SD>
where
  S: CoreObservable<SampleObserver<O, <S as ObservableType>::Item>>,
  S::Item: Send + 'static,
  O: Observer<S::Item, S::Err> + Send + 'static,
  SD: Scheduler,
{
  type Unsub = SourceWithHandle<S::Unsub, TaskHandle>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Sample { source, period, scheduler } = self;
    let state = MutArc::own(SampleState { observer: Some(observer), latest: None });
    let task = Task::new((state.clone(), period), tick::<O, S::Item, S::Err>);
    let handle = scheduler.schedule(task, Some(period));
    let unsub = source.actual_subscribe(SampleObserver { state, handle: handle.clone() });
    SourceWithHandle::new(unsub, handle)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn emits_latest_per_tick() {
    TestScheduler::init();
    let subject: Subject<i32> = Subject::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    subject
      .clone()
      .sample_on(Duration::from_millis(10), TestScheduler)
      .subscribe_complete(move |v| n.lock().unwrap().push(v), move || c.lock().unwrap().push(-1));

    subject.clone().next(1);
    subject.clone().next(2);
    TestScheduler::advance_by(Duration::from_millis(10));
    // quiet tick
    TestScheduler::advance_by(Duration::from_millis(10));
    subject.clone().next(3);
    TestScheduler::advance_by(Duration::from_millis(10));
    subject.clone().next(4);
    subject.clone().complete();
    assert_eq!(*log.lock().unwrap(), vec![2, 3, 4, -1]);
    TestScheduler::flush();
    assert_eq!(log.lock().unwrap().len(), 4);
  }
}
