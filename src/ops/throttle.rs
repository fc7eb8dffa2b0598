//! Throttle (debounce) operator implementation
//!
//! Each value restarts a quiet-period timer; the value is emitted only if the
//! timer fires before a newer value arrives. The pending timer lives in a
//! serial slot, so installing the next one cancels the previous one.

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  scheduler::{Duration, Scheduler, Task},
  subscription::{SerialSubscription, SourceWithHandle},
};

#[derive(Clone)]
pub struct Throttle<S, SD> {
  pub source: S,
  pub quiet: Duration,
  pub scheduler: SD,
}

impl<S: ObservableType, SD> ObservableType for Throttle<S, SD> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct ThrottleState<O, Item> {
  observer: Option<O>,
  trailing: Option<Item>,
  generation: u64,
}

pub struct ThrottleObserver<O, Item, SD> {
  state: MutArc<ThrottleState<O, Item>>,
  timer: SerialSubscription,
  quiet: Duration,
  scheduler: SD,
}

impl<O, Item, Err, SD> Observer<Item, Err> for ThrottleObserver<O, Item, SD>
where
  O: Observer<Item, Err> + Send + 'static,
  Item: Send + 'static,
  SD: Scheduler,
{
  fn next(&mut self, value: Item) {
    let generation = {
      let mut state = self.state.rc_deref_mut();
      state.generation += 1;
      state.trailing = Some(value);
      state.generation
    };
    let state = self.state.clone();
    let task = Task::once(move || {
      let mut state = state.rc_deref_mut();
      if state.generation != generation {
        return;
      }
      let value = state.trailing.take();
      if let (Some(observer), Some(value)) = (state.observer.as_mut(), value) {
        observer.next(value);
      }
    });
    self.timer.set(self.scheduler.schedule(task, Some(self.quiet)));
  }

  fn error(self, err: Err) {
    self.timer.dispose();
    let observer = {
      let mut state = self.state.rc_deref_mut();
      state.trailing = None;
      state.observer.take()
    };
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    self.timer.dispose();
    let (observer, trailing) = {
      let mut state = self.state.rc_deref_mut();
      (state.observer.take(), state.trailing.take())
    };
    if let Some(mut observer) = observer {
      if let Some(value) = trailing {
        observer.next(value);
      }
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool {
    self.state.rc_deref_mut().observer.as_ref().is_none_or(O::is_closed)
  }
}

impl<S, SD, O> CoreObservable<O> for Throttle<S, SD>
where
  S: CoreObservable<ThrottleObserver<O, <S as ObservableType>::Item, SD>>,
  SD: Scheduler,
{
  type Unsub = SourceWithHandle<S::Unsub, SerialSubscription>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Throttle { source, quiet, scheduler } = self;
    let state = MutArc::own(ThrottleState { observer: Some(observer), trailing: None, generation: 0 });
    let timer = SerialSubscription::new();
    let observer = ThrottleObserver { state, timer: timer.clone(), quiet, scheduler };
    SourceWithHandle::new(source.actual_subscribe(observer), timer)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn emits_after_quiet_period() {
    TestScheduler::init();
    let subject: Subject<i32> = Subject::new();
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    subject
      .clone()
      .throttle_on(Duration::from_millis(20), TestScheduler)
      .subscribe(move |v| c_out.lock().unwrap().push(v));

    subject.clone().next(1);
    TestScheduler::advance_by(Duration::from_millis(10));
    subject.clone().next(2);
    TestScheduler::advance_by(Duration::from_millis(19));
    assert!(out.lock().unwrap().is_empty());
    TestScheduler::advance_by(Duration::from_millis(1));
    assert_eq!(*out.lock().unwrap(), vec![2]);

    subject.clone().next(3);
    TestScheduler::advance_by(Duration::from_millis(30));
    assert_eq!(*out.lock().unwrap(), vec![2, 3]);
  }

  #[rxcore_macro::test]
  fn complete_emits_trailing_value() {
    TestScheduler::init();
    let subject: Subject<i32> = Subject::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    subject
      .clone()
      .throttle_on(Duration::from_millis(20), TestScheduler)
      .subscribe_complete(move |v| n.lock().unwrap().push(v), move || c.lock().unwrap().push(-1));
    subject.clone().next(5);
    subject.clone().complete();
    TestScheduler::flush();
    assert_eq!(*log.lock().unwrap(), vec![5, -1]);
  }
}
