//! Timeout operator implementation
//!
//! A timer of `window` starts on subscription and restarts on every value.
//! When it fires first, the observer receives [`RxError::Timeout`] and the
//! upstream subscription is released, so nothing keeps running behind a
//! stream that already failed.

use crate::{
  error::RxError,
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  scheduler::{Duration, Scheduler, Task},
  subscription::{SerialSubscription, SourceWithHandle},
};

#[derive(Clone)]
pub struct Timeout<S, SD> {
  pub source: S,
  pub window: Duration,
  pub scheduler: SD,
}

impl<S: ObservableType, SD> ObservableType for Timeout<S, SD> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct TimeoutState<O> {
  observer: Option<O>,
  generation: u64,
}

pub struct TimeoutObserver<O, SD> {
  state: MutArc<TimeoutState<O>>,
  timer: SerialSubscription,
  upstream: SerialSubscription,
  window: Duration,
  scheduler: SD,
}

impl<O, SD: Scheduler> TimeoutObserver<O, SD> {
  fn arm<Item, Err>(&self, generation: u64)
  where
    O: Observer<Item, Err> + Send + 'static,
    Err: From<RxError>,
  {
    let state = self.state.clone();
    let upstream = self.upstream.clone();
    let window = self.window;
    let task = Task::once(move || {
      let observer = {
        let mut state = state.rc_deref_mut();
        if state.generation != generation {
          return;
        }
        state.observer.take()
      };
      if let Some(observer) = observer {
        tracing::debug!(?window, "timeout fired");
        observer.error(RxError::Timeout(window).into());
        upstream.dispose();
      }
    });
    self.timer.set(self.scheduler.schedule(task, Some(window)));
  }
}

impl<O, Item, Err, SD> Observer<Item, Err> for TimeoutObserver<O, SD>
where
  O: Observer<Item, Err> + Send + 'static,
  Err: From<RxError>,
  SD: Scheduler,
{
  fn next(&mut self, value: Item) {
    let generation = {
      let mut state = self.state.rc_deref_mut();
      let Some(observer) = state.observer.as_mut() else { return };
      observer.next(value);
      state.generation += 1;
      state.generation
    };
    self.arm::<Item, Err>(generation);
  }

  fn error(self, err: Err) {
    self.timer.dispose();
    let observer = self.state.rc_deref_mut().observer.take();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    self.timer.dispose();
    let observer = self.state.rc_deref_mut().observer.take();
    if let Some(observer) = observer {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool {
    self.state.rc_deref_mut().observer.as_ref().is_none_or(O::is_closed)
  }
}

impl<S, SD, O> CoreObservable<O> for Timeout<S, SD>
where
  S: CoreObservable<TimeoutObserver<O, SD>>,
  S::Unsub: Send + 'static,
  S::Err: From<RxError>,
  O: Observer<S::Item, S::Err> + Send + 'static,
  SD: Scheduler,
{
  type Unsub = SourceWithHandle<SerialSubscription, SerialSubscription>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Timeout { source, window, scheduler } = self;
    let timer = SerialSubscription::new();
    let upstream = SerialSubscription::new();
    let observer = TimeoutObserver {
      state: MutArc::own(TimeoutState { observer: Some(observer), generation: 0 }),
      timer: timer.clone(),
      upstream: upstream.clone(),
      window,
      scheduler,
    };
    observer.arm::<S::Item, S::Err>(0);
    upstream.set(source.actual_subscribe(observer));
    SourceWithHandle::new(upstream, timer)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn errors_after_silence_and_releases_upstream() {
    TestScheduler::init();
    let subject: Subject<i32> = Subject::new();
    let out = Arc::new(Mutex::new(Vec::new()));
    let err = Arc::new(Mutex::new(None));
    let (c_out, c_err) = (out.clone(), err.clone());
    subject
      .clone()
      .timeout_on(Duration::from_millis(30), TestScheduler)
      .subscribe_err(move |v| c_out.lock().unwrap().push(v), move |e| *c_err.lock().unwrap() = Some(e));

    TestScheduler::advance_by(Duration::from_millis(20));
    subject.clone().next(1);
    TestScheduler::advance_by(Duration::from_millis(20));
    subject.clone().next(2);
    assert!(err.lock().unwrap().is_none());

    TestScheduler::advance_by(Duration::from_millis(30));
    assert!(matches!(*err.lock().unwrap(), Some(RxError::Timeout(d)) if d == Duration::from_millis(30)));
    assert_eq!(subject.subscriber_count(), 0);
    subject.clone().next(3);
    assert_eq!(*out.lock().unwrap(), vec![1, 2]);
  }

  #[rxcore_macro::test]
  fn completion_cancels_the_timer() {
    TestScheduler::init();
    let err = Arc::new(Mutex::new(None));
    let c_err = err.clone();
    observable::of(1)
      .timeout_on(Duration::from_millis(10), TestScheduler)
      .subscribe_err(|_| {}, move |e| *c_err.lock().unwrap() = Some(e));
    TestScheduler::flush();
    assert!(err.lock().unwrap().is_none());
  }
}
