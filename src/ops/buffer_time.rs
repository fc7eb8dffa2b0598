//! BufferTime operator implementation
//!
//! Values are collected into windows that open every `shift` and close
//! `span` after they opened. Every close emits the window, empty or not.
//! With `shift == span` the windows tile the timeline; a shorter shift makes
//! them overlap and a longer one leaves gaps where values are dropped.
//!
//! One scheduled task drives all boundaries: it sleeps until the next open or
//! close, handles closes first and then opens.

use std::collections::VecDeque;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  scheduler::{Duration, Scheduler, Task, TaskHandle, TaskState},
  subscription::{SourceWithHandle, Subscription},
};

/// Shortest boundary step; zero durations are rounded up to it.
const MIN_STEP: Duration = Duration::from_millis(1);

#[derive(Clone)]
pub struct BufferTime<S, SD> {
  pub source: S,
  pub span: Duration,
  pub shift: Duration,
  pub scheduler: SD,
}

impl<S: ObservableType, SD> ObservableType for BufferTime<S, SD> {
  type Item = Vec<S::Item>;
  type Err = S::Err;
}

// ==================== State ====================

pub struct BufferTimeState<O, Item> {
  observer: Option<O>,
  /// Open windows ordered by close offset.
  windows: VecDeque<(Duration, Vec<Item>)>,
  /// Offset since subscription at which the next window opens.
  next_open: Duration,
  /// Offset since subscription of the current boundary.
  now: Duration,
  span: Duration,
  shift: Duration,
}

impl<O, Item> BufferTimeState<O, Item> {
  fn next_wake(&self) -> Duration {
    let close = self.windows.front().map(|(at, _)| *at);
    let at = close.map_or(self.next_open, |close| close.min(self.next_open));
    at.saturating_sub(self.now)
  }
}

fn boundary<O, Item, Err>(state: &mut MutArc<BufferTimeState<O, Item>>) -> TaskState
where
  O: Observer<Vec<Item>, Err>,
{
  let mut state = state.rc_deref_mut();
  if state.observer.is_none() {
    return TaskState::Finished;
  }
  let wake = state.next_wake();
  state.now += wake;
  let now = state.now;

  while state.windows.front().is_some_and(|(at, _)| *at <= now) {
    let Some((_, window)) = state.windows.pop_front() else { break };
    if let Some(observer) = state.observer.as_mut() {
      observer.next(window);
    }
  }
  if state.next_open <= now {
    let close = now + state.span;
    state.windows.push_back((close, Vec::new()));
    state.next_open = now + state.shift;
  }

  if state.observer.as_ref().is_none_or(Observer::<Vec<Item>, Err>::is_closed) {
    TaskState::Finished
  } else {
    TaskState::Sleeping(state.next_wake())
  }
}

// ==================== Observer ====================

pub struct BufferTimeObserver<O, Item> {
  state: MutArc<BufferTimeState<O, Item>>,
  handle: TaskHandle,
}

impl<O, Item, Err> Observer<Item, Err> for BufferTimeObserver<O, Item>
where
  O: Observer<Vec<Item>, Err>,
  Item: Clone,
{
  fn next(&mut self, value: Item) {
    let mut state = self.state.rc_deref_mut();
    if let Some(((_, last), rest)) = state.windows.make_contiguous().split_last_mut() {
      for (_, window) in rest {
        window.push(value.clone());
      }
      last.push(value);
    }
  }

  fn error(self, err: Err) {
    let observer = {
      let mut state = self.state.rc_deref_mut();
      state.windows.clear();
      state.observer.take()
    };
    self.handle.unsubscribe();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    let (observer, windows) = {
      let mut state = self.state.rc_deref_mut();
      (state.observer.take(), std::mem::take(&mut state.windows))
    };
    self.handle.unsubscribe();
    if let Some(mut observer) = observer {
      for (_, window) in windows {
        if !window.is_empty() {
          observer.next(window);
        }
      }
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool {
    self.state.rc_deref_mut().observer.as_ref().is_none_or(O::is_closed)
  }
}

// ==================== CoreObservable ====================

impl<S, SD, O> CoreObservable<O> for BufferTime<S, SD>
where
  S: CoreObservable<BufferTimeObserver<O, <S as ObservableType>::Item>>,
  S::Item: Clone + Send + 'static,
  O: Observer<Vec<S::Item>, S::Err> + Send + 'static,
  SD: Scheduler,
{
  type Unsub = SourceWithHandle<S::Unsub, TaskHandle>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let BufferTime { source, span, shift, scheduler } = self;
    let span = span.max(MIN_STEP);
    let shift = shift.max(MIN_STEP);
    let state = MutArc::own(BufferTimeState {
      observer: Some(observer),
      windows: VecDeque::from([(span, Vec::new())]),
      next_open: shift,
      now: Duration::ZERO,
      span,
      shift,
    });

    let first = span.min(shift);
    let task = Task::new(state.clone(), boundary::<O, S::Item, S::Err>);
    let handle = scheduler.schedule(task, Some(first));
    let unsub = source.actual_subscribe(BufferTimeObserver { state, handle: handle.clone() });
    SourceWithHandle::new(unsub, handle)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  fn recorder() -> (Arc<Mutex<Vec<Vec<i32>>>>, impl FnMut(Vec<i32>) + Send + 'static) {
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    (out, move |v| c_out.lock().unwrap().push(v))
  }

  #[rxcore_macro::test]
  fn tiles_windows_and_emits_empty_ones() {
    TestScheduler::init();
    let subject: Subject<i32> = Subject::new();
    let (out, record) = recorder();
    let sub = subject
      .clone()
      .buffer_time_on(Duration::from_millis(10), TestScheduler)
      .subscribe(record);

    subject.clone().next(1);
    subject.clone().next(2);
    TestScheduler::advance_by(Duration::from_millis(10));
    TestScheduler::advance_by(Duration::from_millis(10));
    subject.clone().next(3);
    TestScheduler::advance_by(Duration::from_millis(10));
    assert_eq!(*out.lock().unwrap(), vec![vec![1, 2], vec![], vec![3]]);

    sub.unsubscribe();
    TestScheduler::advance_by(Duration::from_millis(50));
    assert_eq!(out.lock().unwrap().len(), 3);
  }

  #[rxcore_macro::test]
  fn overlapping_windows_share_values() {
    TestScheduler::init();
    let subject: Subject<i32> = Subject::new();
    let (out, record) = recorder();
    subject
      .clone()
      .buffer_time_shift_on(Duration::from_millis(20), Duration::from_millis(10), TestScheduler)
      .subscribe(record);

    subject.clone().next(1);
    TestScheduler::advance_by(Duration::from_millis(10));
    subject.clone().next(2);
    TestScheduler::advance_by(Duration::from_millis(10));
    assert_eq!(*out.lock().unwrap(), vec![vec![1, 2]]);
    TestScheduler::advance_by(Duration::from_millis(10));
    assert_eq!(*out.lock().unwrap(), vec![vec![1, 2], vec![2]]);
  }

  #[rxcore_macro::test]
  fn complete_flushes_open_windows() {
    TestScheduler::init();
    let subject: Subject<i32> = Subject::new();
    let (out, record) = recorder();
    subject
      .clone()
      .buffer_time_on(Duration::from_millis(10), TestScheduler)
      .subscribe(record);
    subject.clone().next(4);
    subject.clone().complete();
    assert_eq!(*out.lock().unwrap(), vec![vec![4]]);
    TestScheduler::flush();
    assert_eq!(out.lock().unwrap().len(), 1);
  }
}
