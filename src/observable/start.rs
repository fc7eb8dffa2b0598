use std::sync::Arc;

use crate::{
  error::RxError,
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  scheduler::{DefaultScheduler, Scheduler, Task, TaskHandle},
  subject::AsyncSubject,
};

/// Runs `func` on the default scheduler and emits its result, then
/// completes.
///
/// Cold: every subscription schedules its own call.
pub fn start<F, Item>(func: F) -> Start<F, DefaultScheduler>
where
  F: FnOnce() -> Item,
{
  start_on(func, DefaultScheduler)
}

pub fn start_on<F, Item, SD>(func: F, scheduler: SD) -> Start<F, SD>
where
  F: FnOnce() -> Item,
  SD: Scheduler,
{
  Start { func, scheduler }
}

#[derive(Clone)]
pub struct Start<F, SD> {
  pub func: F,
  pub scheduler: SD,
}

impl<F, Item, SD> ObservableType for Start<F, SD>
where
  F: FnOnce() -> Item,
{
  type Item = Item;
  type Err = RxError;
}

impl<F, Item, SD, O> CoreObservable<O> for Start<F, SD>
where
  F: FnOnce() -> Item + Send + 'static,
  SD: Scheduler,
  O: Observer<Item, RxError> + Send + 'static,
{
  type Unsub = TaskHandle;

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    let Start { func, scheduler } = self;
    let task = Task::once(move || {
      if observer.is_closed() {
        return;
      }
      observer.next(func());
      observer.complete();
    });
    scheduler.schedule(task, None)
  }
}

/// Turns `func` into a function that starts it on the default scheduler
/// each time it is called.
///
/// Unlike [`start`], the work begins when the returned function is called,
/// not on subscription. The result is held in an [`AsyncSubject`], so every
/// subscriber, early or late, sees the one value followed by completion.
pub fn to_async<F, Item>(func: F) -> impl Fn() -> AsyncSubject<Item> + Send + Sync
where
  F: Fn() -> Item + Send + Sync + 'static,
  Item: Clone + Send + 'static,
{
  to_async_on(func, DefaultScheduler)
}

pub fn to_async_on<F, Item, SD>(func: F, scheduler: SD) -> impl Fn() -> AsyncSubject<Item> + Send + Sync
where
  F: Fn() -> Item + Send + Sync + 'static,
  Item: Clone + Send + 'static,
  SD: Scheduler,
{
  let func = Arc::new(func);
  move || {
    let subject = AsyncSubject::new();
    let mut result = subject.clone();
    let func = func.clone();
    scheduler.schedule(
      Task::once(move || {
        result.next(func());
        result.complete();
      }),
      None,
    );
    subject
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  };

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn start_runs_once_per_subscription() {
    TestScheduler::init();
    let calls = Arc::new(AtomicUsize::new(0));
    let log = Arc::new(Mutex::new(Vec::new()));
    let c_calls = calls.clone();
    let source = observable::start_on(
      move || c_calls.fetch_add(1, Ordering::SeqCst) * 10,
      TestScheduler,
    );

    for _ in 0..2 {
      let (n, c) = (log.clone(), log.clone());
      source.clone().subscribe_complete(
        move |v| n.lock().unwrap().push(v.to_string()),
        move || c.lock().unwrap().push("done".to_string()),
      );
    }
    assert!(log.lock().unwrap().is_empty());

    TestScheduler::flush();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(*log.lock().unwrap(), vec!["0", "done", "10", "done"]);
  }

  #[rxcore_macro::test]
  fn start_cancelled_before_it_runs() {
    TestScheduler::init();
    let calls = Arc::new(AtomicUsize::new(0));
    let c_calls = calls.clone();
    let handle = observable::start_on(move || c_calls.fetch_add(1, Ordering::SeqCst), TestScheduler)
      .subscribe(|_| {});
    handle.unsubscribe();

    TestScheduler::flush();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[rxcore_macro::test]
  fn to_async_starts_on_call_and_shares_the_result() {
    TestScheduler::init();
    let calls = Arc::new(AtomicUsize::new(0));
    let c_calls = calls.clone();
    let compute = observable::to_async_on(
      move || {
        c_calls.fetch_add(1, Ordering::SeqCst);
        "answer"
      },
      TestScheduler,
    );

    let result = compute();
    TestScheduler::flush();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let log = Arc::new(Mutex::new(Vec::new()));
    for _ in 0..2 {
      let (n, c) = (log.clone(), log.clone());
      result.clone().subscribe_complete(
        move |v| n.lock().unwrap().push(v),
        move || c.lock().unwrap().push("done"),
      );
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*log.lock().unwrap(), vec!["answer", "done", "answer", "done"]);

    let _again = compute();
    TestScheduler::flush();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[cfg(feature = "thread-pool")]
  #[rxcore_macro::test]
  fn start_runs_on_a_pool_thread() {
    let pool = ThreadPoolScheduler::new().unwrap();
    let caller = std::thread::current().id();
    let (tx, rx) = std::sync::mpsc::channel();
    observable::start_on(move || std::thread::current().id(), pool).subscribe(move |id| {
      let _ = tx.send(id);
    });
    let ran_on = rx.recv().unwrap();
    assert_ne!(ran_on, caller);
  }
}
