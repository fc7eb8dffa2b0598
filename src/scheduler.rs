//! Schedulers decide when and where work runs.
//!
//! A [`Task`] is a resumable unit of work: every step reports whether it is
//! finished, wants to run again right away, or wants to sleep. That lets one
//! scheduled task drive a whole periodic source (interval, periodic timer,
//! buffer boundaries) instead of rescheduling itself by hand.
//!
//! Scheduling returns a [`TaskHandle`]; unsubscribing it cancels the task
//! before its next step. A step already running is not interrupted.

mod current_thread;
mod default;
mod immediate;
mod main_thread;
mod test_scheduler;
#[cfg(feature = "thread-pool")]
mod thread_pool;

use std::{
  sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
  },
  task::Waker,
};

pub use current_thread::CurrentThreadScheduler;
pub use default::DefaultScheduler;
pub use immediate::ImmediateScheduler;
pub use main_thread::{MainLoop, MainThreadScheduler};
pub use std::time::{Duration, Instant};
pub use test_scheduler::TestScheduler;
#[cfg(feature = "thread-pool")]
pub use thread_pool::{ThreadPoolScheduler, ThreadPoolSchedulerBuilder};

use crate::subscription::Subscription;

/// Outcome of one [`Task::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
  Finished,
  /// Run again as soon as possible.
  Yield,
  /// Run again after the given duration.
  Sleeping(Duration),
}

/// A resumable unit of work.
pub struct Task {
  step: Box<dyn FnMut() -> TaskState + Send>,
}

impl Task {
  /// A task over explicit state, stepped by a plain function.
  pub fn new<S: Send + 'static>(mut state: S, handler: fn(&mut S) -> TaskState) -> Self {
    Self::from_fn(move || handler(&mut state))
  }

  pub fn from_fn<F>(step: F) -> Self
  where
    F: FnMut() -> TaskState + Send + 'static,
  {
    Self { step: Box::new(step) }
  }

  /// A task that runs `f` once and finishes.
  pub fn once<F>(f: F) -> Self
  where
    F: FnOnce() + Send + 'static,
  {
    let mut f = Some(f);
    Self::from_fn(move || {
      if let Some(f) = f.take() {
        f();
      }
      TaskState::Finished
    })
  }

  #[inline]
  pub fn step(&mut self) -> TaskState { (self.step)() }
}

struct TaskShared {
  cancelled: AtomicBool,
  finished: AtomicBool,
  waker: Mutex<Option<Waker>>,
}

/// Cancellation handle of a scheduled task.
#[derive(Clone)]
pub struct TaskHandle {
  inner: Option<Arc<TaskShared>>,
}

impl TaskHandle {
  pub fn new() -> Self {
    Self {
      inner: Some(Arc::new(TaskShared {
        cancelled: AtomicBool::new(false),
        finished: AtomicBool::new(false),
        waker: Mutex::new(None),
      })),
    }
  }

  /// A handle for work that already ran.
  pub fn finished() -> Self { Self { inner: None } }

  pub fn is_cancelled(&self) -> bool {
    self
      .inner
      .as_ref()
      .is_some_and(|s| s.cancelled.load(Ordering::Acquire))
  }

  pub fn is_finished(&self) -> bool {
    self
      .inner
      .as_ref()
      .is_none_or(|s| s.finished.load(Ordering::Acquire))
  }

  pub(crate) fn mark_finished(&self) {
    if let Some(s) = &self.inner {
      s.finished.store(true, Ordering::Release);
    }
  }

  /// Remembers the waker of a sleeping future so cancellation can wake it.
  pub(crate) fn register_waker(&self, waker: &Waker) {
    if let Some(s) = &self.inner {
      let mut slot = s.waker.lock().unwrap_or_else(PoisonError::into_inner);
      if !slot.as_ref().is_some_and(|w| w.will_wake(waker)) {
        *slot = Some(waker.clone());
      }
    }
  }
}

impl Default for TaskHandle {
  fn default() -> Self { Self::new() }
}

impl Subscription for TaskHandle {
  fn unsubscribe(self) {
    if let Some(s) = &self.inner {
      s.cancelled.store(true, Ordering::Release);
      let waker = s
        .waker
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
      if let Some(waker) = waker {
        waker.wake();
      }
    }
  }

  fn is_closed(&self) -> bool { self.is_finished() || self.is_cancelled() }
}

/// Where and when tasks run.
///
/// Object safe: `Arc<dyn Scheduler>` is itself a scheduler, which is how the
/// process-wide default is injected.
pub trait Scheduler: Send + Sync {
  /// The scheduler's notion of the current time.
  fn now(&self) -> Instant;

  /// Runs `task` after `delay` (or as soon as possible for `None`).
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle;
}

impl<T: Scheduler + ?Sized> Scheduler for Arc<T> {
  #[inline]
  fn now(&self) -> Instant { (**self).now() }

  #[inline]
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    (**self).schedule(task, delay)
  }
}

/// Steps `task` on the current thread until it finishes or `handle` is
/// cancelled, sleeping the thread between steps when asked to.
pub(crate) fn run_blocking(mut task: Task, handle: &TaskHandle) {
  loop {
    if handle.is_cancelled() {
      return;
    }
    match task.step() {
      TaskState::Finished => {
        handle.mark_finished();
        return;
      }
      TaskState::Yield => {}
      TaskState::Sleeping(duration) => std::thread::sleep(duration),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicUsize;

  use super::*;

  #[rxcore_macro::test]
  fn task_state_drives_steps() {
    let mut task = Task::new(0, |n| {
      *n += 1;
      if *n < 3 { TaskState::Yield } else { TaskState::Finished }
    });
    assert_eq!(task.step(), TaskState::Yield);
    assert_eq!(task.step(), TaskState::Yield);
    assert_eq!(task.step(), TaskState::Finished);
  }

  #[rxcore_macro::test]
  fn once_runs_a_single_time() {
    let hits = Arc::new(AtomicUsize::new(0));
    let c_hits = hits.clone();
    let mut task = Task::once(move || {
      c_hits.fetch_add(1, Ordering::SeqCst);
    });
    task.step();
    task.step();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[rxcore_macro::test]
  fn handle_states() {
    let handle = TaskHandle::new();
    assert!(!handle.is_closed());
    handle.clone().unsubscribe();
    assert!(handle.is_cancelled());
    assert!(handle.is_closed());
    handle.clone().unsubscribe();

    assert!(TaskHandle::finished().is_closed());
  }

  #[rxcore_macro::test]
  fn dyn_scheduler_is_a_scheduler() {
    let scheduler: Arc<dyn Scheduler> = Arc::new(ImmediateScheduler);
    let hits = Arc::new(AtomicUsize::new(0));
    let c_hits = hits.clone();
    let handle = scheduler.schedule(
      Task::once(move || {
        c_hits.fetch_add(1, Ordering::SeqCst);
      }),
      None,
    );
    assert!(handle.is_finished());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }
}
