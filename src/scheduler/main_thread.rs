//! A serial "main" context pumped by its owner.
//!
//! The host keeps a [`MainLoop`] and calls [`MainLoop::tick`] once per frame
//! (or [`MainLoop::tick_at`] with its own clock). Any thread may schedule
//! through a [`MainThreadScheduler`]; the work only runs inside `tick`.
//!
//! Time is quantized to ticks: `now()` is the frame time captured when the
//! current tick started, and a task due at `t` runs in the first tick whose
//! frame time is `>= t`. With a 16 ms frame a 10 ms delay therefore fires
//! 16 ms after scheduling. Work scheduled while a tick is running waits for
//! the next tick.

use std::sync::{Arc, Mutex, PoisonError};

use super::{Duration, Instant, Scheduler, Task, TaskHandle, TaskState};

struct Entry {
  due: Instant,
  seq: usize,
  task: Task,
  handle: TaskHandle,
}

struct MainState {
  frame_time: Instant,
  next_seq: usize,
  entries: Vec<Entry>,
}

impl MainState {
  fn push(&mut self, due: Instant, task: Task, handle: TaskHandle) {
    let seq = self.next_seq;
    self.next_seq += 1;
    self.entries.push(Entry { due, seq, task, handle });
  }
}

type Shared = Arc<Mutex<MainState>>;

fn lock(shared: &Shared) -> std::sync::MutexGuard<'_, MainState> {
  shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner side of the main context.
pub struct MainLoop {
  shared: Shared,
}

/// Scheduling side of the main context; cheap to clone and `Send`.
#[derive(Clone)]
pub struct MainThreadScheduler {
  shared: Shared,
}

impl MainLoop {
  pub fn new() -> Self { Self::starting_at(Instant::now()) }

  /// A loop whose first frame time is `start`.
  pub fn starting_at(start: Instant) -> Self {
    Self {
      shared: Arc::new(Mutex::new(MainState {
        frame_time: start,
        next_seq: 0,
        entries: Vec::new(),
      })),
    }
  }

  pub fn scheduler(&self) -> MainThreadScheduler { MainThreadScheduler { shared: self.shared.clone() } }

  /// Runs one frame at the current wall-clock time.
  pub fn tick(&self) -> usize { self.tick_at(Instant::now()) }

  /// Runs one frame at `now` and returns how many task steps ran.
  ///
  /// Due tasks run one at a time in (due time, submission) order. Frame
  /// time never moves backwards.
  pub fn tick_at(&self, now: Instant) -> usize {
    let (frame_time, mut batch) = {
      let mut state = lock(&self.shared);
      if now > state.frame_time {
        state.frame_time = now;
      }
      let frame_time = state.frame_time;
      let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut state.entries)
        .into_iter()
        .partition(|e| e.due <= frame_time);
      state.entries = pending;
      (frame_time, due)
    };
    batch.sort_by_key(|e| (e.due, e.seq));
    tracing::trace!(tasks = batch.len(), "main loop tick");

    let mut ran = 0;
    for mut entry in batch {
      if entry.handle.is_cancelled() {
        continue;
      }
      ran += 1;
      let next_due = match entry.task.step() {
        TaskState::Finished => {
          entry.handle.mark_finished();
          continue;
        }
        TaskState::Yield => frame_time,
        TaskState::Sleeping(duration) => frame_time + duration,
      };
      lock(&self.shared).push(next_due, entry.task, entry.handle);
    }
    ran
  }

  /// Number of tasks waiting for a future tick.
  pub fn pending_count(&self) -> usize { lock(&self.shared).entries.len() }

  /// Ticks every `frame` until `total` has elapsed, blocking the thread.
  pub fn run_for(&self, total: Duration, frame: Duration) {
    let deadline = Instant::now() + total;
    loop {
      self.tick();
      let now = Instant::now();
      if now >= deadline {
        break;
      }
      std::thread::sleep(frame.min(deadline - now));
    }
  }
}

impl Default for MainLoop {
  fn default() -> Self { Self::new() }
}

impl Scheduler for MainThreadScheduler {
  fn now(&self) -> Instant { lock(&self.shared).frame_time }

  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let mut state = lock(&self.shared);
    let due = state.frame_time + delay.unwrap_or(Duration::ZERO);
    state.push(due, task, handle.clone());
    handle
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex as StdMutex;

  use super::*;
  use crate::subscription::Subscription;

  const FRAME: Duration = Duration::from_millis(16);

  #[rxcore_macro::test]
  fn delays_are_quantized_to_frames() {
    let start = Instant::now();
    let main = MainLoop::starting_at(start);
    let scheduler = main.scheduler();
    let fired_at = Arc::new(StdMutex::new(None));
    let c_fired_at = fired_at.clone();
    let c_scheduler = scheduler.clone();
    scheduler.schedule(
      Task::once(move || *c_fired_at.lock().unwrap() = Some(c_scheduler.now())),
      Some(Duration::from_millis(10)),
    );

    assert_eq!(main.tick_at(start + Duration::from_millis(8)), 0);
    assert!(fired_at.lock().unwrap().is_none());

    assert_eq!(main.tick_at(start + FRAME), 1);
    assert_eq!(*fired_at.lock().unwrap(), Some(start + FRAME));
  }

  #[rxcore_macro::test]
  fn runs_in_submission_order() {
    let start = Instant::now();
    let main = MainLoop::starting_at(start);
    let log = Arc::new(StdMutex::new(Vec::new()));
    for i in 0..4 {
      let log = log.clone();
      main
        .scheduler()
        .schedule(Task::once(move || log.lock().unwrap().push(i)), None);
    }
    main.tick_at(start + FRAME);
    assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3]);
  }

  #[rxcore_macro::test]
  fn work_scheduled_during_a_tick_waits() {
    let start = Instant::now();
    let main = MainLoop::starting_at(start);
    let scheduler = main.scheduler();
    let log = Arc::new(StdMutex::new(Vec::new()));
    let (c_log, c_scheduler) = (log.clone(), scheduler.clone());
    scheduler.schedule(
      Task::once(move || {
        c_log.lock().unwrap().push("first");
        let log = c_log.clone();
        c_scheduler.schedule(Task::once(move || log.lock().unwrap().push("second")), None);
      }),
      None,
    );
    main.tick_at(start + FRAME);
    assert_eq!(*log.lock().unwrap(), vec!["first"]);
    main.tick_at(start + FRAME * 2);
    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
  }

  #[rxcore_macro::test]
  fn periodic_task_and_cancel() {
    let start = Instant::now();
    let main = MainLoop::starting_at(start);
    let count = Arc::new(StdMutex::new(0));
    let c_count = count.clone();
    let handle = main.scheduler().schedule(
      Task::new(c_count, |count| {
        *count.lock().unwrap() += 1;
        TaskState::Sleeping(FRAME)
      }),
      None,
    );
    for i in 1..=3 {
      main.tick_at(start + FRAME * i);
    }
    assert_eq!(*count.lock().unwrap(), 3);
    handle.unsubscribe();
    main.tick_at(start + FRAME * 4);
    assert_eq!(*count.lock().unwrap(), 3);
  }
}
