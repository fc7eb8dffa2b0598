//! Virtual-time scheduler for deterministic tests.
//!
//! Time only moves when the test says so:
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use rxcore::prelude::*;
//!
//! TestScheduler::init();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let c_seen = seen.clone();
//! observable::of(42)
//!   .delay_on(Duration::from_millis(100), TestScheduler)
//!   .subscribe(move |v| c_seen.lock().unwrap().push(v));
//!
//! TestScheduler::advance_by(Duration::from_millis(99));
//! assert!(seen.lock().unwrap().is_empty());
//! TestScheduler::advance_by(Duration::from_millis(1));
//! assert_eq!(*seen.lock().unwrap(), vec![42]);
//! ```
//!
//! State is thread-local: each test thread has its own clock and queue.

use std::{cell::RefCell, cmp::Ordering, collections::BinaryHeap};

use super::{Duration, Instant, Scheduler, Task, TaskHandle, TaskState};

struct Scheduled {
  at: Duration,
  id: usize,
  task: Task,
  handle: TaskHandle,
}

impl PartialEq for Scheduled {
  fn eq(&self, other: &Self) -> bool { self.at == other.at && self.id == other.id }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Scheduled {
  fn cmp(&self, other: &Self) -> Ordering {
    // min-heap: earliest first, then FIFO
    other
      .at
      .cmp(&self.at)
      .then_with(|| other.id.cmp(&self.id))
  }
}

struct VirtualClock {
  epoch: Instant,
  elapsed: Duration,
  queue: BinaryHeap<Scheduled>,
  next_id: usize,
  initialized: bool,
}

impl VirtualClock {
  fn push(&mut self, at: Duration, task: Task, handle: TaskHandle) {
    let id = self.next_id;
    self.next_id += 1;
    self.queue.push(Scheduled { at, id, task, handle });
  }
}

thread_local! {
  static CLOCK: RefCell<VirtualClock> = RefCell::new(VirtualClock {
    epoch: Instant::now(),
    elapsed: Duration::ZERO,
    queue: BinaryHeap::new(),
    next_id: 0,
    initialized: false,
  });
}

/// Zero-sized handle to this thread's virtual clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestScheduler;

impl TestScheduler {
  /// Resets the clock to zero and drops every queued task.
  ///
  /// Call at the start of each test; the other functions panic otherwise.
  pub fn init() {
    CLOCK.with(|clock| {
      let mut clock = clock.borrow_mut();
      clock.epoch = Instant::now();
      clock.elapsed = Duration::ZERO;
      clock.queue.clear();
      clock.next_id = 0;
      clock.initialized = true;
    });
  }

  fn ensure_initialized() {
    CLOCK.with(|clock| {
      assert!(
        clock.borrow().initialized,
        "TestScheduler::init() must be called before using the scheduler"
      );
    });
  }

  /// Virtual time elapsed since `init`.
  pub fn elapsed() -> Duration {
    Self::ensure_initialized();
    CLOCK.with(|clock| clock.borrow().elapsed)
  }

  pub fn pending_count() -> usize {
    Self::ensure_initialized();
    CLOCK.with(|clock| clock.borrow().queue.len())
  }

  pub fn is_empty() -> bool { Self::pending_count() == 0 }

  /// Moves the clock forward by `duration`, running every task that falls
  /// due on the way, in time order.
  pub fn advance_by(duration: Duration) {
    Self::ensure_initialized();
    let target = CLOCK.with(|clock| clock.borrow().elapsed + duration);
    Self::run_until(Some(target));
    CLOCK.with(|clock| clock.borrow_mut().elapsed = target);
  }

  /// Runs every queued task, jumping the clock to each due time, until the
  /// queue is empty.
  pub fn flush() {
    Self::ensure_initialized();
    Self::run_until(None);
  }

  fn run_until(target: Option<Duration>) {
    loop {
      let next = CLOCK.with(|clock| {
        let mut clock = clock.borrow_mut();
        let due = clock
          .queue
          .peek()
          .is_some_and(|s| target.is_none_or(|limit| s.at <= limit));
        if !due {
          return None;
        }
        let scheduled = clock.queue.pop()?;
        clock.elapsed = clock.elapsed.max(scheduled.at);
        Some(scheduled)
      });
      let Some(mut scheduled) = next else {
        break;
      };
      if scheduled.handle.is_cancelled() {
        continue;
      }

      let state = scheduled.task.step();
      CLOCK.with(|clock| {
        let mut clock = clock.borrow_mut();
        let now = clock.elapsed;
        match state {
          TaskState::Finished => scheduled.handle.mark_finished(),
          TaskState::Yield => clock.push(now, scheduled.task, scheduled.handle),
          TaskState::Sleeping(d) => clock.push(now + d, scheduled.task, scheduled.handle),
        }
      });
    }
  }
}

impl Scheduler for TestScheduler {
  fn now(&self) -> Instant {
    Self::ensure_initialized();
    CLOCK.with(|clock| {
      let clock = clock.borrow();
      clock.epoch + clock.elapsed
    })
  }

  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    Self::ensure_initialized();
    let handle = TaskHandle::new();
    CLOCK.with(|clock| {
      let mut clock = clock.borrow_mut();
      let at = clock.elapsed + delay.unwrap_or(Duration::ZERO);
      clock.push(at, task, handle.clone());
    });
    handle
  }
}
