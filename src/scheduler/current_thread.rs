use std::{cell::RefCell, cmp::Ordering, collections::BinaryHeap};

use super::{Duration, Instant, Scheduler, Task, TaskHandle, TaskState};

/// Runs tasks on the calling thread through a trampoline queue.
///
/// The outermost `schedule` call drains the queue before returning; calls
/// made while the queue is draining (from inside a task) only enqueue. Tasks
/// run in due-time order, FIFO among equal due times, so recursive
/// scheduling never grows the stack. Waiting for a due time blocks the
/// thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct CurrentThreadScheduler;

struct Queued {
  due: Instant,
  seq: usize,
  task: Task,
  handle: TaskHandle,
}

impl PartialEq for Queued {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.seq == other.seq }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Queued {
  fn cmp(&self, other: &Self) -> Ordering {
    // min-heap on (due, seq)
    other
      .due
      .cmp(&self.due)
      .then_with(|| other.seq.cmp(&self.seq))
  }
}

#[derive(Default)]
struct Trampoline {
  draining: bool,
  next_seq: usize,
  queue: BinaryHeap<Queued>,
}

impl Trampoline {
  fn push(&mut self, due: Instant, task: Task, handle: TaskHandle) {
    let seq = self.next_seq;
    self.next_seq += 1;
    self.queue.push(Queued { due, seq, task, handle });
  }
}

thread_local! {
  static TRAMPOLINE: RefCell<Trampoline> = RefCell::new(Trampoline::default());
}

/// Clears the draining flag even when a task panics.
struct DrainGuard;

impl Drop for DrainGuard {
  fn drop(&mut self) { TRAMPOLINE.with(|t| t.borrow_mut().draining = false); }
}

impl CurrentThreadScheduler {
  /// Whether a trampoline is currently draining on this thread.
  pub fn is_draining() -> bool { TRAMPOLINE.with(|t| t.borrow().draining) }

  fn drain() {
    let _guard = DrainGuard;
    loop {
      let Some(mut queued) = TRAMPOLINE.with(|t| t.borrow_mut().queue.pop()) else {
        break;
      };
      if queued.handle.is_cancelled() {
        continue;
      }
      let now = Instant::now();
      if queued.due > now {
        std::thread::sleep(queued.due - now);
        if queued.handle.is_cancelled() {
          continue;
        }
      }
      let next_due = match queued.task.step() {
        TaskState::Finished => {
          queued.handle.mark_finished();
          continue;
        }
        TaskState::Yield => Instant::now(),
        TaskState::Sleeping(duration) => Instant::now() + duration,
      };
      TRAMPOLINE.with(|t| t.borrow_mut().push(next_due, queued.task, queued.handle));
    }
  }
}

impl Scheduler for CurrentThreadScheduler {
  fn now(&self) -> Instant { Instant::now() }

  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let due = Instant::now() + delay.unwrap_or(Duration::ZERO);
    let start = TRAMPOLINE.with(|t| {
      let mut t = t.borrow_mut();
      t.push(due, task, handle.clone());
      !std::mem::replace(&mut t.draining, true)
    });
    if start {
      Self::drain();
    }
    handle
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use super::*;

  #[rxcore_macro::test]
  fn nested_schedule_is_queued_not_recursive() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let c_log = log.clone();
    CurrentThreadScheduler.schedule(
      Task::once(move || {
        c_log.lock().unwrap().push("outer start");
        let inner_log = c_log.clone();
        CurrentThreadScheduler.schedule(
          Task::once(move || inner_log.lock().unwrap().push("inner")),
          None,
        );
        c_log.lock().unwrap().push("outer end");
      }),
      None,
    );
    assert_eq!(*log.lock().unwrap(), vec!["outer start", "outer end", "inner"]);
    assert!(!CurrentThreadScheduler::is_draining());
  }

  #[rxcore_macro::test]
  fn due_time_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let c_log = log.clone();
    CurrentThreadScheduler.schedule(
      Task::once(move || {
        for (name, delay) in [("late", 4), ("early", 1), ("early too", 1)] {
          let log = c_log.clone();
          CurrentThreadScheduler.schedule(
            Task::once(move || log.lock().unwrap().push(name)),
            Some(Duration::from_millis(delay)),
          );
        }
      }),
      None,
    );
    assert_eq!(*log.lock().unwrap(), vec!["early", "early too", "late"]);
  }

  #[rxcore_macro::test]
  fn cancelled_before_run() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let c_log = log.clone();
    CurrentThreadScheduler.schedule(
      Task::once(move || {
        let log = c_log.clone();
        let handle = CurrentThreadScheduler.schedule(
          Task::once(move || log.lock().unwrap().push("never")),
          None,
        );
        crate::subscription::Subscription::unsubscribe(handle);
      }),
      None,
    );
    assert!(log.lock().unwrap().is_empty());
  }
}
