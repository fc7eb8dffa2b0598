use super::{Duration, Instant, Scheduler, Task, TaskHandle, run_blocking};

/// Runs tasks on the caller's stack before `schedule` returns.
///
/// Delays and `Sleeping` steps block the calling thread, so this scheduler
/// is meant for zero-delay work and for tests of synchronous pipelines.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  fn now(&self) -> Instant { Instant::now() }

  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    if let Some(delay) = delay.filter(|d| !d.is_zero()) {
      std::thread::sleep(delay);
    }
    let handle = TaskHandle::new();
    run_blocking(task, &handle);
    handle
  }
}
