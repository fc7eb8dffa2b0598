use std::{
  future::Future,
  io,
  pin::Pin,
  task::{Context, Poll, ready},
};

use futures::executor::ThreadPool;
use futures_time::task::{Sleep, sleep};
use pin_project_lite::pin_project;

use super::{Duration, Instant, Scheduler, Task, TaskHandle, TaskState};

/// Runs tasks on a `futures` thread pool.
///
/// Delays are timer futures, so no worker thread is blocked while a task
/// sleeps. Tasks scheduled independently may run concurrently and in any
/// order.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
}

/// Configures a [`ThreadPoolScheduler`].
#[derive(Default)]
pub struct ThreadPoolSchedulerBuilder {
  pool_size: Option<usize>,
  name_prefix: Option<String>,
}

impl ThreadPoolSchedulerBuilder {
  /// Number of worker threads (defaults to the number of CPUs).
  pub fn pool_size(mut self, size: usize) -> Self {
    self.pool_size = Some(size);
    self
  }

  pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.name_prefix = Some(prefix.into());
    self
  }

  pub fn create(self) -> io::Result<ThreadPoolScheduler> {
    let mut builder = ThreadPool::builder();
    if let Some(size) = self.pool_size {
      builder.pool_size(size);
    }
    builder.name_prefix(self.name_prefix.unwrap_or_else(|| "rxcore-worker-".to_owned()));
    let pool = builder.create()?;
    Ok(ThreadPoolScheduler { pool })
  }
}

impl ThreadPoolScheduler {
  pub fn new() -> io::Result<Self> { Self::builder().create() }

  pub fn builder() -> ThreadPoolSchedulerBuilder { ThreadPoolSchedulerBuilder::default() }
}

pin_project! {
  /// Drives a [`Task`] as a future, honouring cancellation between steps
  /// and while sleeping.
  struct TaskFuture {
    #[pin]
    sleep: Option<Sleep>,
    task: Task,
    handle: TaskHandle,
  }
}

impl Future for TaskFuture {
  type Output = ();

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
    let mut this = self.project();
    loop {
      if this.handle.is_cancelled() {
        return Poll::Ready(());
      }
      if let Some(timer) = this.sleep.as_mut().as_pin_mut() {
        this.handle.register_waker(cx.waker());
        ready!(timer.poll(cx));
        this.sleep.set(None);
        continue;
      }
      match this.task.step() {
        TaskState::Finished => {
          this.handle.mark_finished();
          return Poll::Ready(());
        }
        TaskState::Yield => {
          cx.waker().wake_by_ref();
          return Poll::Pending;
        }
        TaskState::Sleeping(duration) => this.sleep.set(Some(sleep(duration.into()))),
      }
    }
  }
}

impl Scheduler for ThreadPoolScheduler {
  fn now(&self) -> Instant { Instant::now() }

  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = TaskHandle::new();
    let sleep = delay
      .filter(|d| !d.is_zero())
      .map(|d| sleep(d.into()));
    self
      .pool
      .spawn_ok(TaskFuture { sleep, task, handle: handle.clone() });
    handle
  }
}
