use std::sync::{Arc, Mutex, PoisonError, RwLock};

use once_cell::sync::Lazy;

use super::{CurrentThreadScheduler, Duration, Instant, Scheduler, Task, TaskHandle};
use crate::subscription::Subscription;

static INSTANCE: Lazy<RwLock<Arc<dyn Scheduler>>> = Lazy::new(|| RwLock::new(create_default()));

static PENDING: Lazy<Mutex<Vec<TaskHandle>>> = Lazy::new(|| Mutex::new(Vec::new()));

#[cfg(feature = "thread-pool")]
fn create_default() -> Arc<dyn Scheduler> {
  match super::ThreadPoolScheduler::new() {
    Ok(pool) => {
      tracing::debug!("default scheduler: thread pool");
      Arc::new(pool)
    }
    Err(err) => {
      tracing::warn!(%err, "thread pool unavailable, default scheduler falls back to current thread");
      Arc::new(CurrentThreadScheduler)
    }
  }
}

#[cfg(not(feature = "thread-pool"))]
fn create_default() -> Arc<dyn Scheduler> { Arc::new(CurrentThreadScheduler) }

/// The process-wide scheduler used by operators called without an explicit
/// one (`delay`, `interval`, `throttle`, ...).
///
/// The instance is created on first use: a thread pool when the
/// `thread-pool` feature is on and the pool can be spawned, otherwise the
/// current-thread trampoline. [`DefaultScheduler::install`] swaps it and
/// [`DefaultScheduler::shutdown`] cancels everything still pending on it.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultScheduler;

impl DefaultScheduler {
  /// Replaces the process-wide instance. Tasks already scheduled keep
  /// running on the previous one.
  pub fn install(scheduler: Arc<dyn Scheduler>) {
    tracing::debug!("default scheduler replaced");
    *INSTANCE.write().unwrap_or_else(PoisonError::into_inner) = scheduler;
  }

  pub fn current() -> Arc<dyn Scheduler> {
    INSTANCE
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  /// Cancels every task scheduled through the default scheduler that has
  /// not finished yet. The scheduler stays usable afterwards.
  pub fn shutdown() {
    let pending = std::mem::take(&mut *PENDING.lock().unwrap_or_else(PoisonError::into_inner));
    tracing::debug!(tasks = pending.len(), "default scheduler shutdown");
    for handle in pending {
      handle.unsubscribe();
    }
  }

  /// Tasks scheduled through the default scheduler and not yet finished.
  pub fn pending_count() -> usize {
    let mut pending = PENDING.lock().unwrap_or_else(PoisonError::into_inner);
    pending.retain(|h| !h.is_closed());
    pending.len()
  }
}

impl Scheduler for DefaultScheduler {
  fn now(&self) -> Instant { Self::current().now() }

  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = Self::current().schedule(task, delay);
    if !handle.is_closed() {
      let mut pending = PENDING.lock().unwrap_or_else(PoisonError::into_inner);
      pending.retain(|h| !h.is_closed());
      pending.push(handle.clone());
    }
    handle
  }
}
