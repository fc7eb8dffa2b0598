use super::timer::{Timer, timer_periodic_on};
use crate::scheduler::{DefaultScheduler, Duration, Scheduler};

/// Emits `0, 1, 2, ...`, one value every `period`, starting one `period`
/// after subscription.
///
/// ```
/// use std::sync::{Arc, Mutex};
///
/// use rxcore::prelude::*;
///
/// TestScheduler::init();
/// let ticks = Arc::new(Mutex::new(Vec::new()));
/// let c_ticks = ticks.clone();
/// observable::interval_on(Duration::from_secs(1), TestScheduler)
///   .take(3)
///   .subscribe(move |v| c_ticks.lock().unwrap().push(v));
/// TestScheduler::advance_by(Duration::from_secs(5));
/// assert_eq!(*ticks.lock().unwrap(), vec![0, 1, 2]);
/// ```
pub fn interval(period: Duration) -> Timer<DefaultScheduler> { interval_on(period, DefaultScheduler) }

pub fn interval_on<SD: Scheduler>(period: Duration, scheduler: SD) -> Timer<SD> {
  timer_periodic_on(period, period, scheduler)
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn stops_ticking_once_downstream_closed() {
    TestScheduler::init();
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    observable::interval_on(Duration::from_millis(10), TestScheduler)
      .take(2)
      .subscribe(move |v| c_out.lock().unwrap().push(v));

    TestScheduler::advance_by(Duration::from_millis(25));
    assert_eq!(*out.lock().unwrap(), vec![0, 1]);
    TestScheduler::advance_by(Duration::from_millis(10));
    assert!(TestScheduler::is_empty());
  }

  #[cfg(feature = "thread-pool")]
  #[rxcore_macro::test]
  fn ticks_on_thread_pool() {
    let pool = ThreadPoolScheduler::new().unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    observable::interval_on(Duration::from_millis(1), pool)
      .take(3)
      .subscribe(move |v| {
        let _ = tx.send(v);
      });
    let got: Vec<u64> = rx.iter().collect();
    assert_eq!(got, vec![0, 1, 2]);
  }
}
