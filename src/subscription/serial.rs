use super::{BoxedSubscription, Subscription};
use crate::rc::MutArc;

/// Holds at most one child; installing a new child releases the previous one.
///
/// Used where an operator swaps its upstream over time (retry, concat,
/// switch, throttle timers).
#[derive(Clone, Default)]
pub struct SerialSubscription(MutArc<SerialState>);

#[derive(Default)]
struct SerialState {
  closed: bool,
  current: Option<BoxedSubscription>,
}

impl SerialSubscription {
  pub fn new() -> Self { Self::default() }

  /// Replaces the current child. When already released, `sub` is released
  /// right away instead.
  pub fn set<S: Subscription + Send + 'static>(&self, sub: S) {
    let outcome = {
      let mut state = self.0.rc_deref_mut();
      if state.closed { Err(sub) } else { Ok(state.current.replace(sub.into_boxed())) }
    };
    match outcome {
      Ok(previous) => previous.unsubscribe(),
      Err(sub) => sub.unsubscribe(),
    }
  }

  /// Releases the current child but keeps accepting new ones.
  pub fn clear(&self) {
    let previous = self.0.rc_deref_mut().current.take();
    previous.unsubscribe();
  }

  pub fn dispose(&self) {
    let previous = {
      let mut state = self.0.rc_deref_mut();
      state.closed = true;
      state.current.take()
    };
    previous.unsubscribe();
  }
}

impl Subscription for SerialSubscription {
  fn unsubscribe(self) { self.dispose() }

  fn is_closed(&self) -> bool { self.0.rc_deref_mut().closed }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use super::*;
  use crate::subscription::ClosureSubscription;

  #[rxcore_macro::test]
  fn replacing_releases_previous() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let serial = SerialSubscription::new();
    for name in ["a", "b"] {
      let log = log.clone();
      serial.set(ClosureSubscription(move || log.lock().unwrap().push(name)));
    }
    assert_eq!(*log.lock().unwrap(), vec!["a"]);
    serial.clone().unsubscribe();
    assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);

    let c_log = log.clone();
    serial.set(ClosureSubscription(move || c_log.lock().unwrap().push("late")));
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "late"]);
  }
}
