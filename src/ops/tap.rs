//! Tap operator implementation
//!
//! Side effects on the notification stream without changing it.

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Calls the hooks for each notification, then forwards it unchanged.
#[derive(Clone)]
pub struct Tap<S, N, E, C> {
  pub source: S,
  pub next: N,
  pub error: E,
  pub complete: C,
}

fn noop() {}

fn noop_error<Err>(_: &Err) {}

impl<S: ObservableType, N> Tap<S, N, fn(&S::Err), fn()> {
  pub fn next_only(source: S, next: N) -> Self {
    Tap { source, next, error: noop_error::<S::Err>, complete: noop }
  }
}

impl<S: ObservableType, N, E, C> ObservableType for Tap<S, N, E, C> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct TapObserver<O, N, E, C> {
  observer: O,
  next: N,
  error: E,
  complete: C,
}

impl<O, N, E, C, Item, Err> Observer<Item, Err> for TapObserver<O, N, E, C>
where
  O: Observer<Item, Err>,
  N: FnMut(&Item),
  E: FnOnce(&Err),
  C: FnOnce(),
{
  fn next(&mut self, value: Item) {
    (self.next)(&value);
    self.observer.next(value);
  }

  fn error(self, err: Err) {
    (self.error)(&err);
    self.observer.error(err);
  }

  fn complete(self) {
    (self.complete)();
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, N, E, C, O> CoreObservable<O> for Tap<S, N, E, C>
where
  S: CoreObservable<TapObserver<O, N, E, C>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Tap { source, next, error, complete } = self;
    source.actual_subscribe(TapObserver { observer, next, error, complete })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn hooks_run_before_downstream() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (t_next, t_done, sub) = (log.clone(), log.clone(), log.clone());
    observable::from_iter([1, 2])
      .tap_all(
        move |v| t_next.lock().unwrap().push(format!("tap {v}")),
        |_| {},
        move || t_done.lock().unwrap().push("tap done".to_string()),
      )
      .subscribe(move |v| sub.lock().unwrap().push(format!("got {v}")));
    assert_eq!(*log.lock().unwrap(), vec!["tap 1", "got 1", "tap 2", "got 2", "tap done"]);
  }

  #[rxcore_macro::test]
  fn tap_sees_values() {
    let seen = Arc::new(Mutex::new(0));
    let c_seen = seen.clone();
    observable::range(1, 4)
      .tap(move |v| *c_seen.lock().unwrap() += v)
      .subscribe(|_| {});
    assert_eq!(*seen.lock().unwrap(), 10);
  }
}
