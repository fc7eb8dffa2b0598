//! Map operator implementation

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Applies `func` to every value.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
///
/// use rxcore::prelude::*;
///
/// let out = Arc::new(Mutex::new(Vec::new()));
/// let c_out = out.clone();
/// observable::from_iter(["a", "bb"])
///   .map(str::len)
///   .subscribe(move |v| c_out.lock().unwrap().push(v));
/// assert_eq!(*out.lock().unwrap(), vec![1, 2]);
/// ```
#[derive(Clone)]
pub struct Map<S, F> {
  pub source: S,
  pub func: F,
}

impl<S, F, Out> ObservableType for Map<S, F>
where
  S: ObservableType,
  F: FnMut(S::Item) -> Out,
{
  type Item = Out;
  type Err = S::Err;
}

pub struct MapObserver<O, F> {
  observer: O,
  func: F,
}

impl<O, F, Item, Out, Err> Observer<Item, Err> for MapObserver<O, F>
where
  O: Observer<Out, Err>,
  F: FnMut(Item) -> Out,
{
  fn next(&mut self, value: Item) { self.observer.next((self.func)(value)) }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, F, Out, O> CoreObservable<O> for Map<S, F>
where
  S: CoreObservable<MapObserver<O, F>>,
  F: FnMut(S::Item) -> Out,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Map { source, func } = self;
    source.actual_subscribe(MapObserver { observer, func })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn maps_every_value() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    observable::range(100, 3)
      .map(|v| v * 2)
      .subscribe(move |v| c_out.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec![200, 202, 204]);
  }

  #[rxcore_macro::test]
  fn changes_item_type() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    observable::of(3)
      .map(|v| "x".repeat(v))
      .subscribe(move |v| c_out.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec!["xxx".to_string()]);
  }

  #[rxcore_macro::test]
  fn passes_errors_through() {
    let err = Arc::new(Mutex::new(None));
    let c_err = err.clone();
    observable::throw::<i32, _>(RxError::SequenceEmpty)
      .map(|v| v + 1)
      .subscribe_err(|_| {}, move |e| *c_err.lock().unwrap() = Some(e));
    assert!(matches!(*err.lock().unwrap(), Some(RxError::SequenceEmpty)));
  }
}
