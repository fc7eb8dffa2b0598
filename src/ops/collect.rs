//! Collect operator implementation

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Gathers every value into `C` and emits it once, on completion.
///
/// `to_vec` is `collect::<Vec<_>>`. On error the partial collection is
/// dropped.
#[derive(Clone)]
pub struct Collect<S, C> {
  pub source: S,
  pub collection: C,
}

impl<S: ObservableType, C> ObservableType for Collect<S, C> {
  type Item = C;
  type Err = S::Err;
}

pub struct CollectObserver<O, C> {
  observer: O,
  collection: C,
}

impl<O, C, Item, Err> Observer<Item, Err> for CollectObserver<O, C>
where
  O: Observer<C, Err>,
  C: Extend<Item>,
{
  fn next(&mut self, value: Item) { self.collection.extend(Some(value)); }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    self.observer.next(self.collection);
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, C, O> CoreObservable<O> for Collect<S, C>
where
  S: CoreObservable<CollectObserver<O, C>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Collect { source, collection } = self;
    source.actual_subscribe(CollectObserver { observer, collection })
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex},
  };

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn to_vec_keeps_arrival_order() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    observable::from_iter([3, 1, 2])
      .to_vec()
      .subscribe(move |v| c_out.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec![vec![3, 1, 2]]);
  }

  #[rxcore_macro::test]
  fn collect_into_any_extend() {
    let out = Arc::new(Mutex::new(None));
    let c_out = out.clone();
    observable::from_iter([3, 1, 3, 2])
      .collect::<BTreeSet<_>>()
      .subscribe(move |v| *c_out.lock().unwrap() = Some(v));
    let expected: BTreeSet<i32> = [1, 2, 3].into_iter().collect();
    assert_eq!(*out.lock().unwrap(), Some(expected));
  }
}
