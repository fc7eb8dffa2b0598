//! Distinct, DistinctBy and DistinctUntilChanged operators
//!
//! `distinct` remembers every value it let through for the lifetime of the
//! subscription; memory grows with the number of distinct values.
//! `distinct_until_changed` only compares with the previous value.

use std::{collections::HashSet, hash::Hash};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

// ==================== Distinct ====================

#[derive(Clone)]
pub struct Distinct<S> {
  pub source: S,
}

impl<S: ObservableType> ObservableType for Distinct<S> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct DistinctObserver<O, Item> {
  observer: O,
  seen: HashSet<Item>,
}

impl<O, Item, Err> Observer<Item, Err> for DistinctObserver<O, Item>
where
  O: Observer<Item, Err>,
  Item: Eq + Hash + Clone,
{
  fn next(&mut self, value: Item) {
    if self.seen.insert(value.clone()) {
      self.observer.next(value);
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, O> CoreObservable<O> for Distinct<S>
where
  S: CoreObservable<DistinctObserver<O, <S as ObservableType>::Item>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(DistinctObserver { observer, seen: HashSet::new() })
  }
}

// ==================== DistinctBy ====================

/// Like [`Distinct`], comparing the keys computed by `key`.
#[derive(Clone)]
pub struct DistinctBy<S, F> {
  pub source: S,
  pub key: F,
}

impl<S: ObservableType, F> ObservableType for DistinctBy<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct DistinctByObserver<O, F, K> {
  observer: O,
  key: F,
  seen: HashSet<K>,
}

impl<O, F, K, Item, Err> Observer<Item, Err> for DistinctByObserver<O, F, K>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> K,
  K: Eq + Hash,
{
  fn next(&mut self, value: Item) {
    if self.seen.insert((self.key)(&value)) {
      self.observer.next(value);
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, F, K, O> CoreObservable<O> for DistinctBy<S, F>
where
  S: CoreObservable<DistinctByObserver<O, F, K>>,
  F: FnMut(&<S as ObservableType>::Item) -> K,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let DistinctBy { source, key } = self;
    source.actual_subscribe(DistinctByObserver { observer, key, seen: HashSet::new() })
  }
}

// ==================== DistinctUntilChanged ====================

#[derive(Clone)]
pub struct DistinctUntilChanged<S> {
  pub source: S,
}

impl<S: ObservableType> ObservableType for DistinctUntilChanged<S> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct DistinctUntilChangedObserver<O, Item> {
  observer: O,
  last: Option<Item>,
}

impl<O, Item, Err> Observer<Item, Err> for DistinctUntilChangedObserver<O, Item>
where
  O: Observer<Item, Err>,
  Item: PartialEq + Clone,
{
  fn next(&mut self, value: Item) {
    if self.last.as_ref() != Some(&value) {
      self.last = Some(value.clone());
      self.observer.next(value);
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, O> CoreObservable<O> for DistinctUntilChanged<S>
where
  S: CoreObservable<DistinctUntilChangedObserver<O, <S as ObservableType>::Item>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(DistinctUntilChangedObserver { observer, last: None })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn distinct_keeps_first_seen_order() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    observable::from_iter([0, 1, 2, 3, 2, 3, 4, 5])
      .distinct()
      .subscribe(move |v| c_out.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);
  }

  #[rxcore_macro::test]
  fn distinct_by_key() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    observable::from_iter(["apple", "avocado", "banana", "blueberry", "cherry"])
      .distinct_by(|s| s.chars().next())
      .subscribe(move |v| c_out.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec!["apple", "banana", "cherry"]);
  }

  #[rxcore_macro::test]
  fn until_changed_drops_consecutive_repeats() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    observable::from_iter([0, 0, 1, 1, 2, 2, 0, 1, 2])
      .distinct_until_changed()
      .subscribe(move |v| c_out.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec![0, 1, 2, 0, 1, 2]);
  }
}
