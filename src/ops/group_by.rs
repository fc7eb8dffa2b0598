//! GroupBy operator implementation
//!
//! Values are routed into one [`GroupedObservable`] per key. A group is
//! announced downstream once, when its key first shows up, before the value
//! that opened it is pushed into it.
//!
//! Termination order: the outer stream completes (or errors) first, then every
//! open group does the same, in first-seen key order.

use std::{collections::HashMap, hash::Hash};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  subject::Subject,
};

#[derive(Clone)]
pub struct GroupBy<S, F> {
  pub source: S,
  pub key: F,
}

impl<S, F, K> ObservableType for GroupBy<S, F>
where
  S: ObservableType,
  F: FnMut(&S::Item) -> K,
{
  type Item = GroupedObservable<K, S::Item, S::Err>;
  type Err = S::Err;
}

/// The values of one group, tagged with their key.
///
/// Groups are hot: values pushed before a subscriber joins are not replayed.
#[derive(Clone)]
pub struct GroupedObservable<K, Item, Err> {
  key: K,
  subject: Subject<Item, Err>,
}

impl<K, Item, Err> GroupedObservable<K, Item, Err> {
  pub fn key(&self) -> &K { &self.key }
}

impl<K, Item, Err> ObservableType for GroupedObservable<K, Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<K, Item, Err, O> CoreObservable<O> for GroupedObservable<K, Item, Err>
where
  Subject<Item, Err>: CoreObservable<O>,
{
  type Unsub = <Subject<Item, Err> as CoreObservable<O>>::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.subject.actual_subscribe(observer) }
}

pub struct GroupByObserver<O, F, K, Item, Err> {
  observer: O,
  key: F,
  index: HashMap<K, usize>,
  groups: Vec<Subject<Item, Err>>,
}

impl<O, F, K, Item, Err> Observer<Item, Err> for GroupByObserver<O, F, K, Item, Err>
where
  O: Observer<GroupedObservable<K, Item, Err>, Err>,
  F: FnMut(&Item) -> K,
  K: Hash + Eq + Clone,
  Subject<Item, Err>: Observer<Item, Err>,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    let key = (self.key)(&value);
    let idx = match self.index.get(&key) {
      Some(idx) => *idx,
      None => {
        let subject = Subject::new();
        let idx = self.groups.len();
        self.groups.push(subject.clone());
        self.index.insert(key.clone(), idx);
        self.observer.next(GroupedObservable { key, subject });
        idx
      }
    };
    self.groups[idx].next(value);
  }

  fn error(self, err: Err) {
    self.observer.error(err.clone());
    for group in self.groups {
      group.error(err.clone());
    }
  }

  fn complete(self) {
    self.observer.complete();
    for group in self.groups {
      group.complete();
    }
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, F, K, O> CoreObservable<O> for GroupBy<S, F>
where
  S: CoreObservable<
      GroupByObserver<O, F, K, <S as ObservableType>::Item, <S as ObservableType>::Err>,
    >,
  F: FnMut(&<S as ObservableType>::Item) -> K,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let GroupBy { source, key } = self;
    source.actual_subscribe(GroupByObserver {
      observer,
      key,
      index: HashMap::new(),
      groups: Vec::new(),
    })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn routes_values_by_key() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let c_log = log.clone();
    observable::range(0, 6)
      .group_by(|v| v % 3)
      .subscribe(move |group| {
        let key = *group.key();
        c_log.lock().unwrap().push(format!("group {key}"));
        let log = c_log.clone();
        group.subscribe(move |v| log.lock().unwrap().push(format!("{key}: {v}")));
      });
    assert_eq!(
      *log.lock().unwrap(),
      vec!["group 0", "0: 0", "group 1", "1: 1", "group 2", "2: 2", "0: 3", "1: 4", "2: 5"]
    );
  }

  #[rxcore_macro::test]
  fn outer_completes_before_groups() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    observable::from_iter(["b", "a", "b"])
      .group_by(|s| s.to_string())
      .subscribe_complete(
        move |group| {
          let key = group.key().clone();
          let log = n.clone();
          group.subscribe_complete(|_| {}, move || log.lock().unwrap().push(format!("{key} done")));
        },
        move || c.lock().unwrap().push("outer done".to_string()),
      );
    assert_eq!(*log.lock().unwrap(), vec!["outer done", "b done", "a done"]);
  }
}
