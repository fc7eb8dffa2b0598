//! FlatMap operator implementation
//!
//! Every outer value is mapped to an inner observable and all inner
//! observables run side by side, exactly like `merge`. The result completes
//! once the outer source and every inner source completed.

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  ops::merge::MergeObserver,
  subscription::CompositeSubscription,
};

#[derive(Clone)]
pub struct FlatMap<S, F> {
  pub source: S,
  pub func: F,
}

impl<S, F, Inner> ObservableType for FlatMap<S, F>
where
  S: ObservableType,
  F: FnMut(S::Item) -> Inner,
  Inner: ObservableType,
{
  type Item = Inner::Item;
  type Err = S::Err;
}

pub struct FlatMapObserver<O, F> {
  merge: MergeObserver<O>,
  func: F,
}

impl<O, F, Item, Err, Inner> Observer<Item, Err> for FlatMapObserver<O, F>
where
  F: FnMut(Item) -> Inner,
  Inner: CoreObservable<MergeObserver<O>, Err = Err>,
  Inner::Unsub: Send + 'static,
  O: Observer<Inner::Item, Err>,
{
  fn next(&mut self, value: Item) {
    let inner = (self.func)(value);
    if let Some(observer) = self.merge.fork_active() {
      let subs = self.merge.subscription().clone();
      subs.add(inner.actual_subscribe(observer));
    }
  }

  fn error(self, err: Err) { Observer::<Inner::Item, Err>::error(self.merge, err) }

  fn complete(self) { Observer::<Inner::Item, Err>::complete(self.merge) }

  fn is_closed(&self) -> bool { Observer::<Inner::Item, Err>::is_closed(&self.merge) }
}

impl<S, F, O> CoreObservable<O> for FlatMap<S, F>
where
  S: CoreObservable<FlatMapObserver<O, F>>,
  S::Unsub: Send + 'static,
  Self: ObservableType,
{
  type Unsub = CompositeSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let FlatMap { source, func } = self;
    let subs = CompositeSubscription::new();
    let merge = MergeObserver::new(observer, 1, subs.clone());
    subs.add(source.actual_subscribe(FlatMapObserver { merge, func }));
    subs
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn flattens_inner_sequences() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    observable::range(1, 3)
      .flat_map(|v| observable::repeat(v, v as usize))
      .subscribe_complete(move |v| n.lock().unwrap().push(v), move || c.lock().unwrap().push(0));
    assert_eq!(*log.lock().unwrap(), vec![1, 2, 2, 3, 3, 3, 0]);
  }

  #[rxcore_macro::test]
  fn waits_for_inner_sources() {
    let outer: Subject<i32> = Subject::new();
    let inner: Subject<i32> = Subject::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    let c_inner = inner.clone();
    outer
      .clone()
      .flat_map(move |v| c_inner.clone().map(move |x| x + v))
      .subscribe_complete(move |v| n.lock().unwrap().push(v), move || c.lock().unwrap().push(-1));

    outer.clone().next(10);
    outer.clone().next(20);
    inner.clone().next(1);
    outer.clone().complete();
    assert_eq!(*log.lock().unwrap(), vec![11, 21]);
    inner.clone().complete();
    assert_eq!(*log.lock().unwrap(), vec![11, 21, -1]);
  }
}
