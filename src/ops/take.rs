//! Take family: `take`, `take_while`, `take_until` and `take_last`.

use std::{collections::VecDeque, marker::PhantomData};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{CompositeSubscription, SerialSubscription, Subscription},
};

// ==================== Take ====================

/// Emits the first `count` values, then completes.
///
/// `take(0)` completes on subscription without subscribing to the source.
/// Reaching `count` releases the upstream subscription.
#[derive(Clone)]
pub struct Take<S> {
  pub source: S,
  pub count: usize,
}

impl<S: ObservableType> ObservableType for Take<S> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct TakeObserver<O> {
  observer: Option<O>,
  remaining: usize,
  upstream: SerialSubscription,
}

impl<O, Item, Err> Observer<Item, Err> for TakeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.remaining == 0 {
      return;
    }
    if let Some(observer) = self.observer.as_mut() {
      self.remaining -= 1;
      observer.next(value);
      if self.remaining == 0
        && let Some(observer) = self.observer.take()
      {
        observer.complete();
        self.upstream.dispose();
      }
    }
  }

  fn error(self, err: Err) { Observer::<Item, Err>::error(self.observer, err) }

  fn complete(self) { Observer::<Item, Err>::complete(self.observer) }

  fn is_closed(&self) -> bool { Observer::<Item, Err>::is_closed(&self.observer) }
}

impl<S, O> CoreObservable<O> for Take<S>
where
  S: CoreObservable<TakeObserver<O>>,
  S::Unsub: Send + 'static,
  O: Observer<S::Item, S::Err>,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Take { source, count } = self;
    let upstream = SerialSubscription::new();
    if count == 0 {
      observer.complete();
      upstream.dispose();
      return upstream;
    }
    let taker = TakeObserver { observer: Some(observer), remaining: count, upstream: upstream.clone() };
    upstream.set(source.actual_subscribe(taker));
    upstream
  }
}

// ==================== TakeWhile ====================

/// Emits values while `predicate` holds and completes on the first value
/// that fails it, releasing the upstream subscription.
#[derive(Clone)]
pub struct TakeWhile<S, F> {
  pub source: S,
  pub predicate: F,
}

impl<S: ObservableType, F> ObservableType for TakeWhile<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct TakeWhileObserver<O, F> {
  observer: Option<O>,
  predicate: F,
  upstream: SerialSubscription,
}

impl<O, F, Item, Err> Observer<Item, Err> for TakeWhileObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    if (self.predicate)(&value) {
      Observer::<Item, Err>::next(&mut self.observer, value);
    } else if let Some(observer) = self.observer.take() {
      observer.complete();
      self.upstream.dispose();
    }
  }

  fn error(self, err: Err) { Observer::<Item, Err>::error(self.observer, err) }

  fn complete(self) { Observer::<Item, Err>::complete(self.observer) }

  fn is_closed(&self) -> bool { Observer::<Item, Err>::is_closed(&self.observer) }
}

impl<S, F, O> CoreObservable<O> for TakeWhile<S, F>
where
  S: CoreObservable<TakeWhileObserver<O, F>>,
  S::Unsub: Send + 'static,
  F: FnMut(&S::Item) -> bool,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let TakeWhile { source, predicate } = self;
    let upstream = SerialSubscription::new();
    let taker = TakeWhileObserver { observer: Some(observer), predicate, upstream: upstream.clone() };
    upstream.set(source.actual_subscribe(taker));
    upstream
  }
}

// ==================== TakeUntil ====================

/// Mirrors the source until `notifier` emits, then completes and releases
/// both subscriptions.
#[derive(Clone)]
pub struct TakeUntil<S, N> {
  pub source: S,
  pub notifier: N,
}

impl<S: ObservableType, N> ObservableType for TakeUntil<S, N> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct TakeUntilObserver<O> {
  observer: MutArc<Option<O>>,
  subs: CompositeSubscription,
}

pub struct TakeUntilNotifier<O, Item> {
  observer: MutArc<Option<O>>,
  subs: CompositeSubscription,
  _item: PhantomData<fn(Item)>,
}

impl<O, Item, Err> Observer<Item, Err> for TakeUntilObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { Observer::<Item, Err>::next(&mut self.observer, value) }

  fn error(self, err: Err) {
    Observer::<Item, Err>::error(self.observer, err);
    self.subs.dispose();
  }

  fn complete(self) {
    Observer::<Item, Err>::complete(self.observer);
    self.subs.dispose();
  }

  fn is_closed(&self) -> bool { Observer::<Item, Err>::is_closed(&self.observer) }
}

impl<O, Item, NItem, Err> Observer<NItem, Err> for TakeUntilNotifier<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, _: NItem) {
    Observer::<Item, Err>::complete(self.observer.clone());
    self.subs.dispose();
  }

  fn error(self, err: Err) {
    Observer::<Item, Err>::error(self.observer, err);
    self.subs.dispose();
  }

  fn complete(self) {}

  fn is_closed(&self) -> bool { Observer::<Item, Err>::is_closed(&self.observer) }
}

impl<S, N, O> CoreObservable<O> for TakeUntil<S, N>
where
  S: CoreObservable<TakeUntilObserver<O>>,
  N: CoreObservable<TakeUntilNotifier<O, S::Item>, Err = S::Err>,
  S::Unsub: Send + 'static,
  N::Unsub: Send + 'static,
{
  type Unsub = CompositeSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let TakeUntil { source, notifier } = self;
    let observer = MutArc::own(Some(observer));
    let subs = CompositeSubscription::new();

    let stop = TakeUntilNotifier { observer: observer.clone(), subs: subs.clone(), _item: PhantomData };
    subs.add(notifier.actual_subscribe(stop));
    if !subs.is_closed() {
      subs.add(source.actual_subscribe(TakeUntilObserver { observer, subs: subs.clone() }));
    }
    subs
  }
}

// ==================== TakeLast ====================

/// Emits the last `count` values once the source completes.
#[derive(Clone)]
pub struct TakeLast<S> {
  pub source: S,
  pub count: usize,
}

impl<S: ObservableType> ObservableType for TakeLast<S> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct TakeLastObserver<O, Item> {
  observer: O,
  count: usize,
  queue: VecDeque<Item>,
}

impl<O, Item, Err> Observer<Item, Err> for TakeLastObserver<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.count == 0 {
      return;
    }
    if self.queue.len() == self.count {
      self.queue.pop_front();
    }
    self.queue.push_back(value);
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    for value in self.queue.drain(..) {
      self.observer.next(value);
    }
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, O> CoreObservable<O> for TakeLast<S>
where
  S: CoreObservable<TakeLastObserver<O, <S as ObservableType>::Item>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let TakeLast { source, count } = self;
    source.actual_subscribe(TakeLastObserver { observer, count, queue: VecDeque::new() })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn take_completes_early() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    observable::range(0, 100).take(3).subscribe_complete(
      move |v| n.lock().unwrap().push(v),
      move || c.lock().unwrap().push(-1),
    );
    assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, -1]);
  }

  #[rxcore_macro::test]
  fn take_zero_never_subscribes() {
    let subscribed = Arc::new(Mutex::new(false));
    let done = Arc::new(Mutex::new(false));
    let (c_subscribed, c_done) = (subscribed.clone(), done.clone());
    observable::defer(move || {
      *c_subscribed.lock().unwrap() = true;
      observable::of(1)
    })
    .take(0)
    .subscribe_complete(|_| {}, move || *c_done.lock().unwrap() = true);
    assert!(!*subscribed.lock().unwrap());
    assert!(*done.lock().unwrap());
  }

  #[rxcore_macro::test]
  fn take_while_and_take_last() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    observable::range(1, 10)
      .take_while(|v| *v < 6)
      .take_last(2)
      .subscribe(move |v| c_out.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec![4, 5]);
  }

  #[rxcore_macro::test]
  fn take_until_completes_and_releases() {
    let source: Subject<i32> = Subject::new();
    let stop: Subject<&'static str> = Subject::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    source.clone().take_until(stop.clone()).subscribe_complete(
      move |v| n.lock().unwrap().push(v),
      move || c.lock().unwrap().push(-1),
    );

    source.clone().next(1);
    stop.clone().next("stop");
    source.clone().next(2);
    assert_eq!(*log.lock().unwrap(), vec![1, -1]);
    assert_eq!(source.subscriber_count(), 0);
    assert_eq!(stop.subscriber_count(), 0);
  }

  #[rxcore_macro::test]
  fn take_releases_a_hot_source() {
    let subject: Subject<i32> = Subject::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for _ in 0..5 {
      let c_seen = seen.clone();
      subject.clone().take(1).subscribe(move |v| c_seen.lock().unwrap().push(v));
      subject.clone().next(1);
    }
    assert_eq!(subject.subscriber_count(), 0);
    assert_eq!(*seen.lock().unwrap(), vec![1; 5]);

    subject.clone().take_while(|v| *v < 3).subscribe(|_| {});
    subject.clone().next(2);
    assert_eq!(subject.subscriber_count(), 1);
    subject.clone().next(3);
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[rxcore_macro::test]
  fn take_releases_an_endless_cold_source() {
    let released = Arc::new(Mutex::new(false));
    let c_released = released.clone();
    observable::create::<i32, RxError, _, _>(|emitter| {
      emitter.next(1);
      emitter.next(2);
      ClosureSubscription(move || *c_released.lock().unwrap() = true)
    })
    .take(1)
    .subscribe(|_| {});
    assert!(*released.lock().unwrap());
  }
}
