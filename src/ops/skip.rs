//! Skip family: `skip`, `skip_while` and `skip_until`.

use std::{
  marker::PhantomData,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{CompositeSubscription, Subscription},
};

// ==================== Skip ====================

/// Ignores the first `count` values. Completes without emitting when the
/// source has fewer values.
#[derive(Clone)]
pub struct Skip<S> {
  pub source: S,
  pub count: usize,
}

impl<S: ObservableType> ObservableType for Skip<S> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct SkipObserver<O> {
  observer: O,
  remaining: usize,
}

impl<O, Item, Err> Observer<Item, Err> for SkipObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.remaining > 0 {
      self.remaining -= 1;
    } else {
      self.observer.next(value);
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, O> CoreObservable<O> for Skip<S>
where
  S: CoreObservable<SkipObserver<O>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Skip { source, count } = self;
    source.actual_subscribe(SkipObserver { observer, remaining: count })
  }
}

// ==================== SkipWhile ====================

/// Ignores values while `predicate` holds; once it fails, every later value
/// passes.
#[derive(Clone)]
pub struct SkipWhile<S, F> {
  pub source: S,
  pub predicate: F,
}

impl<S: ObservableType, F> ObservableType for SkipWhile<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct SkipWhileObserver<O, F> {
  observer: O,
  predicate: F,
  skipping: bool,
}

impl<O, F, Item, Err> Observer<Item, Err> for SkipWhileObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if self.skipping && (self.predicate)(&value) {
      return;
    }
    self.skipping = false;
    self.observer.next(value);
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, F, O> CoreObservable<O> for SkipWhile<S, F>
where
  S: CoreObservable<SkipWhileObserver<O, F>>,
  F: FnMut(&S::Item) -> bool,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let SkipWhile { source, predicate } = self;
    source.actual_subscribe(SkipWhileObserver { observer, predicate, skipping: true })
  }
}

// ==================== SkipUntil ====================

/// Ignores values until `notifier` emits. An error from the notifier is
/// forwarded; its completion is not.
#[derive(Clone)]
pub struct SkipUntil<S, N> {
  pub source: S,
  pub notifier: N,
}

impl<S: ObservableType, N> ObservableType for SkipUntil<S, N> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct SkipUntilObserver<O> {
  observer: MutArc<Option<O>>,
  open: Arc<AtomicBool>,
  subs: CompositeSubscription,
}

pub struct SkipUntilNotifier<O, Item> {
  observer: MutArc<Option<O>>,
  open: Arc<AtomicBool>,
  _item: PhantomData<fn(Item)>,
}

impl<O, Item, Err> Observer<Item, Err> for SkipUntilObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.open.load(Ordering::Acquire) {
      Observer::<Item, Err>::next(&mut self.observer, value);
    }
  }

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

impl<O, Item, NItem, Err> Observer<NItem, Err> for SkipUntilNotifier<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, _: NItem) { self.open.store(true, Ordering::Release) }

  fn error(self, err: Err) { Observer::<Item, Err>::error(self.observer, err) }

  fn complete(self) {}

  fn is_closed(&self) -> bool {
    self.open.load(Ordering::Acquire) || Observer::<Item, Err>::is_closed(&self.observer)
  }
}

impl<S, N, O> CoreObservable<O> for SkipUntil<S, N>
where
  S: CoreObservable<SkipUntilObserver<O>>,
  N: CoreObservable<SkipUntilNotifier<O, S::Item>, Err = S::Err>,
  S::Unsub: Send + 'static,
  N::Unsub: Send + 'static,
{
  type Unsub = CompositeSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let SkipUntil { source, notifier } = self;
    let observer = MutArc::own(Some(observer));
    let open = Arc::new(AtomicBool::new(false));
    let subs = CompositeSubscription::new();

    let gate = SkipUntilNotifier { observer: observer.clone(), open: open.clone(), _item: PhantomData };
    subs.add(notifier.actual_subscribe(gate));
    if !subs.is_closed() {
      subs.add(source.actual_subscribe(SkipUntilObserver { observer, open, subs: subs.clone() }));
    }
    subs
  }
}
