//! Concat operators
//!
//! Sources run one after another: the next one is subscribed only after the
//! previous one completed. An error ends the whole sequence and the
//! remaining sources are never subscribed.

use std::collections::VecDeque;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  subscription::{BoxedSubscription, CompositeSubscription, Subscription},
};

// ==================== Concat ====================

/// Runs `first`, then `second`.
#[derive(Clone)]
pub struct Concat<A, B> {
  pub first: A,
  pub second: B,
}

impl<A: ObservableType, B> ObservableType for Concat<A, B> {
  type Item = A::Item;
  type Err = A::Err;
}

pub struct ConcatObserver<O, B> {
  observer: O,
  second: B,
  subs: CompositeSubscription,
}

impl<O, B, Item, Err> Observer<Item, Err> for ConcatObserver<O, B>
where
  O: Observer<Item, Err>,
  B: CoreObservable<O>,
  B::Unsub: Send + 'static,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) {
    let ConcatObserver { observer, second, subs } = self;
    if subs.is_closed() {
      return;
    }
    subs.add(second.actual_subscribe(observer));
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<A, B, O> CoreObservable<O> for Concat<A, B>
where
  A: CoreObservable<ConcatObserver<O, B>>,
  B: CoreObservable<O, Item = A::Item, Err = A::Err>,
  A::Unsub: Send + 'static,
  B::Unsub: Send + 'static,
{
  type Unsub = CompositeSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Concat { first, second } = self;
    let subs = CompositeSubscription::new();
    subs.add(first.actual_subscribe(ConcatObserver { observer, second, subs: subs.clone() }));
    subs
  }
}

// ==================== ConcatAll ====================

/// Runs a queue of sources of the same type in order.
#[derive(Clone)]
pub struct ConcatAll<S> {
  pub sources: VecDeque<S>,
}

impl<S: ObservableType> ObservableType for ConcatAll<S> {
  type Item = S::Item;
  type Err = S::Err;
}

/// Observer for one source of a [`ConcatAll`].
///
/// # Internal Implementation Detail
///
/// Public only because it shows up in trait bounds.
pub struct ConcatAllObserver<O, S> {
  observer: O,
  rest: VecDeque<S>,
  subs: CompositeSubscription,
  // function pointer breaks the `S: CoreObservable<Self>` cycle
  subscribe_fn: fn(S, ConcatAllObserver<O, S>) -> BoxedSubscription,
}

impl<O, S> ConcatAllObserver<O, S> {
  fn subscribe_impl(source: S, observer: Self) -> BoxedSubscription
  where
    S: CoreObservable<Self>,
    S::Unsub: Send + 'static,
  {
    source.actual_subscribe(observer).into_boxed()
  }
}

impl<O, S, Item, Err> Observer<Item, Err> for ConcatAllObserver<O, S>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    if self.subs.is_closed() {
      return;
    }
    match self.rest.pop_front() {
      Some(next) => {
        let subs = self.subs.clone();
        let subscribe_fn = self.subscribe_fn;
        subs.add(subscribe_fn(next, self));
      }
      None => self.observer.complete(),
    }
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<S, O> CoreObservable<O> for ConcatAll<S>
where
  S: CoreObservable<ConcatAllObserver<O, S>>,
  S::Unsub: Send + 'static,
  O: Observer<S::Item, S::Err>,
{
  type Unsub = CompositeSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let mut rest = self.sources;
    let subs = CompositeSubscription::new();
    match rest.pop_front() {
      Some(first) => {
        let observer = ConcatAllObserver {
          observer,
          rest,
          subs: subs.clone(),
          subscribe_fn: ConcatAllObserver::subscribe_impl,
        };
        subs.add(ConcatAllObserver::subscribe_impl(first, observer));
      }
      None => observer.complete(),
    }
    subs
  }
}
