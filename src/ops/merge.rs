//! Merge operators
//!
//! `merge` combines two sources, `merge_all` any number of sources of the
//! same type. Values are forwarded in arrival order; the result completes
//! once every source completed, and the first error wins and releases every
//! other source.

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{CompositeSubscription, Subscription},
};

/// Merges two sources with the same item and error types.
#[derive(Clone)]
pub struct Merge<A, B> {
  pub first: A,
  pub second: B,
}

/// Merges a list of sources.
#[derive(Clone)]
pub struct MergeAll<S> {
  pub sources: Vec<S>,
}

impl<A: ObservableType, B> ObservableType for Merge<A, B> {
  type Item = A::Item;
  type Err = A::Err;
}

impl<S: ObservableType> ObservableType for MergeAll<S> {
  type Item = S::Item;
  type Err = S::Err;
}

// ==================== Shared State ====================

pub struct MergeState<O> {
  observer: Option<O>,
  active: usize,
}

/// Observer handed to every merged source.
pub struct MergeObserver<O> {
  state: MutArc<MergeState<O>>,
  subs: CompositeSubscription,
}

impl<O> MergeObserver<O> {
  pub(crate) fn new(observer: O, active: usize, subs: CompositeSubscription) -> Self {
    MergeObserver { state: MutArc::own(MergeState { observer: Some(observer), active }), subs }
  }

  /// Another observer for the same merged output, counted as one more
  /// active source.
  pub(crate) fn fork_active(&self) -> Option<Self> {
    let mut state = self.state.rc_deref_mut();
    state.observer.as_ref()?;
    state.active += 1;
    Some(MergeObserver { state: self.state.clone(), subs: self.subs.clone() })
  }

  pub(crate) fn subscription(&self) -> &CompositeSubscription { &self.subs }
}

impl<O, Item, Err> Observer<Item, Err> for MergeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(observer) = self.state.rc_deref_mut().observer.as_mut() {
      observer.next(value);
    }
  }

  fn error(self, err: Err) {
    let observer = self.state.rc_deref_mut().observer.take();
    if let Some(observer) = observer {
      observer.error(err);
      self.subs.dispose();
    }
  }

  fn complete(self) {
    let observer = {
      let mut state = self.state.rc_deref_mut();
      state.active = state.active.saturating_sub(1);
      if state.active == 0 { state.observer.take() } else { None }
    };
    if let Some(observer) = observer {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool {
    self.state.rc_deref_mut().observer.as_ref().is_none_or(O::is_closed)
  }
}

// ==================== CoreObservable Implementations ====================

impl<A, B, O> CoreObservable<O> for Merge<A, B>
where
  A: CoreObservable<MergeObserver<O>>,
  B: CoreObservable<MergeObserver<O>, Item = A::Item, Err = A::Err>,
  A::Unsub: Send + 'static,
  B::Unsub: Send + 'static,
{
  type Unsub = CompositeSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Merge { first, second } = self;
    let state = MutArc::own(MergeState { observer: Some(observer), active: 2 });
    let subs = CompositeSubscription::new();
    subs.add(first.actual_subscribe(MergeObserver { state: state.clone(), subs: subs.clone() }));
    if !subs.is_closed() {
      subs.add(second.actual_subscribe(MergeObserver { state, subs: subs.clone() }));
    }
    subs
  }
}

impl<S, O> CoreObservable<O> for MergeAll<S>
where
  S: CoreObservable<MergeObserver<O>>,
  S::Unsub: Send + 'static,
  O: Observer<S::Item, S::Err>,
{
  type Unsub = CompositeSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let subs = CompositeSubscription::new();
    if self.sources.is_empty() {
      observer.complete();
      return subs;
    }
    let state = MutArc::own(MergeState { observer: Some(observer), active: self.sources.len() });
    for source in self.sources {
      if subs.is_closed() {
        break;
      }
      subs.add(source.actual_subscribe(MergeObserver { state: state.clone(), subs: subs.clone() }));
    }
    subs
  }
}
