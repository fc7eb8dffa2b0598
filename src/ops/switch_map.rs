//! SwitchMap operator implementation
//!
//! Only the most recent inner observable is mirrored. A new outer value
//! releases the current inner subscription before the next one starts, so
//! values still in flight from the old inner are dropped. The result
//! completes once the outer source completed and the last inner one did too.

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{CompositeSubscription, SerialSubscription},
};

#[derive(Clone)]
pub struct SwitchMap<S, F> {
  pub source: S,
  pub func: F,
}

impl<S, F, Inner> ObservableType for SwitchMap<S, F>
where
  S: ObservableType,
  F: FnMut(S::Item) -> Inner,
  Inner: ObservableType,
{
  type Item = Inner::Item;
  type Err = S::Err;
}

// ==================== Shared State ====================

pub struct SwitchState<O> {
  observer: Option<O>,
  generation: u64,
  inner_active: bool,
  outer_done: bool,
}

pub struct SwitchOuterObserver<O, F> {
  state: MutArc<SwitchState<O>>,
  func: F,
  inner: SerialSubscription,
  all: CompositeSubscription,
}

pub struct SwitchInnerObserver<O> {
  state: MutArc<SwitchState<O>>,
  id: u64,
  all: CompositeSubscription,
}

fn fail<O, Item, Err>(observer: Option<O>, err: Err, all: &CompositeSubscription)
where
  O: Observer<Item, Err>,
{
  if let Some(observer) = observer {
    observer.error(err);
    all.dispose();
  }
}

// ==================== Observer Implementations ====================

impl<O, F, Item, Err, Inner> Observer<Item, Err> for SwitchOuterObserver<O, F>
where
  F: FnMut(Item) -> Inner,
  Inner: CoreObservable<SwitchInnerObserver<O>, Err = Err>,
  Inner::Unsub: Send + 'static,
  O: Observer<Inner::Item, Err>,
{
  fn next(&mut self, value: Item) {
    let id = {
      let mut state = self.state.rc_deref_mut();
      if state.observer.is_none() {
        return;
      }
      state.generation += 1;
      state.inner_active = true;
      state.generation
    };
    self.inner.clear();
    let inner = (self.func)(value);
    let observer = SwitchInnerObserver { state: self.state.clone(), id, all: self.all.clone() };
    self.inner.set(inner.actual_subscribe(observer));
  }

  fn error(self, err: Err) {
    let observer = self.state.rc_deref_mut().observer.take();
    fail::<O, Inner::Item, Err>(observer, err, &self.all);
  }

  fn complete(self) {
    let observer = {
      let mut state = self.state.rc_deref_mut();
      state.outer_done = true;
      if state.inner_active { None } else { state.observer.take() }
    };
    if let Some(observer) = observer {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool {
    self.state.rc_deref_mut().observer.as_ref().is_none_or(O::is_closed)
  }
}

impl<O, Item, Err> Observer<Item, Err> for SwitchInnerObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    let mut state = self.state.rc_deref_mut();
    if state.generation == self.id
      && let Some(observer) = state.observer.as_mut()
    {
      observer.next(value);
    }
  }

  fn error(self, err: Err) {
    let observer = {
      let mut state = self.state.rc_deref_mut();
      if state.generation != self.id {
        return;
      }
      state.observer.take()
    };
    fail::<O, Item, Err>(observer, err, &self.all);
  }

  fn complete(self) {
    let observer = {
      let mut state = self.state.rc_deref_mut();
      if state.generation != self.id {
        return;
      }
      state.inner_active = false;
      if state.outer_done { state.observer.take() } else { None }
    };
    if let Some(observer) = observer {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool {
    let state = self.state.rc_deref_mut();
    state.generation != self.id || state.observer.as_ref().is_none_or(O::is_closed)
  }
}

// ==================== CoreObservable Implementation ====================

impl<S, F, O> CoreObservable<O> for SwitchMap<S, F>
where
  S: CoreObservable<SwitchOuterObserver<O, F>>,
  S::Unsub: Send + 'static,
  Self: ObservableType,
{
  type Unsub = CompositeSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let SwitchMap { source, func } = self;
    let state = MutArc::own(SwitchState {
      observer: Some(observer),
      generation: 0,
      inner_active: false,
      outer_done: false,
    });
    let all = CompositeSubscription::new();
    let inner = SerialSubscription::new();
    all.add(inner.clone());
    let outer = SwitchOuterObserver { state, func, inner, all: all.clone() };
    all.add(source.actual_subscribe(outer));
    all
  }
}
