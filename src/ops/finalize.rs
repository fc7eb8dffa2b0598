//! Finalize operator implementation

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::Subscription,
};

#[derive(Clone)]
pub struct Finalize<S, F> {
  pub source: S,
  pub func: F,
}

impl<S: ObservableType, F> ObservableType for Finalize<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

fn run_once<F: FnOnce()>(func: &MutArc<Option<F>>) {
  let func = func.rc_deref_mut().take();
  if let Some(func) = func {
    func();
  }
}

pub struct FinalizeObserver<O, F> {
  observer: O,
  func: MutArc<Option<F>>,
}

impl<O, F, Item, Err> Observer<Item, Err> for FinalizeObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnOnce(),
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    self.observer.error(err);
    run_once(&self.func);
  }

  fn complete(self) {
    self.observer.complete();
    run_once(&self.func);
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

/// Releases the upstream, then runs the callback if no terminal event did.
pub struct FinalizeSubscription<U, F> {
  source: U,
  func: MutArc<Option<F>>,
}

impl<U: Subscription, F: FnOnce()> Subscription for FinalizeSubscription<U, F> {
  fn unsubscribe(self) {
    self.source.unsubscribe();
    run_once(&self.func);
  }

  fn is_closed(&self) -> bool { self.func.rc_deref_mut().is_none() }
}

impl<S, F, O> CoreObservable<O> for Finalize<S, F>
where
  S: CoreObservable<FinalizeObserver<O, F>>,
  F: FnOnce(),
{
  type Unsub = FinalizeSubscription<S::Unsub, F>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Finalize { source, func } = self;
    let func = MutArc::own(Some(func));
    let unsub = source.actual_subscribe(FinalizeObserver { observer, func: func.clone() });
    FinalizeSubscription { source: unsub, func }
  }
}
