//! CombineLatest operator implementation

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{CompositeSubscription, Subscription},
};

/// Combines the latest value of each source with `func` every time either
/// source emits, once both have emitted at least once. Completes when both
/// sources completed.
#[derive(Clone)]
pub struct CombineLatest<A, B, F> {
  pub first: A,
  pub second: B,
  pub func: F,
}

impl<A, B, F, Out> ObservableType for CombineLatest<A, B, F>
where
  A: ObservableType,
  B: ObservableType<Err = A::Err>,
  F: FnMut(A::Item, B::Item) -> Out,
{
  type Item = Out;
  type Err = A::Err;
}

pub struct CombineState<O, F, A, B> {
  observer: Option<O>,
  func: F,
  latest_a: Option<A>,
  latest_b: Option<B>,
  completed: usize,
}

impl<O, F, A, B> CombineState<O, F, A, B> {
  fn emit<Out, Err>(&mut self)
  where
    O: Observer<Out, Err>,
    F: FnMut(A, B) -> Out,
    A: Clone,
    B: Clone,
  {
    if let (Some(a), Some(b), Some(observer)) =
      (self.latest_a.as_ref(), self.latest_b.as_ref(), self.observer.as_mut())
    {
      let value = (self.func)(a.clone(), b.clone());
      observer.next(value);
    }
  }

  fn complete_one(&mut self) -> Option<O> {
    self.completed += 1;
    if self.completed == 2 { self.observer.take() } else { None }
  }
}

pub struct CombineAObserver<O, F, A, B> {
  state: MutArc<CombineState<O, F, A, B>>,
  subs: CompositeSubscription,
}

pub struct CombineBObserver<O, F, A, B> {
  state: MutArc<CombineState<O, F, A, B>>,
  subs: CompositeSubscription,
}

macro_rules! impl_combine_observer {
  ($name:ident, $item:ident, $slot:ident) => {
    impl<O, F, A, B, Out, Err> Observer<$item, Err> for $name<O, F, A, B>
    where
      O: Observer<Out, Err>,
      F: FnMut(A, B) -> Out,
      A: Clone,
      B: Clone,
    {
      fn next(&mut self, value: $item) {
        let mut state = self.state.rc_deref_mut();
        state.$slot = Some(value);
        state.emit::<Out, Err>();
      }

      fn error(self, err: Err) {
        let observer = self.state.rc_deref_mut().observer.take();
        if let Some(observer) = observer {
          observer.error(err);
          self.subs.dispose();
        }
      }

      fn complete(self) {
        let observer = self.state.rc_deref_mut().complete_one();
        if let Some(observer) = observer {
          observer.complete();
        }
      }

      fn is_closed(&self) -> bool {
        self.state.rc_deref_mut().observer.as_ref().is_none_or(O::is_closed)
      }
    }
  };
}

impl_combine_observer!(CombineAObserver, A, latest_a);
impl_combine_observer!(CombineBObserver, B, latest_b);

type ItemOf<S> = <S as ObservableType>::Item;

impl<A, B, F, O, Out> CoreObservable<O> for CombineLatest<A, B, F>
where
  A: ObservableType,
  B: ObservableType<Err = A::Err>,
  F: FnMut(ItemOf<A>, ItemOf<B>) -> Out,
  A: CoreObservable<CombineAObserver<O, F, ItemOf<A>, ItemOf<B>>>,
  B: CoreObservable<CombineBObserver<O, F, ItemOf<A>, ItemOf<B>>>,
  A::Unsub: Send + 'static,
  B::Unsub: Send + 'static,
{
  type Unsub = CompositeSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let CombineLatest { first, second, func } = self;
    let state = MutArc::own(CombineState {
      observer: Some(observer),
      func,
      latest_a: None,
      latest_b: None,
      completed: 0,
    });
    let subs = CompositeSubscription::new();
    subs.add(first.actual_subscribe(CombineAObserver { state: state.clone(), subs: subs.clone() }));
    if !subs.is_closed() {
      subs.add(second.actual_subscribe(CombineBObserver { state, subs: subs.clone() }));
    }
    subs
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn emits_after_both_have_values() {
    let a: Subject<i32> = Subject::new();
    let b: Subject<i32> = Subject::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    a.clone()
      .combine_latest(b.clone(), |x, y| x * 10 + y)
      .subscribe_complete(move |v| n.lock().unwrap().push(v), move || c.lock().unwrap().push(-1));

    a.clone().next(1);
    a.clone().next(2);
    b.clone().next(5);
    a.clone().next(3);
    b.clone().next(6);
    a.clone().complete();
    assert_eq!(*log.lock().unwrap(), vec![25, 35, 36]);
    b.clone().next(7);
    b.clone().complete();
    assert_eq!(*log.lock().unwrap(), vec![25, 35, 36, 37, -1]);
  }
}
