//! Zip operator implementation
//!
//! Zip pairs values by position. Each side buffers what the other side has
//! not matched yet; the result completes as soon as one side completed and
//! has nothing left to pair, which discards the excess of the longer side.

use std::collections::VecDeque;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{CompositeSubscription, Subscription},
};

// ==================== Zip Operator ====================

#[derive(Clone)]
pub struct Zip<A, B> {
  pub first: A,
  pub second: B,
}

impl<A, B> ObservableType for Zip<A, B>
where
  A: ObservableType,
  B: ObservableType<Err = A::Err>,
{
  type Item = (A::Item, B::Item);
  type Err = A::Err;
}

// ==================== Shared State ====================

pub struct ZipState<O, A, B> {
  observer: Option<O>,
  buffer_a: VecDeque<A>,
  buffer_b: VecDeque<B>,
  completed_a: bool,
  completed_b: bool,
}

impl<O, A, B> ZipState<O, A, B> {
  /// Takes the observer out once no further pair can be formed.
  fn exhausted(&mut self) -> Option<O> {
    let done = (self.completed_a && self.buffer_a.is_empty())
      || (self.completed_b && self.buffer_b.is_empty());
    if done { self.observer.take() } else { None }
  }
}

/// Observer for the first source.
pub struct ZipAObserver<O, A, B> {
  state: MutArc<ZipState<O, A, B>>,
  subs: CompositeSubscription,
}

/// Observer for the second source.
pub struct ZipBObserver<O, A, B> {
  state: MutArc<ZipState<O, A, B>>,
  subs: CompositeSubscription,
}

fn finish<O: Observer<(A, B), Err>, A, B, Err>(observer: Option<O>, subs: &CompositeSubscription) {
  if let Some(observer) = observer {
    observer.complete();
    subs.dispose();
  }
}

fn fail<O: Observer<(A, B), Err>, A, B, Err>(
  state: &MutArc<ZipState<O, A, B>>, subs: &CompositeSubscription, err: Err,
) {
  let observer = state.rc_deref_mut().observer.take();
  if let Some(observer) = observer {
    observer.error(err);
    subs.dispose();
  }
}

// ==================== Observer Implementations ====================

impl<O, A, B, Err> Observer<A, Err> for ZipAObserver<O, A, B>
where
  O: Observer<(A, B), Err>,
{
  fn next(&mut self, value: A) {
    let finished = {
      let mut state = self.state.rc_deref_mut();
      if state.observer.is_none() {
        return;
      }
      match state.buffer_b.pop_front() {
        Some(b) => {
          if let Some(observer) = state.observer.as_mut() {
            observer.next((value, b));
          }
          state.exhausted()
        }
        None => {
          state.buffer_a.push_back(value);
          None
        }
      }
    };
    finish::<O, A, B, Err>(finished, &self.subs);
  }

  fn error(self, err: Err) { fail(&self.state, &self.subs, err) }

  fn complete(self) {
    let finished = {
      let mut state = self.state.rc_deref_mut();
      state.completed_a = true;
      state.exhausted()
    };
    finish::<O, A, B, Err>(finished, &self.subs);
  }

  fn is_closed(&self) -> bool {
    self.state.rc_deref_mut().observer.as_ref().is_none_or(O::is_closed)
  }
}

impl<O, A, B, Err> Observer<B, Err> for ZipBObserver<O, A, B>
where
  O: Observer<(A, B), Err>,
{
  fn next(&mut self, value: B) {
    let finished = {
      let mut state = self.state.rc_deref_mut();
      if state.observer.is_none() {
        return;
      }
      match state.buffer_a.pop_front() {
        Some(a) => {
          if let Some(observer) = state.observer.as_mut() {
            observer.next((a, value));
          }
          state.exhausted()
        }
        None => {
          state.buffer_b.push_back(value);
          None
        }
      }
    };
    finish::<O, A, B, Err>(finished, &self.subs);
  }

  fn error(self, err: Err) { fail(&self.state, &self.subs, err) }

  fn complete(self) {
    let finished = {
      let mut state = self.state.rc_deref_mut();
      state.completed_b = true;
      state.exhausted()
    };
    finish::<O, A, B, Err>(finished, &self.subs);
  }

  fn is_closed(&self) -> bool {
    self.state.rc_deref_mut().observer.as_ref().is_none_or(O::is_closed)
  }
}

// ==================== CoreObservable Implementation ====================

type ItemOf<S> = <S as ObservableType>::Item;

impl<A, B, O> CoreObservable<O> for Zip<A, B>
where
  A: ObservableType,
  B: ObservableType<Err = A::Err>,
  A: CoreObservable<ZipAObserver<O, ItemOf<A>, ItemOf<B>>>,
  B: CoreObservable<ZipBObserver<O, ItemOf<A>, ItemOf<B>>>,
  A::Unsub: Send + 'static,
  B::Unsub: Send + 'static,
{
  type Unsub = CompositeSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let Zip { first, second } = self;
    let state = MutArc::own(ZipState {
      observer: Some(observer),
      buffer_a: VecDeque::new(),
      buffer_b: VecDeque::new(),
      completed_a: false,
      completed_b: false,
    });
    let subs = CompositeSubscription::new();
    subs.add(first.actual_subscribe(ZipAObserver { state: state.clone(), subs: subs.clone() }));
    if !subs.is_closed() {
      subs.add(second.actual_subscribe(ZipBObserver { state, subs: subs.clone() }));
    }
    subs
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn pairs_by_position() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    observable::range(0, 3)
      .zip(observable::range(100, 3))
      .map(|(a, b)| a + b)
      .subscribe_complete(move |v| n.lock().unwrap().push(v), move || c.lock().unwrap().push(-1));
    assert_eq!(*log.lock().unwrap(), vec![100, 102, 104, -1]);
  }

  #[rxcore_macro::test]
  fn shorter_side_decides_completion() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    observable::range(0, 3)
      .zip(observable::of(100_i64))
      .map(|(a, b)| a + b)
      .subscribe_complete(move |v| n.lock().unwrap().push(v), move || c.lock().unwrap().push(-1));
    assert_eq!(*log.lock().unwrap(), vec![100, -1]);
  }

  #[rxcore_macro::test]
  fn buffers_until_partner_arrives() {
    let a: Subject<i32> = Subject::new();
    let b: Subject<&'static str> = Subject::new();
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    a.clone().zip(b.clone()).subscribe(move |v| c_out.lock().unwrap().push(v));

    a.clone().next(1);
    a.clone().next(2);
    b.clone().next("x");
    assert_eq!(*out.lock().unwrap(), vec![(1, "x")]);
    a.clone().complete();
    b.clone().next("y");
    assert_eq!(*out.lock().unwrap(), vec![(1, "x"), (2, "y")]);
    assert_eq!(b.subscriber_count(), 0);
  }
}
