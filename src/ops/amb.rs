//! Amb operator implementation
//!
//! Subscribes to every source; the first one to send any notification wins
//! and every other source is released at that moment.

use std::sync::Arc;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{CompositeSubscription, Subscription},
};

#[derive(Clone)]
pub struct Amb<S> {
  pub sources: Vec<S>,
}

impl<S: ObservableType> ObservableType for Amb<S> {
  type Item = S::Item;
  type Err = S::Err;
}

pub struct AmbState<O> {
  observer: Option<O>,
  winner: Option<usize>,
}

pub struct AmbObserver<O> {
  index: usize,
  state: MutArc<AmbState<O>>,
  // one group per source, so losers can be released individually
  subs: Arc<[CompositeSubscription]>,
}

impl<O> AmbObserver<O> {
  /// Claims the win for this source. Returns `None` if another source won,
  /// otherwise whether this call decided the race.
  fn claim(&self, state: &mut AmbState<O>) -> Option<bool> {
    match state.winner {
      Some(winner) if winner == self.index => Some(false),
      Some(_) => None,
      None => {
        state.winner = Some(self.index);
        Some(true)
      }
    }
  }

  fn release_losers(&self) {
    for (idx, sub) in self.subs.iter().enumerate() {
      if idx != self.index {
        sub.dispose();
      }
    }
  }
}

impl<O, Item, Err> Observer<Item, Err> for AmbObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    let decided = {
      let mut state = self.state.rc_deref_mut();
      let Some(decided) = self.claim(&mut state) else { return };
      if let Some(observer) = state.observer.as_mut() {
        observer.next(value);
      }
      decided
    };
    if decided {
      self.release_losers();
    }
  }

  fn error(self, err: Err) {
    let observer = {
      let mut state = self.state.rc_deref_mut();
      if self.claim(&mut state).is_none() {
        return;
      }
      state.observer.take()
    };
    self.release_losers();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    let observer = {
      let mut state = self.state.rc_deref_mut();
      if self.claim(&mut state).is_none() {
        return;
      }
      state.observer.take()
    };
    self.release_losers();
    if let Some(observer) = observer {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool {
    let state = self.state.rc_deref_mut();
    state.winner.is_some_and(|winner| winner != self.index)
      || state.observer.as_ref().is_none_or(O::is_closed)
  }
}

impl<S, O> CoreObservable<O> for Amb<S>
where
  S: CoreObservable<AmbObserver<O>>,
  S::Unsub: Send + 'static,
  O: Observer<S::Item, S::Err>,
{
  type Unsub = CompositeSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let all = CompositeSubscription::new();
    if self.sources.is_empty() {
      observer.complete();
      return all;
    }
    let subs: Arc<[CompositeSubscription]> =
      self.sources.iter().map(|_| CompositeSubscription::new()).collect();
    for sub in subs.iter() {
      all.add(sub.clone());
    }

    let state = MutArc::own(AmbState { observer: Some(observer), winner: None });
    for (index, source) in self.sources.into_iter().enumerate() {
      if state.rc_deref_mut().winner.is_some() || all.is_closed() {
        break;
      }
      let amb = AmbObserver { index, state: state.clone(), subs: subs.clone() };
      subs[index].add(source.actual_subscribe(amb));
    }
    all
  }
}
