use std::{
  cell::RefCell,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use smallvec::SmallVec;

use super::{
  policy::{SubjectPhase, SubjectPolicy},
  subject_subscription::SubjectSubscription,
};
use crate::{
  observable::{CoreObservable, ObservableType},
  observer::{BoxedObserver, Observer, boxed},
  rc::MutArc,
  subscription::Registry,
};

// ============================================================================
// Shared state
// ============================================================================

/// One subscriber. The observer sits in its own slot so broadcasting can
/// run without the subject lock, and so a replay can hold the slot while
/// live values queue up behind it.
pub(crate) struct Entry<Item, Err> {
  pub(crate) observer: MutArc<Option<BoxedObserver<Item, Err>>>,
  pub(crate) closed: Arc<AtomicBool>,
}

impl<Item, Err> Clone for Entry<Item, Err> {
  fn clone(&self) -> Self { Self { observer: self.observer.clone(), closed: self.closed.clone() } }
}

pub(crate) enum Terminal<Err> {
  Active,
  Completed,
  Errored(Err),
}

pub(crate) struct SubjectState<Item, Err, P> {
  pub(crate) observers: Registry<Entry<Item, Err>>,
  pub(crate) terminal: Terminal<Err>,
  pub(crate) policy: P,
}

impl<Item, Err, P> SubjectState<Item, Err, P> {
  fn phase(&self) -> SubjectPhase {
    match self.terminal {
      Terminal::Active => SubjectPhase::Active,
      Terminal::Completed => SubjectPhase::Completed,
      Terminal::Errored(_) => SubjectPhase::Errored,
    }
  }

  /// Detaches every subscriber, marking their subscriptions closed.
  fn take_observers(&mut self) -> Vec<Entry<Item, Err>> {
    self
      .observers
      .drain()
      .inspect(|e| e.closed.store(true, Ordering::Release))
      .collect()
  }
}

// ============================================================================
// Re-entrancy guard
// ============================================================================

thread_local! {
  /// Subjects this thread is delivering for, keyed by state address.
  static EMITTING: RefCell<SmallVec<[usize; 4]>> = RefCell::new(SmallVec::new());
}

/// Marks a subject as delivering on the current thread until dropped.
///
/// A subscriber's slot stays locked while it runs, so pushing into the same
/// subject from inside one of its callbacks would wait on itself forever.
/// That case panics here instead.
struct EmitGuard(usize);

impl EmitGuard {
  fn enter(key: usize) -> Self {
    EMITTING.with(|emitting| {
      let mut emitting = emitting.borrow_mut();
      if emitting.contains(&key) {
        drop(emitting);
        panic!(
          "re-entrant emission: a subject's subscriber called next/error/complete on the same \
           subject; move the feedback behind a scheduler (e.g. `observe_on`)"
        );
      }
      emitting.push(key);
    });
    Self(key)
  }
}

impl Drop for EmitGuard {
  fn drop(&mut self) {
    EMITTING.with(|emitting| {
      let mut emitting = emitting.borrow_mut();
      if let Some(pos) = emitting.iter().rposition(|k| *k == self.0) {
        emitting.remove(pos);
      }
    });
  }
}

// ============================================================================
// BaseSubject
// ============================================================================

/// Hot multicast primitive, both an observer and an observable.
///
/// Clones share the same subscriber list and state. `P` decides what is
/// remembered for late subscribers; see the aliases in [`crate::subject`].
///
/// Emission is not re-entrant: calling `next`, `error` or `complete` on a
/// subject from inside one of its own subscribers (or during the replay a
/// new subscriber receives) panics. Different threads may emit at the same
/// time, and subscribing or unsubscribing from a callback is fine.
pub struct BaseSubject<Item, Err, P> {
  pub(crate) state: MutArc<SubjectState<Item, Err, P>>,
}

impl<Item, Err, P> Clone for BaseSubject<Item, Err, P> {
  fn clone(&self) -> Self { Self { state: self.state.clone() } }
}

impl<Item, Err, P> BaseSubject<Item, Err, P> {
  pub fn with_policy(policy: P) -> Self {
    Self {
      state: MutArc::own(SubjectState {
        observers: Registry::new(),
        terminal: Terminal::Active,
        policy,
      }),
    }
  }

  /// Number of live subscribers.
  pub fn subscriber_count(&self) -> usize { self.state.rc_deref_mut().observers.len() }

  /// `true` once the subject completed or errored.
  pub fn is_terminated(&self) -> bool {
    !matches!(self.state.rc_deref_mut().terminal, Terminal::Active)
  }
}

impl<Item, Err, P> ObservableType for BaseSubject<Item, Err, P> {
  type Item = Item;
  type Err = Err;
}

impl<Item, Err, P> Observer<Item, Err> for BaseSubject<Item, Err, P>
where
  Item: Clone,
  Err: Clone,
  P: SubjectPolicy<Item>,
{
  fn next(&mut self, value: Item) {
    let _emitting = EmitGuard::enter(self.state.addr());
    let snapshot = {
      let mut state = self.state.rc_deref_mut();
      if !matches!(state.terminal, Terminal::Active) || !state.policy.on_next(&value) {
        return;
      }
      state.observers.snapshot()
    };

    let mut iter = snapshot.iter().peekable();
    while let Some(entry) = iter.next() {
      // Re-checked per entry: an earlier observer may have unsubscribed a
      // later one.
      if entry.closed.load(Ordering::Acquire) {
        continue;
      }
      let mut slot = entry.observer.rc_deref_mut();
      let Some(observer) = slot.as_mut() else { continue };
      if iter.peek().is_some() {
        observer.next(value.clone());
      } else {
        observer.next(value);
        break;
      }
    }
  }

  fn error(self, err: Err) {
    let _emitting = EmitGuard::enter(self.state.addr());
    let entries = {
      let mut state = self.state.rc_deref_mut();
      if !matches!(state.terminal, Terminal::Active) {
        return;
      }
      state.terminal = Terminal::Errored(err.clone());
      state.take_observers()
    };
    for entry in entries {
      let observer = entry.observer.rc_deref_mut().take();
      if let Some(observer) = observer {
        observer.error(err.clone());
      }
    }
  }

  fn complete(self) {
    let _emitting = EmitGuard::enter(self.state.addr());
    let (entries, last) = {
      let mut state = self.state.rc_deref_mut();
      if !matches!(state.terminal, Terminal::Active) {
        return;
      }
      let last = state.policy.on_complete();
      state.terminal = Terminal::Completed;
      (state.take_observers(), last)
    };
    for entry in entries {
      let observer = entry.observer.rc_deref_mut().take();
      if let Some(mut observer) = observer {
        if let Some(last) = last.clone() {
          observer.next(last);
        }
        observer.complete();
      }
    }
  }

  fn is_closed(&self) -> bool { self.is_terminated() }
}

impl<Item, Err, P, O> CoreObservable<O> for BaseSubject<Item, Err, P>
where
  O: Observer<Item, Err> + Send + 'static,
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  P: SubjectPolicy<Item>,
{
  type Unsub = SubjectSubscription<Item, Err, P>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let mut state = self.state.rc_deref_mut();
    let phase = state.phase();
    let replay = state.policy.replay(phase);
    let ended = match &state.terminal {
      Terminal::Active => None,
      Terminal::Completed => Some(None),
      Terminal::Errored(err) => Some(Some(err.clone())),
    };

    if let Some(err) = ended {
      drop(state);
      let mut observer = observer;
      for value in replay {
        observer.next(value);
      }
      match err {
        Some(err) => observer.error(err),
        None => observer.complete(),
      }
      return SubjectSubscription::closed(self.state.clone());
    }

    let entry = Entry { observer: MutArc::own(None), closed: Arc::new(AtomicBool::new(false)) };
    let id = state.observers.add(entry.clone());
    // Taken before the subject lock is released: live values wait for the
    // replay.
    let mut slot = entry.observer.rc_deref_mut();
    drop(state);

    let mut observer: BoxedObserver<Item, Err> = boxed(observer);
    {
      let _emitting = EmitGuard::enter(self.state.addr());
      for value in replay {
        observer.next(value);
      }
    }
    *slot = Some(observer);
    drop(slot);
    SubjectSubscription::new(self.state.clone(), id, entry.closed)
  }
}
