use std::{
  any::Any,
  panic::{self, AssertUnwindSafe},
};

use smallvec::SmallVec;

use super::{BoxedSubscription, Subscription};
use crate::rc::MutArc;

/// An ordered group of subscriptions released together.
///
/// Clones share the same group, so a clone may be handed to observers that
/// need to tear the whole group down. Adding to a released group releases
/// the newcomer immediately.
#[derive(Clone, Default)]
pub struct CompositeSubscription(MutArc<CompositeState>);

#[derive(Default)]
struct CompositeState {
  closed: bool,
  teardown: SmallVec<[BoxedSubscription; 2]>,
}

impl CompositeSubscription {
  pub fn new() -> Self { Self::default() }

  pub fn add<S: Subscription + Send + 'static>(&self, sub: S) {
    if self.is_same(&sub) || sub.is_closed() {
      return;
    }
    let mut pruned = SmallVec::<[BoxedSubscription; 2]>::new();
    let rejected = {
      let mut state = self.0.rc_deref_mut();
      if state.closed {
        Some(sub)
      } else {
        let mut idx = 0;
        while idx < state.teardown.len() {
          if state.teardown[idx].is_closed() {
            pruned.push(state.teardown.remove(idx));
          } else {
            idx += 1;
          }
        }
        state.teardown.push(sub.into_boxed());
        None
      }
    };
    drop(pruned);
    if let Some(sub) = rejected {
      sub.unsubscribe();
    }
  }

  /// Number of children still held.
  pub fn len(&self) -> usize { self.0.rc_deref_mut().teardown.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Releases every child, in insertion order.
  ///
  /// A child that panics does not stop the others from being released; the
  /// first panic is resumed once all children were visited.
  pub fn dispose(&self) {
    let teardown = {
      let mut state = self.0.rc_deref_mut();
      if state.closed {
        return;
      }
      state.closed = true;
      std::mem::take(&mut state.teardown)
    };

    let mut first_panic = None;
    for sub in teardown {
      if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| sub.unsubscribe())) {
        tracing::warn!("child subscription panicked while unsubscribing");
        if first_panic.is_none() {
          first_panic = Some(payload);
        }
      }
    }
    if let Some(payload) = first_panic {
      panic::resume_unwind(payload);
    }
  }

  fn is_same(&self, other: &dyn Any) -> bool {
    other
      .downcast_ref::<Self>()
      .is_some_and(|other| self.0.ptr_eq(&other.0))
  }
}

impl Subscription for CompositeSubscription {
  fn unsubscribe(self) { self.dispose() }

  fn is_closed(&self) -> bool { self.0.rc_deref_mut().closed }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  };

  use super::*;
  use crate::subscription::ClosureSubscription;

  fn counter() -> (Arc<AtomicUsize>, impl Subscription + Send + 'static) {
    let hits = Arc::new(AtomicUsize::new(0));
    let c_hits = hits.clone();
    (hits, ClosureSubscription(move || {
      c_hits.fetch_add(1, Ordering::SeqCst);
    }))
  }

  #[rxcore_macro::test]
  fn dispose_is_idempotent() {
    let composite = CompositeSubscription::new();
    let (hits, sub) = counter();
    composite.add(sub);
    composite.clone().unsubscribe();
    composite.clone().unsubscribe();
    composite.dispose();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(composite.is_closed());
  }

  #[rxcore_macro::test]
  fn add_after_close_releases_immediately() {
    let composite = CompositeSubscription::new();
    composite.dispose();
    let (hits, sub) = counter();
    composite.add(sub);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(composite.is_empty());
  }

  #[rxcore_macro::test]
  fn releases_in_insertion_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let composite = CompositeSubscription::new();
    for i in 0..3 {
      let order = order.clone();
      composite.add(ClosureSubscription(move || order.lock().unwrap().push(i)));
    }
    composite.dispose();
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
  }

  #[rxcore_macro::test]
  fn panicking_child_does_not_block_siblings() {
    let composite = CompositeSubscription::new();
    composite.add(ClosureSubscription(|| -> () { panic!("child failed") }));
    let (hits, sub) = counter();
    composite.add(sub);

    let result = panic::catch_unwind(AssertUnwindSafe(|| composite.dispose()));
    assert!(result.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(composite.is_closed());
  }

  #[rxcore_macro::test]
  fn ignores_itself_and_closed_children() {
    let composite = CompositeSubscription::new();
    composite.add(composite.clone());
    composite.add(());
    assert!(composite.is_empty());
  }
}
