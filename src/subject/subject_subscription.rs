use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use super::subject_core::SubjectState;
use crate::{rc::MutArc, subscription::Subscription};

/// Handle returned by subscribing to a subject.
///
/// Unsubscribing flips the subscriber's closed flag, so an emission already
/// in flight skips it, and drops its entry by id. The subscriber's own slot
/// is never locked here, so it is safe to unsubscribe from inside a
/// callback.
pub struct SubjectSubscription<Item, Err, P> {
  state: MutArc<SubjectState<Item, Err, P>>,
  id: Option<usize>,
  closed: Arc<AtomicBool>,
}

impl<Item, Err, P> SubjectSubscription<Item, Err, P> {
  pub(crate) fn new(
    state: MutArc<SubjectState<Item, Err, P>>, id: usize, closed: Arc<AtomicBool>,
  ) -> Self {
    Self { state, id: Some(id), closed }
  }

  /// For subscribers that were served a terminal event right away.
  pub(crate) fn closed(state: MutArc<SubjectState<Item, Err, P>>) -> Self {
    Self { state, id: None, closed: Arc::new(AtomicBool::new(true)) }
  }
}

impl<Item, Err, P> Subscription for SubjectSubscription<Item, Err, P> {
  fn unsubscribe(self) {
    if self.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let Some(id) = self.id else { return };
    let entry = self.state.rc_deref_mut().observers.remove(id);
    drop(entry);
  }

  fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}
