use super::Subscription;

/// An upstream subscription paired with a handle the operator owns, usually
/// its scheduled work.
///
/// The handle is released first so no scheduled callback observes a
/// half-released upstream. `is_closed` follows the upstream.
pub struct SourceWithHandle<U, H> {
  pub source: U,
  pub handle: H,
}

impl<U, H> SourceWithHandle<U, H> {
  #[inline]
  pub fn new(source: U, handle: H) -> Self { Self { source, handle } }
}

impl<U: Subscription, H: Subscription> Subscription for SourceWithHandle<U, H> {
  fn unsubscribe(self) {
    self.handle.unsubscribe();
    self.source.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.source.is_closed() }
}
