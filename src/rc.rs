use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared, lockable state: `Arc<Mutex<T>>` behind a small helper API.
///
/// Operators that talk to more than one upstream (or to a scheduler task)
/// keep their state in one of these. Locks recover from poisoning, a panic
/// in a user callback must not wedge the rest of the pipeline.
pub struct MutArc<T>(Arc<Mutex<T>>);

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  #[inline]
  pub fn rc_deref_mut(&self) -> MutexGuard<'_, T> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }

  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }

  /// Address of the shared allocation, stable for as long as any clone lives.
  #[inline]
  pub fn addr(&self) -> usize { Arc::as_ptr(&self.0).cast::<()>() as usize }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T: Default> Default for MutArc<T> {
  fn default() -> Self { Self::own(T::default()) }
}

impl<T> From<T> for MutArc<T> {
  fn from(value: T) -> Self { Self::own(value) }
}
