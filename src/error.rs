use std::{error::Error, sync::Arc, time::Duration};

use thiserror::Error;

/// Errors raised by the library itself, plus a wrapper for errors coming
/// from user sources.
///
/// Sources that never fail (`of`, `range`, `interval`, ...) use this as their
/// error type. Operators that can fail on their own (`first`, `single`,
/// `timeout`, `cast`, ...) require the stream error to implement
/// `From<RxError>`.
#[derive(Debug, Clone, Error)]
pub enum RxError {
  #[error("sequence contains no elements")]
  SequenceEmpty,
  #[error("sequence contains more than one element")]
  MultipleElements,
  #[error("no notification within {0:?}")]
  Timeout(Duration),
  #[error("value cannot be converted to `{target}`")]
  Cast { target: &'static str },
  #[error(transparent)]
  Upstream(Arc<dyn Error + Send + Sync>),
}

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

impl RxError {
  /// Wraps an arbitrary error as `Upstream`.
  pub fn upstream<E: Error + Send + Sync + 'static>(err: E) -> Self { Self::Upstream(Arc::new(err)) }

  /// An `Upstream` error carrying only a message.
  pub fn msg(text: impl Into<String>) -> Self { Self::upstream(Message(text.into())) }

  pub fn is_timeout(&self) -> bool { matches!(self, Self::Timeout(_)) }
}
