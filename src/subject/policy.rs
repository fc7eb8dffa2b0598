//! Retention policies: what a subject remembers and replays.

use std::{collections::VecDeque, sync::Arc};

use crate::scheduler::{DefaultScheduler, Duration, Instant, Scheduler};

/// Lifecycle of a subject. Terminal phases are permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectPhase {
  Active,
  Completed,
  Errored,
}

/// Decides which values a subject keeps and replays to late subscribers.
pub trait SubjectPolicy<Item>: Send + 'static {
  /// Records `value`. Returns `false` when it must not reach live
  /// subscribers yet.
  fn on_next(&mut self, value: &Item) -> bool;

  /// A value to send to every subscriber right before completion.
  fn on_complete(&mut self) -> Option<Item> { None }

  /// Values a subscriber joining in `phase` receives first.
  fn replay(&mut self, phase: SubjectPhase) -> Vec<Item>;
}

/// Forwards live values only.
#[derive(Debug, Default, Clone, Copy)]
pub struct Publish;

impl<Item> SubjectPolicy<Item> for Publish {
  fn on_next(&mut self, _value: &Item) -> bool { true }

  fn replay(&mut self, _phase: SubjectPhase) -> Vec<Item> { Vec::new() }
}

/// Remembers the latest value, starting from a seed.
pub struct Behavior<Item> {
  pub(crate) value: Item,
}

impl<Item: Clone + Send + 'static> SubjectPolicy<Item> for Behavior<Item> {
  fn on_next(&mut self, value: &Item) -> bool {
    self.value = value.clone();
    true
  }

  fn replay(&mut self, phase: SubjectPhase) -> Vec<Item> {
    match phase {
      SubjectPhase::Active => vec![self.value.clone()],
      SubjectPhase::Completed | SubjectPhase::Errored => Vec::new(),
    }
  }
}

/// Holds values back until completion, then releases the last one.
pub struct AsyncLast<Item> {
  last: Option<Item>,
}

impl<Item> Default for AsyncLast<Item> {
  fn default() -> Self { Self { last: None } }
}

impl<Item: Clone + Send + 'static> SubjectPolicy<Item> for AsyncLast<Item> {
  fn on_next(&mut self, value: &Item) -> bool {
    self.last = Some(value.clone());
    false
  }

  fn on_complete(&mut self) -> Option<Item> { self.last.clone() }

  fn replay(&mut self, phase: SubjectPhase) -> Vec<Item> {
    match phase {
      SubjectPhase::Completed => self.last.iter().cloned().collect(),
      SubjectPhase::Active | SubjectPhase::Errored => Vec::new(),
    }
  }
}

/// Keeps a buffer bounded by count and/or age.
pub struct Replay<Item> {
  buffer: VecDeque<(Instant, Item)>,
  count: Option<usize>,
  window: Option<Duration>,
  clock: Arc<dyn Scheduler>,
}

impl<Item> Replay<Item> {
  pub(crate) fn new(count: Option<usize>, window: Option<Duration>) -> Self {
    Self::with_clock(count, window, Arc::new(DefaultScheduler))
  }

  pub(crate) fn with_clock(
    count: Option<usize>, window: Option<Duration>, clock: Arc<dyn Scheduler>,
  ) -> Self {
    Self { buffer: VecDeque::new(), count, window, clock }
  }

  fn trim(&mut self) {
    if let Some(count) = self.count {
      while self.buffer.len() > count {
        self.buffer.pop_front();
      }
    }
    if let Some(window) = self.window {
      let now = self.clock.now();
      while self
        .buffer
        .front()
        .is_some_and(|(at, _)| now.saturating_duration_since(*at) > window)
      {
        self.buffer.pop_front();
      }
    }
  }
}

impl<Item: Clone + Send + 'static> SubjectPolicy<Item> for Replay<Item> {
  fn on_next(&mut self, value: &Item) -> bool {
    let now = self.clock.now();
    self.buffer.push_back((now, value.clone()));
    self.trim();
    true
  }

  fn replay(&mut self, _phase: SubjectPhase) -> Vec<Item> {
    self.trim();
    self.buffer.iter().map(|(_, v)| v.clone()).collect()
  }
}
