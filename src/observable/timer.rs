use crate::{
  error::RxError,
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  scheduler::{DefaultScheduler, Duration, Scheduler, Task, TaskHandle, TaskState},
};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Emits `0` after `due`, then completes.
pub fn timer(due: Duration) -> Timer<DefaultScheduler> { timer_on(due, DefaultScheduler) }

pub fn timer_on<SD: Scheduler>(due: Duration, scheduler: SD) -> Timer<SD> {
  Timer { due, period: None, scheduler }
}

/// Emits `0` after `due`, then `1, 2, ...` every `period`. Never completes.
pub fn timer_periodic(due: Duration, period: Duration) -> Timer<DefaultScheduler> {
  timer_periodic_on(due, period, DefaultScheduler)
}

/// A zero `period` is raised to one millisecond.
pub fn timer_periodic_on<SD: Scheduler>(due: Duration, period: Duration, scheduler: SD) -> Timer<SD> {
  Timer { due, period: Some(period.max(MIN_PERIOD)), scheduler }
}

/// Tick source behind `timer`, `timer_periodic` and `interval`.
#[derive(Clone)]
pub struct Timer<SD> {
  pub due: Duration,
  pub period: Option<Duration>,
  pub scheduler: SD,
}

impl<SD> ObservableType for Timer<SD> {
  type Item = u64;
  type Err = RxError;
}

struct TimerState<O> {
  observer: Option<O>,
  ticks: u64,
  period: Option<Duration>,
}

fn tick<O: Observer<u64, RxError>>(state: &mut TimerState<O>) -> TaskState {
  let Some(observer) = state.observer.as_mut() else {
    return TaskState::Finished;
  };
  if observer.is_closed() {
    state.observer = None;
    return TaskState::Finished;
  }
  observer.next(state.ticks);
  state.ticks += 1;
  match state.period {
    Some(period) => TaskState::Sleeping(period),
    None => {
      if let Some(observer) = state.observer.take() {
        observer.complete();
      }
      TaskState::Finished
    }
  }
}

impl<SD, O> CoreObservable<O> for Timer<SD>
where
  SD: Scheduler,
  O: Observer<u64, RxError> + Send + 'static,
{
  type Unsub = TaskHandle;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let state = TimerState { observer: Some(observer), ticks: 0, period: self.period };
    self
      .scheduler
      .schedule(Task::new(state, tick::<O>), Some(self.due))
  }
}
