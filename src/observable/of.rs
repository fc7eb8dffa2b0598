use crate::{
  error::RxError,
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Emits `value`, then completes.
#[doc(alias = "just")]
pub fn of<Item>(value: Item) -> Of<Item> { Of(value) }

#[derive(Clone)]
pub struct Of<Item>(pub Item);

impl<Item> ObservableType for Of<Item> {
  type Item = Item;
  type Err = RxError;
}

impl<Item, O> CoreObservable<O> for Of<Item>
where
  O: Observer<Item, RxError>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    observer.next(self.0);
    observer.complete();
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcore_macro::test]
  fn emits_once_then_completes() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (n, c) = (log.clone(), log.clone());
    observable::of("hi").subscribe_complete(
      move |v| n.lock().unwrap().push(v.to_string()),
      move || c.lock().unwrap().push("done".to_string()),
    );
    assert_eq!(*log.lock().unwrap(), vec!["hi", "done"]);
  }
}
