//! Distinct-until-changed projections of the store state

use futures::Stream;
use tokio::sync::watch;

use super::ProductViewState;

/// A projected view of the store state
///
/// `get` always returns the latest value (a new subscriber sees the current
/// state immediately). `changed` only resolves when the projected value is
/// different from the last one this selector yielded, so unrelated state
/// updates do not wake the consumer.
pub struct Selector<T> {
    rx: watch::Receiver<ProductViewState>,
    project: fn(&ProductViewState) -> T,
    last: T,
}

impl<T: Clone + PartialEq> Selector<T> {
    pub(crate) fn new(
        mut rx: watch::Receiver<ProductViewState>,
        project: fn(&ProductViewState) -> T,
    ) -> Self {
        let last = project(&rx.borrow_and_update());
        Self { rx, project, last }
    }

    /// Latest projected value
    pub fn get(&self) -> T {
        (self.project)(&self.rx.borrow())
    }

    /// Wait for the next distinct value; `None` once the store is gone
    pub async fn changed(&mut self) -> Option<T> {
        loop {
            self.rx.changed().await.ok()?;
            let next = (self.project)(&self.rx.borrow_and_update());
            if next != self.last {
                self.last = next.clone();
                return Some(next);
            }
        }
    }

    /// Stream starting with the current value, followed by every distinct change
    pub fn into_stream(self) -> impl Stream<Item = T> {
        futures::stream::unfold((self, true), |(mut selector, first)| async move {
            if first {
                let current = selector.last.clone();
                return Some((current, (selector, false)));
            }
            let next = selector.changed().await?;
            Some((next, (selector, false)))
        })
    }
}
