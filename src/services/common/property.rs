use std::fmt::Debug;

use futures::stream::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A value that can be read synchronously and watched for changes.
///
/// Each watcher gets the current value immediately when subscribing,
/// then every subsequent change.
#[derive(Clone)]
pub struct Property<T: Clone + Send + Sync + 'static> {
    tx: watch::Sender<T>,
    rx: watch::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(initial: T) -> Self {
        let (tx, rx) = watch::channel(initial);
        Self { tx, rx }
    }

    /// Set a new value and notify all watchers.
    ///
    /// Watchers are only woken when the value actually differs.
    pub(crate) fn set(&self, new_value: T)
    where
        T: PartialEq,
    {
        let _ = self.tx.send_if_modified(|current| {
            if *current != new_value {
                *current = new_value;
                true
            } else {
                false
            }
        });
    }

    /// Get the current value.
    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Watch for changes to this property.
    ///
    /// The stream immediately yields the current value, then yields
    /// whenever the value changes.
    pub fn watch(&self) -> impl Stream<Item = T> + Send + use<T> {
        WatchStream::new(self.rx.clone())
    }
}

impl<T: Clone + Send + Sync + Debug + 'static> Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn watch_yields_current_then_changes() {
        let property = Property::new(1u8);
        let mut stream = Box::pin(property.watch());

        assert_eq!(stream.next().await, Some(1));

        property.set(2);
        assert_eq!(stream.next().await, Some(2));
        assert_eq!(property.get(), 2);
    }

    #[test]
    fn set_with_equal_value_does_not_mark_changed() {
        let property = Property::new("idle");
        let mut rx = property.rx.clone();
        rx.mark_unchanged();

        property.set("idle");
        assert!(!rx.has_changed().unwrap());

        property.set("ready");
        assert!(rx.has_changed().unwrap());
    }
}
