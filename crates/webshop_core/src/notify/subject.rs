//! Observer registry with snapshot-and-iterate delivery.

use crate::logging::truncate_single_line;
use crate::model::product::Product;
use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

const MAX_FAILURE_MESSAGE_CHARS: usize = 160;

static PRODUCT_SUBJECT: OnceCell<ProductSubject> = OnceCell::new();

/// Failure reported by an observer callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverError {
    /// The side effect could not be delivered (I/O, transport).
    Delivery(String),
    /// The observer declined the entity.
    Rejected(String),
}

impl Display for ObserverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delivery(message) => write!(f, "delivery failed: {message}"),
            Self::Rejected(message) => write!(f, "rejected: {message}"),
        }
    }
}

impl Error for ObserverError {}

/// Receives entities notified by a [`Subject`].
pub trait Observer<T>: Send + Sync {
    /// Short stable name used in log events.
    fn name(&self) -> &str;

    fn update(&self, entity: &T) -> Result<(), ObserverError>;
}

/// Outcome of one `notify` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Registry of observers for entity type `T`.
///
/// `notify` snapshots the observer list under a read lock and runs the
/// callbacks without holding it, so observers may attach or detach while a
/// notification is in flight.
pub struct Subject<T> {
    observers: RwLock<Vec<Arc<dyn Observer<T>>>>,
}

pub type ProductSubject = Subject<Product>;

/// Process-wide subject notified after products are created.
pub fn product_subject() -> &'static ProductSubject {
    PRODUCT_SUBJECT.get_or_init(Subject::new)
}

impl<T> Default for Subject<T> {
    fn default() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
        }
    }
}

impl<T> Subject<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `observer` unless the same instance is already attached.
    ///
    /// Returns `true` when the observer was newly attached.
    pub fn attach(&self, observer: Arc<dyn Observer<T>>) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        if observers.iter().any(|current| same_observer(current, &observer)) {
            debug!(
                "event=subject_attach module=notify status=skipped observer={}",
                observer.name()
            );
            return false;
        }
        info!(
            "event=subject_attach module=notify status=ok observer={} observers={}",
            observer.name(),
            observers.len() + 1
        );
        observers.push(observer);
        true
    }

    /// Removes `observer`; a no-op when it is not attached.
    ///
    /// Returns `true` when the observer was attached.
    pub fn detach(&self, observer: &Arc<dyn Observer<T>>) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|current| !same_observer(current, observer));
        let removed = observers.len() != before;
        if removed {
            info!(
                "event=subject_detach module=notify status=ok observer={} observers={}",
                observer.name(),
                observers.len()
            );
        }
        removed
    }

    pub fn is_attached(&self, observer: &Arc<dyn Observer<T>>) -> bool {
        self.snapshot()
            .iter()
            .any(|current| same_observer(current, observer))
    }

    pub fn len(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls every attached observer with `entity` on the current thread.
    ///
    /// Failures are logged and counted; delivery continues with the next
    /// observer.
    pub fn notify(&self, entity: &T) -> NotifyReport {
        let mut report = NotifyReport::default();
        for observer in self.snapshot() {
            let outcome = catch_unwind(AssertUnwindSafe(|| observer.update(entity)));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    warn!(
                        "event=observer_update module=notify status=error observer={} error={}",
                        observer.name(),
                        truncate_single_line(&err.to_string(), MAX_FAILURE_MESSAGE_CHARS)
                    );
                }
                Err(payload) => {
                    report.failed += 1;
                    warn!(
                        "event=observer_update module=notify status=panic observer={} payload={}",
                        observer.name(),
                        truncate_single_line(
                            &panic_message(payload.as_ref()),
                            MAX_FAILURE_MESSAGE_CHARS
                        )
                    );
                }
            }
        }
        debug!(
            "event=subject_notify module=notify status=ok delivered={} failed={}",
            report.delivered, report.failed
        );
        report
    }

    fn snapshot(&self) -> Vec<Arc<dyn Observer<T>>> {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn same_observer<T>(left: &Arc<dyn Observer<T>>, right: &Arc<dyn Observer<T>>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(left), Arc::as_ptr(right))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{panic_message, Observer, ObserverError, Subject};
    use std::sync::{Arc, Mutex};

    struct Detaching {
        subject: Arc<Subject<u32>>,
        target: Mutex<Option<Arc<dyn Observer<u32>>>>,
    }

    impl Observer<u32> for Detaching {
        fn name(&self) -> &str {
            "detaching"
        }

        fn update(&self, _entity: &u32) -> Result<(), ObserverError> {
            if let Some(target) = self.target.lock().unwrap().take() {
                self.subject.detach(&target);
            }
            Ok(())
        }
    }

    struct Noop;

    impl Observer<u32> for Noop {
        fn name(&self) -> &str {
            "noop"
        }

        fn update(&self, _entity: &u32) -> Result<(), ObserverError> {
            Ok(())
        }
    }

    #[test]
    fn observer_can_detach_during_notify_without_deadlock() {
        let subject = Arc::new(Subject::<u32>::new());
        let noop: Arc<dyn Observer<u32>> = Arc::new(Noop);
        let detaching: Arc<dyn Observer<u32>> = Arc::new(Detaching {
            subject: Arc::clone(&subject),
            target: Mutex::new(Some(Arc::clone(&noop))),
        });
        subject.attach(Arc::clone(&detaching));
        subject.attach(Arc::clone(&noop));

        let first = subject.notify(&1);
        assert_eq!(first.delivered, 2);
        assert!(!subject.is_attached(&noop));

        let second = subject.notify(&2);
        assert_eq!(second.delivered, 1);
    }

    #[test]
    fn panic_message_reads_string_payloads() {
        let payload = std::panic::catch_unwind(|| panic!("boom {}", 7)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom 7");
    }
}
