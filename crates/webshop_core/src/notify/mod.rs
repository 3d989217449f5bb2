//! Publish/subscribe notifications for successful mutations.
//!
//! # Responsibility
//! - Keep a process-wide, lock-guarded set of observers per entity type.
//! - Deliver notified entities synchronously, in attachment order.
//!
//! # Invariants
//! - Attach and detach are idempotent.
//! - An observer failure (error or panic) is logged and never reaches the
//!   notifying caller or the remaining observers.
//! - Notification is not part of any unit-of-work commit; callers notify only
//!   after `complete` succeeded.

pub mod email;
pub mod subject;

pub use email::{EmailMessage, EmailNotification, LogMailTransport, MailTransport};
pub use subject::{
    product_subject, NotifyReport, Observer, ObserverError, ProductSubject, Subject,
};
