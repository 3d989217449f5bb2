//! Email observer announcing newly created products.

use crate::model::product::Product;
use crate::notify::subject::{Observer, ObserverError};
use log::info;

/// Outgoing email handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Delivery channel for [`EmailMessage`]s.
pub trait MailTransport: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), ObserverError>;
}

/// Transport that records messages in the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailTransport;

impl MailTransport for LogMailTransport {
    fn send(&self, message: &EmailMessage) -> Result<(), ObserverError> {
        info!(
            "event=email_send module=notify status=ok transport=log recipients={} subject_chars={}",
            message.to.len(),
            message.subject.chars().count()
        );
        Ok(())
    }
}

/// Sends a "new product" email to a fixed recipient list.
pub struct EmailNotification<M> {
    recipients: Vec<String>,
    transport: M,
}

impl<M: MailTransport> EmailNotification<M> {
    pub fn new(recipients: Vec<String>, transport: M) -> Self {
        Self {
            recipients,
            transport,
        }
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Builds the message sent for `product`.
    pub fn compose(&self, product: &Product) -> EmailMessage {
        EmailMessage {
            to: self.recipients.clone(),
            subject: format!("New product: {}", product.name),
            body: format!(
                "Product #{} \"{}\" is now available in the shop.",
                product.id, product.name
            ),
        }
    }
}

impl<M: MailTransport> Observer<Product> for EmailNotification<M> {
    fn name(&self) -> &str {
        "email_notification"
    }

    fn update(&self, product: &Product) -> Result<(), ObserverError> {
        if self.recipients.is_empty() {
            return Err(ObserverError::Rejected(
                "no email recipients configured".to_string(),
            ));
        }
        self.transport.send(&self.compose(product))
    }
}
