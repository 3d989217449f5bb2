//! Data-access core for the web shop.
//!
//! Repositories stage changes on a unit of work, the unit of work commits them
//! in one transaction, and subjects fan successful mutations out to observers.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod uow;

pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::customer::Customer;
pub use model::order::Order;
pub use model::product::Product;
pub use model::{EntityId, EntityKind, ModelValidationError, UNASSIGNED_ID};
pub use notify::{
    product_subject, EmailMessage, EmailNotification, LogMailTransport, MailTransport,
    NotifyReport, Observer, ObserverError, ProductSubject, Subject,
};
pub use repo::customer_repo::CustomerRepository;
pub use repo::order_repo::OrderRepository;
pub use repo::product_repo::ProductRepository;
pub use repo::record::{Pending, Record, StagedChange};
pub use repo::sqlite_repo::SqliteRepository;
pub use repo::{RepoError, RepoErrorKind, RepoResult, Repository};
pub use service::customer_service::CustomerService;
pub use service::order_service::OrderService;
pub use service::product_service::ProductService;
pub use uow::{StoreContext, UnitOfWork};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
