use std::sync::{Arc, Mutex};
use webshop_core::db::open_db_in_memory;
use webshop_core::{
    Customer, CustomerService, EmailMessage, EmailNotification, MailTransport, Observer,
    ObserverError, Order, OrderService, Product, ProductService, ProductSubject, RepoError,
    Repository, UnitOfWork,
};

#[derive(Clone, Default)]
struct Outbox {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MailTransport for Outbox {
    fn send(&self, message: &EmailMessage) -> Result<(), ObserverError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

fn fresh_uow() -> UnitOfWork {
    UnitOfWork::try_new(open_db_in_memory().unwrap()).unwrap()
}

fn subject_with_outbox() -> (ProductSubject, Outbox) {
    let subject = ProductSubject::new();
    let outbox = Outbox::default();
    let observer: Arc<dyn Observer<Product>> = Arc::new(EmailNotification::new(
        vec!["ops@example.com".to_string()],
        outbox.clone(),
    ));
    subject.attach(observer);
    (subject, outbox)
}

#[test]
fn create_product_notifies_with_assigned_id() {
    let (subject, outbox) = subject_with_outbox();
    let service = ProductService::new(&subject);
    let mut uow = fresh_uow();

    let created = service
        .create_product(&mut uow, Product::new("Widget"))
        .unwrap();

    assert!(created.id > 0);
    let sent = outbox.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "New product: Widget");
    assert!(sent[0].body.contains(&format!("#{}", created.id)));
}

#[test]
fn failed_create_does_not_notify() {
    let (subject, outbox) = subject_with_outbox();
    let service = ProductService::new(&subject);
    let mut uow = fresh_uow();
    service
        .create_product(&mut uow, Product::with_id(1, "Widget"))
        .unwrap();

    let err = service
        .create_product(&mut uow, Product::with_id(1, "Clash"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert_eq!(outbox.sent.lock().unwrap().len(), 1);
}

#[test]
fn product_update_and_remove_check_existence() {
    let subject = ProductSubject::new();
    let service = ProductService::new(&subject);
    let mut uow = fresh_uow();

    assert!(service
        .update_product(&mut uow, Product::with_id(3, "Ghost"))
        .unwrap_err()
        .is_not_found());
    uow.discard();
    assert!(service.remove_product(&mut uow, 3).unwrap_err().is_not_found());

    let created = service
        .create_product(&mut uow, Product::new("Widget"))
        .unwrap();
    service
        .update_product(&mut uow, Product::with_id(created.id, "Widget v2"))
        .unwrap();
    assert_eq!(
        service.get_product(&uow, created.id).unwrap().unwrap().name,
        "Widget v2"
    );

    service.remove_product(&mut uow, created.id).unwrap();
    assert!(service.list_products(&uow).unwrap().is_empty());
}

#[test]
fn order_flow_through_services() {
    let subject = ProductSubject::new();
    let products = ProductService::new(&subject);
    let customers = CustomerService::new();
    let orders = OrderService::new();
    let mut uow = fresh_uow();

    let widget = products
        .create_product(&mut uow, Product::new("Widget"))
        .unwrap();
    let ada = customers
        .create_customer(&mut uow, Customer::new("Ada"))
        .unwrap();

    let placed = orders
        .place_order(
            &mut uow,
            Order::new(ada.id, vec![Product::with_id(widget.id, "")]),
        )
        .unwrap();
    assert!(placed.id > 0);
    assert_eq!(placed.products, vec![widget.clone()]);

    let listed = orders.list_orders(&uow).unwrap();
    assert_eq!(listed, vec![placed.clone()]);
    assert_eq!(
        customers.get_customer(&uow, ada.id).unwrap().unwrap().orders,
        vec![placed.clone()]
    );

    let missing = orders
        .update_order(&mut uow, Order::with_id(999, ada.id, 0, Vec::new()))
        .unwrap_err();
    assert!(missing.is_not_found());

    orders.remove_order(&mut uow, placed.id).unwrap();
    assert!(orders.get_order(&uow, placed.id).unwrap().is_none());

    customers
        .update_customer(&mut uow, Customer::with_id(ada.id, "Ada L."))
        .unwrap();
    assert_eq!(customers.list_customers(&uow).unwrap()[0].name, "Ada L.");
    customers.remove_customer(&mut uow, ada.id).unwrap();
    assert!(uow.customers().get_all().unwrap().is_empty());
}
