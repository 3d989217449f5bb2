use webshop_core::db::open_db_in_memory;
use webshop_core::{Customer, Order, Product, RepoError, Repository, UnitOfWork};

fn seeded_uow() -> UnitOfWork {
    let mut uow = UnitOfWork::try_new(open_db_in_memory().unwrap()).unwrap();
    uow.products().add(Product::with_id(1, "Widget")).unwrap();
    uow.products().add(Product::with_id(2, "Gadget")).unwrap();
    uow.complete().unwrap();
    uow
}

#[test]
fn adding_a_customer_inserts_its_orders() {
    let mut uow = seeded_uow();
    let mut customer = Customer::with_id(3, "Ada");
    customer.orders = vec![
        Order::with_id(10, 0, 100, vec![Product::with_id(1, "")]),
        Order::with_id(11, 0, 200, vec![Product::with_id(2, ""), Product::with_id(1, "")]),
    ];
    uow.customers().add(customer).unwrap();

    // customer + two orders + three links
    assert_eq!(uow.complete().unwrap(), 6);

    let loaded = uow.customers().get(3).unwrap().unwrap();
    assert_eq!(loaded.name, "Ada");
    assert_eq!(loaded.orders.len(), 2);
    assert!(loaded.orders.iter().all(|order| order.customer_id == 3));
    assert_eq!(loaded.orders[1].product_ids(), vec![1, 2]);
    assert_eq!(uow.orders().get_all().unwrap().len(), 2);
}

#[test]
fn store_assigned_customer_id_flows_into_orders() {
    let mut uow = seeded_uow();
    let mut customer = Customer::new("Grace");
    customer.orders = vec![Order::new(0, vec![Product::with_id(1, "")])];
    uow.customers().add(customer).unwrap();
    uow.complete().unwrap();

    let created = uow.committed::<Customer>().pop().unwrap();
    assert!(created.id > 0);
    assert_eq!(created.orders[0].customer_id, created.id);
    assert!(created.orders[0].id > 0);

    assert_eq!(uow.customers().get(created.id).unwrap(), Some(created));
}

#[test]
fn update_renames_without_touching_orders() {
    let mut uow = seeded_uow();
    let mut customer = Customer::with_id(3, "Ada");
    customer.orders = vec![Order::with_id(10, 3, 0, vec![Product::with_id(1, "")])];
    uow.customers().add(customer).unwrap();
    uow.complete().unwrap();

    uow.customers()
        .update(Customer::with_id(3, "Ada Lovelace"))
        .unwrap();
    assert_eq!(uow.complete().unwrap(), 1);

    let loaded = uow.customers().get(3).unwrap().unwrap();
    assert_eq!(loaded.name, "Ada Lovelace");
    assert_eq!(loaded.orders.len(), 1);
}

#[test]
fn staged_update_shows_stored_orders_not_the_payload() {
    let mut uow = seeded_uow();
    let mut customer = Customer::with_id(3, "Ada");
    customer.orders = vec![Order::with_id(10, 3, 0, vec![Product::with_id(1, "")])];
    uow.customers().add(customer).unwrap();
    uow.complete().unwrap();
    let stored = uow.customers().get(3).unwrap().unwrap().orders;

    let mut renamed = Customer::with_id(3, "Ada Lovelace");
    renamed.orders = vec![Order::with_id(12, 3, 0, vec![Product::with_id(2, "")])];
    uow.customers().update(renamed).unwrap();

    let staged = uow.customers().get(3).unwrap().unwrap();
    assert_eq!(staged.name, "Ada Lovelace");
    assert_eq!(staged.orders, stored);

    uow.complete().unwrap();
    let committed = uow.customers().get(3).unwrap().unwrap();
    assert_eq!(committed.orders, stored);
    assert_eq!(uow.customers().get_all().unwrap()[0], committed);
}

#[test]
fn rename_with_stale_order_payload_succeeds() {
    let mut uow = seeded_uow();
    uow.customers().add(Customer::with_id(3, "Ada")).unwrap();
    uow.complete().unwrap();

    let mut renamed = Customer::with_id(3, "Ada Lovelace");
    renamed.orders = vec![Order::with_id(51, 3, 0, vec![Product::with_id(99, "")])];
    uow.customers().update(renamed).unwrap();
    assert_eq!(uow.complete().unwrap(), 1);

    let loaded = uow.customers().get(3).unwrap().unwrap();
    assert_eq!(loaded.name, "Ada Lovelace");
    assert!(loaded.orders.is_empty());
    assert!(uow.orders().get(51).unwrap().is_none());
}

#[test]
fn staged_customer_removal_hides_its_orders() {
    let mut uow = seeded_uow();
    let mut customer = Customer::with_id(3, "Ada");
    customer.orders = vec![Order::with_id(10, 3, 0, vec![Product::with_id(1, "")])];
    uow.customers().add(customer).unwrap();
    uow.customers().add(Customer::with_id(4, "Grace")).unwrap();
    uow.orders()
        .add(Order::with_id(11, 4, 0, vec![Product::with_id(1, "")]))
        .unwrap();
    uow.complete().unwrap();

    uow.customers().remove(3).unwrap();

    assert!(uow.orders().get(10).unwrap().is_none());
    let remaining: Vec<i64> = uow
        .orders()
        .get_all()
        .unwrap()
        .iter()
        .map(|order| order.id)
        .collect();
    assert_eq!(remaining, vec![11]);
    assert_eq!(uow.products().get(1).unwrap().unwrap().order_ids, vec![11]);
    assert!(uow.orders().remove(10).unwrap_err().is_not_found());
}

#[test]
fn removing_a_customer_counts_cascaded_rows() {
    let mut uow = seeded_uow();
    let mut customer = Customer::with_id(3, "Ada");
    customer.orders = vec![Order::with_id(
        10,
        3,
        0,
        vec![Product::with_id(1, ""), Product::with_id(2, "")],
    )];
    uow.customers().add(customer).unwrap();
    uow.complete().unwrap();

    uow.customers().remove(3).unwrap();
    // customer + one order + two links
    assert_eq!(uow.complete().unwrap(), 4);
}

#[test]
fn removing_a_customer_removes_its_orders() {
    let mut uow = seeded_uow();
    let mut customer = Customer::with_id(3, "Ada");
    customer.orders = vec![Order::with_id(10, 3, 0, vec![Product::with_id(1, "")])];
    uow.customers().add(customer).unwrap();
    uow.customers().add(Customer::with_id(4, "Grace")).unwrap();
    uow.complete().unwrap();

    uow.customers().remove(3).unwrap();
    uow.complete().unwrap();

    assert!(uow.customers().get(3).unwrap().is_none());
    assert!(uow.orders().get(10).unwrap().is_none());
    assert!(uow.products().get(1).unwrap().unwrap().order_ids.is_empty());
    assert_eq!(uow.customers().get_all().unwrap().len(), 1);
}

#[test]
fn customer_orders_with_unknown_products_are_rejected() {
    let uow = seeded_uow();
    let mut customer = Customer::with_id(3, "Ada");
    customer.orders = vec![Order::with_id(10, 3, 0, vec![Product::with_id(77, "")])];

    let err = uow.customers().add(customer).unwrap_err();
    assert!(matches!(err, RepoError::UnknownProducts { order_id: 10, .. }));
    assert_eq!(uow.pending_changes(), 0);
}

#[test]
fn remove_missing_customer_is_not_found() {
    let uow = seeded_uow();
    assert!(uow.customers().remove(5).unwrap_err().is_not_found());
}
