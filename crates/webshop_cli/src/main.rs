//! Command-line entry point for the web shop store.
//!
//! # Responsibility
//! - Load configuration and start logging once per process.
//! - Wire the email observer onto the process-wide product subject.
//! - Run one store command inside its own unit of work.

use log::{error, info};
use std::process::ExitCode;
use std::sync::Arc;
use webshop_core::db::open_db;
use webshop_core::{
    init_logging, product_subject, AppConfig, Customer, CustomerService, EmailNotification,
    EntityId, LogMailTransport, Observer, Order, OrderService, Product, ProductService,
    RepoError, UnitOfWork,
};

const USAGE: &str = "usage: webshop_cli <command> [args]

commands:
  add-product <name>
  list-products
  remove-product <id>
  add-customer <name>
  list-customers
  place-order <customer_id> <product_id>...
  list-orders";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    AddProduct(String),
    ListProducts,
    RemoveProduct(EntityId),
    AddCustomer(String),
    ListCustomers,
    PlaceOrder {
        customer_id: EntityId,
        product_ids: Vec<EntityId>,
    },
    ListOrders,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::from(2);
        }
    };

    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(config.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let observer: Arc<dyn Observer<Product>> = Arc::new(EmailNotification::new(
        config.notify_recipients.clone(),
        LogMailTransport,
    ));
    product_subject().attach(Arc::clone(&observer));

    let outcome = run(&config, command);
    product_subject().detach(&observer);

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            if is_conflict(err.as_ref()) {
                eprintln!("hint: an id is already taken or a referenced row is missing");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(config: &AppConfig, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let mut uow = UnitOfWork::try_new(open_db(&config.database_path)?)?;
    info!("event=cli_command module=cli status=start command={command:?}");
    let products = ProductService::new(product_subject());
    let customers = CustomerService::new();
    let orders = OrderService::new();

    match command {
        Command::AddProduct(name) => {
            let product = products.create_product(&mut uow, Product::new(name))?;
            println!("product {} {}", product.id, product.name);
        }
        Command::ListProducts => {
            for product in products.list_products(&uow)? {
                println!(
                    "{}\t{}\torders={}",
                    product.id,
                    product.name,
                    join_ids(&product.order_ids)
                );
            }
        }
        Command::RemoveProduct(id) => {
            products.remove_product(&mut uow, id)?;
            println!("removed product {id}");
        }
        Command::AddCustomer(name) => {
            let customer = customers.create_customer(&mut uow, Customer::new(name))?;
            println!("customer {} {}", customer.id, customer.name);
        }
        Command::ListCustomers => {
            for customer in customers.list_customers(&uow)? {
                println!(
                    "{}\t{}\torders={}",
                    customer.id,
                    customer.name,
                    customer.orders.len()
                );
            }
        }
        Command::PlaceOrder {
            customer_id,
            product_ids,
        } => {
            let references = product_ids
                .into_iter()
                .map(|id| Product::with_id(id, String::new()))
                .collect();
            let order = orders.place_order(&mut uow, Order::new(customer_id, references))?;
            println!(
                "order {} customer={} products={}",
                order.id,
                order.customer_id,
                join_ids(&order.product_ids())
            );
        }
        Command::ListOrders => {
            for order in orders.list_orders(&uow)? {
                println!(
                    "{}\tcustomer={}\tdate={}\tproducts={}",
                    order.id,
                    order.customer_id,
                    order.order_date,
                    join_ids(&order.product_ids())
                );
            }
        }
    }

    uow.dispose()?;
    Ok(())
}

fn is_conflict(err: &(dyn std::error::Error + 'static)) -> bool {
    match err.downcast_ref::<RepoError>() {
        Some(RepoError::Db(db)) => db.is_constraint_violation(),
        _ => false,
    }
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let (name, rest) = args
        .split_first()
        .ok_or_else(|| "missing command".to_string())?;

    match (name.as_str(), rest) {
        ("add-product", [product]) => Ok(Command::AddProduct(product.clone())),
        ("list-products", []) => Ok(Command::ListProducts),
        ("remove-product", [id]) => Ok(Command::RemoveProduct(parse_id(id)?)),
        ("add-customer", [customer]) => Ok(Command::AddCustomer(customer.clone())),
        ("list-customers", []) => Ok(Command::ListCustomers),
        ("place-order", [customer_id, product_ids @ ..]) if !product_ids.is_empty() => {
            Ok(Command::PlaceOrder {
                customer_id: parse_id(customer_id)?,
                product_ids: product_ids
                    .iter()
                    .map(|id| parse_id(id))
                    .collect::<Result<_, _>>()?,
            })
        }
        ("list-orders", []) => Ok(Command::ListOrders),
        (other, _) => Err(format!("unknown command or wrong arguments: `{other}`")),
    }
}

fn parse_id(raw: &str) -> Result<EntityId, String> {
    raw.parse::<EntityId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| format!("invalid id `{raw}`; expected a positive integer"))
}

fn join_ids(ids: &[EntityId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
