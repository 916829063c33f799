//! The interactive terminal session: sign up or log in, then the main menu.

use std::io::{self, BufRead, Write};

use rust_decimal::Decimal;
use stockroom_core::config::AppConfig;
use stockroom_core::domain::product::{table_header, TABLE_RULE};
use stockroom_core::{
    format_amount, AccessGate, BillHistory, BillingError, BillingSession, Credential,
    InventoryError, InventoryStore, LoadSource, LowStockReport, ProductId, ProductRecord,
    StockLevel, BILL_SENTINEL,
};

use crate::console::{Console, Input};

const MAIN_MENU: &str = "\n--- Main Menu ---\n1. Add Product\n2. Display Products\n3. Update Stock\n4. Generate Bill\n5. Low Stock Report\n6. Exit";

/// What the menu loop should do after an action returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Closed,
}

pub fn run<R: BufRead, W: Write>(config: &AppConfig, console: &mut Console<R, W>) -> io::Result<()> {
    console.say("==== INVENTORY MANAGEMENT SYSTEM ====")?;

    match console.prompt_parse::<i64>("1. Signup\n2. Login\nChoice: ")? {
        Input::Value(1) => return signup(config, console),
        Input::Value(2) => {
            if !login(config, console)? {
                return Ok(());
            }
        }
        Input::Closed => return Ok(()),
        Input::Value(_) | Input::Invalid(_) => return console.say("Invalid choice. Goodbye!"),
    }

    let mut store = InventoryStore::from_config(config);
    if !load_inventory(&mut store, console)? {
        return Ok(());
    }

    main_menu(config, &mut store, console)
}

fn signup<R: BufRead, W: Write>(config: &AppConfig, console: &mut Console<R, W>) -> io::Result<()> {
    let Some(username) = console.prompt_line("Enter new admin username: ")? else {
        return Ok(());
    };
    let Some(password) = console.prompt_line("Enter new password: ")? else {
        return Ok(());
    };

    match AccessGate::signup(&config.storage.credentials_path, &Credential::new(username, password))
    {
        Ok(()) => {
            console.say("Signup successful!")?;
            console.say("\nSignup complete. Please run the program again to log in.")
        }
        Err(error) => console.say(format!("Error: Could not create credentials file. ({error})")),
    }
}

fn login<R: BufRead, W: Write>(config: &AppConfig, console: &mut Console<R, W>) -> io::Result<bool> {
    let Some(username) = console.prompt_line("Enter username: ")? else {
        return Ok(false);
    };
    let Some(password) = console.prompt_line("Enter password: ")? else {
        return Ok(false);
    };

    let gate = AccessGate::from_config(config);
    if !gate.has_credentials() {
        console.say("Error: credentials file missing. Please signup first.")?;
    }

    let granted = match gate.login(&Credential::new(username, password)) {
        Ok(granted) => granted,
        Err(error) => {
            console.say(format!("Error: {error}"))?;
            false
        }
    };

    if granted {
        console.say("\nLogin successful! Welcome.")?;
    } else {
        console.say("Login failed. Invalid username or password.")?;
    }
    Ok(granted)
}

fn load_inventory<R: BufRead, W: Write>(
    store: &mut InventoryStore,
    console: &mut Console<R, W>,
) -> io::Result<bool> {
    let report = match store.load() {
        Ok(report) => report,
        Err(error) => {
            console.say(format!("Error: {error}"))?;
            return Ok(false);
        }
    };

    if report.source == LoadSource::Missing {
        console.say("No existing products file found. A new one will be created.")?;
    }
    for skipped in &report.skipped {
        console.say(format!(
            "Warning: Skipping malformed line {} in {} ({})",
            skipped.line,
            store.path().display(),
            skipped.reason
        ))?;
    }
    Ok(true)
}

fn main_menu<R: BufRead, W: Write>(
    config: &AppConfig,
    store: &mut InventoryStore,
    console: &mut Console<R, W>,
) -> io::Result<()> {
    loop {
        console.say(MAIN_MENU)?;

        let flow = match console.prompt_parse::<i64>("Choice: ")? {
            Input::Closed => Flow::Closed,
            Input::Invalid(_) => {
                console.say("\nError: Invalid input. Please enter a number (1-6).")?;
                Flow::Continue
            }
            Input::Value(1) => add_product(store, console)?,
            Input::Value(2) => display_products(store, console)?,
            Input::Value(3) => update_stock(store, console)?,
            Input::Value(4) => generate_bill(config, store, console)?,
            Input::Value(5) => low_stock_report(config, store, console)?,
            Input::Value(6) => {
                console.say("Goodbye!")?;
                Flow::Closed
            }
            Input::Value(_) => {
                console.say("Invalid choice. Please enter a number (1-6).")?;
                Flow::Continue
            }
        };

        if flow == Flow::Closed {
            return Ok(());
        }
    }
}

fn add_product<R: BufRead, W: Write>(
    store: &mut InventoryStore,
    console: &mut Console<R, W>,
) -> io::Result<Flow> {
    let id = match console.prompt_parse::<i64>("Enter Product ID: ")? {
        Input::Value(id) => id,
        Input::Invalid(_) => {
            console.say("\nError: Invalid ID. Please enter a number.")?;
            return Ok(Flow::Continue);
        }
        Input::Closed => return Ok(Flow::Closed),
    };

    let Some(name) = console.prompt_line("Enter Name: ")? else {
        return Ok(Flow::Closed);
    };

    let quantity = match console.prompt_parse::<i64>("Enter Quantity: ")? {
        Input::Value(quantity) => quantity,
        Input::Invalid(_) => {
            console.say("\nError: Invalid Quantity. Please enter a number.")?;
            return Ok(Flow::Continue);
        }
        Input::Closed => return Ok(Flow::Closed),
    };

    let price = match console.prompt_parse::<Decimal>("Enter Price: ")? {
        Input::Value(price) => price,
        Input::Invalid(_) => {
            console.say("\nError: Invalid Price. Please enter a number.")?;
            return Ok(Flow::Continue);
        }
        Input::Closed => return Ok(Flow::Closed),
    };

    match store.add(ProductRecord::new(id, name, quantity, price)) {
        Ok(()) => console.say("Product added successfully!")?,
        Err(error) => console.say(format!("Error: {}", capitalize(&error.to_string())))?,
    }
    Ok(Flow::Continue)
}

fn display_products<R: BufRead, W: Write>(
    store: &InventoryStore,
    console: &mut Console<R, W>,
) -> io::Result<Flow> {
    console.say("\n--- CURRENT INVENTORY ---")?;
    console.say(table_header())?;
    console.say(TABLE_RULE)?;
    for product in store.all() {
        console.say(product)?;
    }
    console.say(TABLE_RULE)?;
    Ok(Flow::Continue)
}

fn update_stock<R: BufRead, W: Write>(
    store: &mut InventoryStore,
    console: &mut Console<R, W>,
) -> io::Result<Flow> {
    let id = match console.prompt_parse::<i64>("Enter Product ID: ")? {
        Input::Value(id) => ProductId(id),
        Input::Invalid(_) => {
            console.say("\nError: Invalid input. ID must be a number.")?;
            return Ok(Flow::Continue);
        }
        Input::Closed => return Ok(Flow::Closed),
    };

    let delta = match console.prompt_parse::<i64>("Enter quantity to add (e.g., 10 or -5): ")? {
        Input::Value(delta) => delta,
        Input::Invalid(_) => {
            console.say("\nError: Invalid input. Quantity must be a number.")?;
            return Ok(Flow::Continue);
        }
        Input::Closed => return Ok(Flow::Closed),
    };

    match store.adjust_stock(id, delta) {
        Ok(change) => console.say(format!(
            "Stock for '{}' updated. New Qty: {}",
            change.name, change.quantity
        ))?,
        Err(InventoryError::NotFound(id)) => {
            console.say(format!("Error: Product ID {id} not found."))?
        }
        Err(error) => console.say(format!("Error: {}", capitalize(&error.to_string())))?,
    }
    Ok(Flow::Continue)
}

fn generate_bill<R: BufRead, W: Write>(
    config: &AppConfig,
    store: &mut InventoryStore,
    console: &mut Console<R, W>,
) -> io::Result<Flow> {
    let currency = &config.billing.currency_symbol;
    let mut session = BillingSession::new(store);
    let mut flow = Flow::Continue;

    console.say("\n--- GENERATE BILL ---")?;
    'lines: loop {
        let id = match console.prompt_parse::<i64>("Enter Product ID (-1 to stop): ")? {
            Input::Value(BILL_SENTINEL) => break,
            Input::Value(id) => ProductId(id),
            Input::Invalid(_) => {
                console.say("\nError: Invalid ID. Please enter a number.")?;
                continue;
            }
            Input::Closed => {
                flow = Flow::Closed;
                break;
            }
        };

        // A bad quantity asks for the quantity again; the product id is kept.
        let quantity = loop {
            match console.prompt_parse::<i64>("Enter Quantity: ")? {
                Input::Value(quantity) if quantity > 0 => break quantity,
                Input::Value(_) => console.say("Quantity must be positive.")?,
                Input::Invalid(_) => {
                    console.say("\nError: Invalid Quantity. Please enter a number.")?
                }
                Input::Closed => {
                    flow = Flow::Closed;
                    break 'lines;
                }
            }
        };

        match session.bill_line(id, quantity) {
            Ok(line) => console.say(format!(
                "Added to bill: {} (x{}) - {currency}{}",
                line.name,
                line.quantity,
                format_amount(line.line_cost)
            ))?,
            Err(BillingError::ProductNotFound(id)) => {
                console.say(format!("Error: Product ID {id} not found."))?
            }
            Err(BillingError::InsufficientStock { name, available, .. }) => console.say(
                format!("Error: Not enough stock for '{name}'. Only {available} available."),
            )?,
            Err(error) if !error.is_line_rejection() => {
                console.say(format!("Error: {}", capitalize(&error.to_string())))?;
                console.say("Billing stopped; the products file could not be updated.")?;
                break;
            }
            Err(error) => console.say(format!("Error: {}", capitalize(&error.to_string())))?,
        }
    }

    let bill = session.finish();
    console.say("\n----------------------")?;
    console.say(format!("Total Bill: {currency}{}", format_amount(bill.total)))?;
    console.say("----------------------")?;

    if !bill.lines.is_empty() {
        match BillHistory::from_config(config).record(bill) {
            Ok(record) => console.say(format!("Bill {} recorded.", record.id))?,
            Err(error) => console.say(format!("Error: {}", capitalize(&error.to_string())))?,
        }
    }
    Ok(flow)
}

fn low_stock_report<R: BufRead, W: Write>(
    config: &AppConfig,
    store: &InventoryStore,
    console: &mut Console<R, W>,
) -> io::Result<Flow> {
    let report = LowStockReport::build(store, config.inventory.low_stock_threshold);

    console.say(format!("\n==== LOW STOCK REPORT (Qty < {}) ====", report.threshold))?;
    console.say(format!("{}Status", table_header()))?;
    console.say(TABLE_RULE)?;
    if report.is_empty() {
        console.say("No low stock products found.")?;
    }
    for product in &report.records {
        console.say(format!("{product}{}", StockLevel::of(product)))?;
    }
    console.say(TABLE_RULE)?;
    let critical = report.critical_count();
    if critical > 0 {
        console.say(format!("{critical} product(s) out of stock."))?;
    }
    Ok(Flow::Continue)
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;

    use rust_decimal::Decimal;
    use stockroom_core::config::AppConfig;
    use stockroom_core::{InventoryStore, ProductRecord};
    use tempfile::TempDir;

    use super::{capitalize, generate_bill, Flow};
    use crate::console::Console;

    #[test]
    fn billing_stops_after_the_first_failed_save() {
        let dir = TempDir::new().expect("tempdir");
        let data = dir.path().join("data");
        fs::create_dir(&data).expect("create data dir");
        let mut config = AppConfig::default();
        config.storage.products_path = data.join("products.txt");
        config.storage.bills_path = dir.path().join("bills.jsonl");
        let mut store = InventoryStore::from_config(&config);
        store.add(ProductRecord::new(1, "Pen", 10, Decimal::new(250, 2))).expect("add");
        fs::remove_dir_all(&data).expect("remove data dir");
        let mut console =
            Console::new(Cursor::new(b"1\n1\n1\n1\n1\n1\n-1\n".to_vec()), Vec::new());

        let flow = generate_bill(&config, &mut store, &mut console).expect("console io");

        let output = String::from_utf8(console.into_output()).expect("utf8");
        assert_eq!(flow, Flow::Continue);
        assert_eq!(output.matches("Could not write products file").count(), 1);
        assert_eq!(output.matches("Enter Product ID (-1 to stop): ").count(), 1);
        assert!(output.contains("Billing stopped"));
        assert!(output.contains("Total Bill: $0.00"));
        assert_eq!(store.find_by_id(stockroom_core::ProductId(1)).map(|p| p.quantity), Some(10));
        assert!(!config.storage.bills_path.exists());
    }

    #[test]
    fn capitalize_uppercases_only_the_first_letter() {
        assert_eq!(capitalize("product ID 4 already exists"), "Product ID 4 already exists");
        assert_eq!(capitalize(""), "");
    }
}
