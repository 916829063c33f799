use std::env;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use stockroom_cli::commands::{config, doctor};
use stockroom_cli::console::Console;
use stockroom_cli::session;
use stockroom_core::config::{ConfigOverrides, LoadOptions};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self { dir: TempDir::new().expect("tempdir") }
    }

    fn products(&self) -> PathBuf {
        self.dir.path().join("products.txt")
    }

    fn credentials(&self) -> PathBuf {
        self.dir.path().join("credentials.txt")
    }

    fn bills(&self) -> PathBuf {
        self.dir.path().join("bills.jsonl")
    }

    fn options(&self) -> LoadOptions {
        LoadOptions {
            config_path: Some(self.dir.path().join("absent.toml")),
            require_file: false,
            overrides: ConfigOverrides {
                products_path: Some(self.products()),
                credentials_path: Some(self.credentials()),
                bills_path: Some(self.bills()),
                log_level: None,
            },
        }
    }

    fn with_admin(self) -> Self {
        fs::write(self.credentials(), "admin\nsecret\n").expect("write credentials");
        self
    }

    /// Runs one interactive session fed with `input`, returning exit code and console text.
    fn session(&self, input: &str) -> (u8, String) {
        let mut console = Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let result = session(self.options(), &mut console);
        let output = String::from_utf8(console.into_output()).expect("console output is utf8");
        (result.exit_code, output)
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("file should exist")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "STOCKROOM_PRODUCTS_PATH",
        "STOCKROOM_CREDENTIALS_PATH",
        "STOCKROOM_BILLS_PATH",
        "STOCKROOM_LOW_STOCK_THRESHOLD",
        "STOCKROOM_UNIQUE_IDS",
        "STOCKROOM_CURRENCY_SYMBOL",
        "STOCKROOM_LOGGING_LEVEL",
        "STOCKROOM_LOGGING_FORMAT",
        "STOCKROOM_LOG_LEVEL",
        "STOCKROOM_LOG_FORMAT",
    ];

    let previous =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect::<Vec<(&str, Option<String>)>>();

    for key in keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}

#[test]
fn signup_stores_credentials_and_asks_for_a_rerun() {
    with_env(&[], || {
        let workspace = Workspace::new();

        let (exit_code, output) = workspace.session("1\nstore admin\npass word\n");

        assert_eq!(exit_code, 0);
        assert!(output.contains("Signup successful!"));
        assert!(output.contains("Please run the program again to log in."));
        assert_eq!(read(&workspace.credentials()), "store admin\npass word\n");
    });
}

#[test]
fn login_without_credentials_file_fails_cleanly() {
    with_env(&[], || {
        let workspace = Workspace::new();

        let (exit_code, output) = workspace.session("2\nadmin\nsecret\n");

        assert_eq!(exit_code, 0);
        assert!(output.contains("Error: credentials file missing. Please signup first."));
        assert!(output.contains("Login failed. Invalid username or password."));
        assert!(!output.contains("Main Menu"));
    });
}

#[test]
fn wrong_password_is_rejected() {
    with_env(&[], || {
        let workspace = Workspace::new().with_admin();

        let (exit_code, output) = workspace.session("2\nadmin\nSECRET\n");

        assert_eq!(exit_code, 0);
        assert!(output.contains("Login failed. Invalid username or password."));
    });
}

#[test]
fn invalid_startup_choice_exits_with_success() {
    with_env(&[], || {
        let workspace = Workspace::new();

        let (exit_code, output) = workspace.session("banana\n");

        assert_eq!(exit_code, 0);
        assert!(output.contains("Invalid choice. Goodbye!"));
    });
}

#[test]
fn add_bill_and_report_round_trip_through_the_products_file() {
    with_env(&[], || {
        let workspace = Workspace::new().with_admin();
        let input = [
            "2", "admin", "secret", // login
            "1", "1", "Pen", "10", "2.50", // add product
            "4", "1", "4", "-1", // bill 4 pens
            "5", // low stock report
            "6",
        ]
        .join("\n");

        let (exit_code, output) = workspace.session(&input);

        assert_eq!(exit_code, 0);
        assert!(output.contains("No existing products file found. A new one will be created."));
        assert!(output.contains("Login successful! Welcome."));
        assert!(output.contains("Product added successfully!"));
        assert!(output.contains("Added to bill: Pen (x4) - $10.00"));
        assert!(output.contains("Total Bill: $10.00"));
        assert!(output.contains("==== LOW STOCK REPORT (Qty < 5) ===="));
        assert!(output.contains("No low stock products found."));
        assert!(output.contains("Goodbye!"));
        assert_eq!(read(&workspace.products()), "1,Pen,6,2.50\n");
    });
}

#[test]
fn finished_bills_are_appended_to_the_history_file() {
    with_env(&[], || {
        let workspace = Workspace::new().with_admin();
        fs::write(workspace.products(), "1,Pen,10,2.50\n2,Ink,3,4.00\n").expect("seed");
        let input = [
            "2", "admin", "secret", // login
            "4", "1", "4", "2", "1", "-1", // first bill
            "4", "-1", // empty bill is not recorded
            "4", "2", "2", "-1", // second bill
            "6",
        ]
        .join("\n");

        let (_, output) = workspace.session(&input);

        assert_eq!(output.matches(" recorded.").count(), 2);
        let history = read(&workspace.bills());
        let bills: Vec<Value> = history
            .lines()
            .map(|line| serde_json::from_str(line).expect("bill json"))
            .collect();
        assert_eq!(bills.len(), 2);
        assert_eq!(bills[0]["total"], "14.00");
        assert_eq!(bills[0]["items"][0]["name"], "Pen");
        assert_eq!(bills[0]["items"][0]["line_cost"], "10.00");
        assert_eq!(bills[0]["items"][1]["quantity"], 1);
        assert_eq!(bills[1]["total"], "8.00");
        assert_ne!(bills[0]["id"], bills[1]["id"]);
        assert!(bills[1]["created_at"].is_string());
    });
}

#[test]
fn low_stock_report_marks_empty_shelves_as_critical() {
    with_env(&[], || {
        let workspace = Workspace::new().with_admin();
        fs::write(workspace.products(), "1,Pen,0,2.50\n2,Ink,3,4.00\n3,Tape,9,1.00\n")
            .expect("seed");

        let (_, output) = workspace.session("2\nadmin\nsecret\n5\n6\n");

        assert!(output.contains("ID   Name                     Qty       Price     Status"));
        assert!(output.contains("1    Pen                      0         2.50      Critical (Out of Stock)"));
        assert!(output.contains("2    Ink                      3         4.00      Low"));
        assert!(!output.contains("Tape"));
        assert!(output.contains("1 product(s) out of stock."));
    });
}

#[test]
fn billing_reprompts_quantity_and_rejects_overdraw() {
    with_env(&[], || {
        let workspace = Workspace::new().with_admin();
        fs::write(workspace.products(), "1,Pen,6,2.50\n").expect("seed products");
        let input = [
            "2", "admin", "secret", // login
            "4", // bill
            "1", "abc", "0", "999", // bad, non-positive, then too many
            "42", "1", // unknown product
            "-1", "6",
        ]
        .join("\n");

        let (_, output) = workspace.session(&input);

        assert!(output.contains("Error: Invalid Quantity. Please enter a number."));
        assert!(output.contains("Quantity must be positive."));
        assert!(output.contains("Error: Not enough stock for 'Pen'. Only 6 available."));
        assert!(output.contains("Error: Product ID 42 not found."));
        assert!(output.contains("Total Bill: $0.00"));
        assert_eq!(read(&workspace.products()), "1,Pen,6,2.50\n");
    });
}

#[test]
fn stock_updates_and_display_use_fixed_columns() {
    with_env(&[], || {
        let workspace = Workspace::new().with_admin();
        fs::write(workspace.products(), "1,Pen,6,2.5\n2,Stapler,12,7.99\n").expect("seed");
        let input = [
            "2", "admin", "secret", // login
            "3", "2", "-10", // stapler down to 2
            "3", "9", "1", // unknown id
            "3", "x", // invalid id
            "2", // display
            "5", // report
            "6",
        ]
        .join("\n");

        let (_, output) = workspace.session(&input);

        assert!(output.contains("Stock for 'Stapler' updated. New Qty: 2"));
        assert!(output.contains("Error: Product ID 9 not found."));
        assert!(output.contains("Error: Invalid input. ID must be a number."));
        assert!(output.contains("--- CURRENT INVENTORY ---"));
        assert!(output.contains("ID   Name                     Qty       Price     "));
        assert!(output.contains("1    Pen                      6         2.50      "));
        assert!(output.contains("2    Stapler                  2         7.99      "));
        assert_eq!(read(&workspace.products()), "1,Pen,6,2.5\n2,Stapler,2,7.99\n");
    });
}

#[test]
fn malformed_lines_are_reported_and_skipped() {
    with_env(&[], || {
        let workspace = Workspace::new().with_admin();
        fs::write(workspace.products(), "1,Pen,6,2.5\nbroken line\n2,Tape,1,0.99\n")
            .expect("seed");

        let (exit_code, output) = workspace.session("2\nadmin\nsecret\n5\n6\n");

        assert_eq!(exit_code, 0);
        assert!(output.contains("Warning: Skipping malformed line 2"));
        assert!(output.contains("2    Tape                     1         0.99      "));
    });
}

#[test]
fn invalid_menu_input_reprompts_and_eof_ends_the_session() {
    with_env(&[], || {
        let workspace = Workspace::new().with_admin();

        let (exit_code, output) = workspace.session("2\nadmin\nsecret\nhello\n9\n");

        assert_eq!(exit_code, 0);
        assert!(output.contains("Error: Invalid input. Please enter a number (1-6)."));
        assert!(output.contains("Invalid choice. Please enter a number (1-6)."));
        assert_eq!(output.matches("--- Main Menu ---").count(), 3);
    });
}

#[test]
fn names_with_commas_are_quoted_on_disk() {
    with_env(&[], || {
        let workspace = Workspace::new().with_admin();
        let input = ["2", "admin", "secret", "1", "3", "Pen, blue", "2", "1.25", "6"].join("\n");

        workspace.session(&input);

        assert_eq!(read(&workspace.products()), "3,\"Pen, blue\",2,1.25\n");
    });
}

#[test]
fn currency_symbol_and_threshold_follow_env() {
    with_env(
        &[("STOCKROOM_CURRENCY_SYMBOL", "€"), ("STOCKROOM_LOW_STOCK_THRESHOLD", "10")],
        || {
            let workspace = Workspace::new().with_admin();
            fs::write(workspace.products(), "1,Pen,8,1.00\n").expect("seed");

            let (_, output) = workspace.session("2\nadmin\nsecret\n4\n1\n2\n-1\n5\n6\n");

            assert!(output.contains("Total Bill: €2.00"));
            assert!(output.contains("==== LOW STOCK REPORT (Qty < 10) ===="));
            assert!(output.contains("1    Pen                      6         1.00      "));
        },
    );
}

#[test]
fn invalid_config_fails_before_the_session_starts() {
    with_env(&[("STOCKROOM_LOG_FORMAT", "xml")], || {
        let workspace = Workspace::new();

        let (exit_code, output) = workspace.session("1\n");

        assert_eq!(exit_code, 2);
        assert!(output.is_empty());
    });
}

#[test]
fn doctor_reports_missing_credentials_as_failure() {
    with_env(&[], || {
        let workspace = Workspace::new();

        let output = doctor::run(workspace.options(), true);

        let payload: Value = serde_json::from_str(&output).expect("doctor json");
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["name"], "config_validation");
        assert_eq!(payload["checks"][0]["status"], "pass");
        assert_eq!(payload["checks"][1]["name"], "products_file");
        assert_eq!(payload["checks"][1]["status"], "pass");
        assert_eq!(payload["checks"][2]["name"], "credentials");
        assert_eq!(payload["checks"][2]["status"], "fail");
        assert_eq!(payload["checks"][3]["name"], "bill_history");
        assert_eq!(payload["checks"][3]["status"], "pass");
    });
}

#[test]
fn doctor_passes_with_clean_files_and_flags_malformed_lines() {
    with_env(&[], || {
        let workspace = Workspace::new().with_admin();
        fs::write(workspace.products(), "1,Pen,6,2.5\n").expect("seed");

        let clean = doctor::run(workspace.options(), false);
        assert!(clean.starts_with("doctor: all readiness checks passed"));
        assert!(clean.contains("admin account `admin`"));

        fs::write(workspace.products(), "1,Pen,6,2.5\nnope\n").expect("seed");
        let dirty = doctor::run(workspace.options(), false);
        assert!(dirty.contains("- [fail] products_file:"));
        assert!(dirty.contains("malformed line(s) 2 will be skipped"));

        fs::write(workspace.bills(), "not json\n").expect("seed bills");
        let broken = doctor::run(workspace.options(), false);
        assert!(broken.contains("- [fail] bill_history:"));
    });
}

#[test]
fn config_reports_flag_env_and_default_sources() {
    with_env(&[("STOCKROOM_UNIQUE_IDS", "true")], || {
        let workspace = Workspace::new();

        let output = config::run(workspace.options());

        assert!(output.starts_with("effective config"));
        assert!(output.contains(&format!(
            "- storage.products_path = {} (source: flag)",
            workspace.products().display()
        )));
        assert!(output
            .contains("- inventory.unique_ids = true (source: env (STOCKROOM_UNIQUE_IDS))"));
        assert!(output.contains("- inventory.low_stock_threshold = 5 (source: default)"));
        assert!(output.contains(&format!(
            "- storage.bills_path = {} (source: flag)",
            workspace.bills().display()
        )));
        assert!(output.contains("- logging.format = compact (source: default)"));
    });
}
