use serde::Serialize;
use stockroom_core::config::{AppConfig, LoadOptions};
use stockroom_core::{AccessGate, BillHistory, InventoryStore, LoadSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: LoadOptions, json_output: bool) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_products_file(&config));
            checks.push(check_credentials(&config));
            checks.push(check_bill_history(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "products_file",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "credentials",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "bill_history",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_products_file(config: &AppConfig) -> DoctorCheck {
    let mut store = InventoryStore::from_config(config);
    let path = store.path().display().to_string();

    match store.load() {
        Ok(report) if report.source == LoadSource::Missing => DoctorCheck {
            name: "products_file",
            status: CheckStatus::Pass,
            details: format!("`{path}` does not exist yet and will be created on first save"),
        },
        Ok(report) if report.skipped.is_empty() => DoctorCheck {
            name: "products_file",
            status: CheckStatus::Pass,
            details: format!("`{path}` holds {} product record(s)", report.loaded),
        },
        Ok(report) => {
            let lines = report
                .skipped
                .iter()
                .map(|skipped| skipped.line.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            DoctorCheck {
                name: "products_file",
                status: CheckStatus::Fail,
                details: format!(
                    "`{path}` holds {} product record(s); malformed line(s) {lines} will be skipped",
                    report.loaded
                ),
            }
        }
        Err(error) => DoctorCheck {
            name: "products_file",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_credentials(config: &AppConfig) -> DoctorCheck {
    let gate = AccessGate::from_config(config);
    let path = gate.path().display().to_string();

    match gate.stored() {
        Ok(Some(credential)) if !credential.username.is_empty() => DoctorCheck {
            name: "credentials",
            status: CheckStatus::Pass,
            details: format!("admin account `{}` is configured in `{path}`", credential.username),
        },
        Ok(Some(_)) => DoctorCheck {
            name: "credentials",
            status: CheckStatus::Fail,
            details: format!("`{path}` exists but holds no username; run signup again"),
        },
        Ok(None) => DoctorCheck {
            name: "credentials",
            status: CheckStatus::Fail,
            details: format!("`{path}` not found; run signup first"),
        },
        Err(error) => {
            DoctorCheck { name: "credentials", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn check_bill_history(config: &AppConfig) -> DoctorCheck {
    let history = BillHistory::from_config(config);
    let path = history.path().display().to_string();

    match history.load() {
        Ok(bills) if bills.is_empty() => DoctorCheck {
            name: "bill_history",
            status: CheckStatus::Pass,
            details: format!("no bills recorded in `{path}` yet"),
        },
        Ok(bills) => DoctorCheck {
            name: "bill_history",
            status: CheckStatus::Pass,
            details: format!("`{path}` holds {} bill(s)", bills.len()),
        },
        Err(error) => {
            DoctorCheck { name: "bill_history", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
