use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::info;

use crate::database_ops::eventbrite::{load_csv, validate_exports, ValidationReport};

#[derive(Debug, Clone)]
pub struct ValidateConfig {
    pub orders: PathBuf,
    pub sales: Option<PathBuf>,
}

/// Print the validation report; errors when any critical issue was found.
pub fn run(cfg: ValidateConfig) -> Result<ValidationReport> {
    let order_rows = load_csv(&cfg.orders)?;
    let sales_rows = match &cfg.sales {
        Some(path) => Some(load_csv(path)?),
        None => None,
    };
    info!(
        orders = order_rows.len(),
        sales = ?sales_rows.as_ref().map(Vec::len),
        "validating Eventbrite exports"
    );

    let report = validate_exports(&order_rows, sales_rows.as_deref());
    println!("{}", report.render());

    if !report.passed() {
        bail!(
            "validation failed with {} critical errors",
            report.critical_errors()
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn export(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn clean_orders_pass() {
        let orders = export("Order ID,Event ID,Event location,Buyer email,Net sales\n1,E1,The Basement,a@example.com,10.00\n");
        let report = run(ValidateConfig {
            orders: orders.path().to_path_buf(),
            sales: None,
        })
        .unwrap();
        assert!(report.passed());
    }

    #[test]
    fn critical_errors_fail_the_command() {
        let orders = export("Order ID,Event ID,Net sales\n1,E1,ten\n1,E1,10.00\n");
        let err = run(ValidateConfig {
            orders: orders.path().to_path_buf(),
            sales: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("2 critical errors"));
    }
}
