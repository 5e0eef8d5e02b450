//! Eventbrite CSV export import: load, normalize, build and upsert.
pub mod builders;
pub mod columns;
pub mod csv_loader;
pub mod pipeline;
pub mod records;
pub mod validate;

pub use csv_loader::{load_csv, CsvRow};
pub use pipeline::{run_import, ImportInputs, ImportStage, ImportSummary};
pub use validate::{validate_exports, ValidationReport};
