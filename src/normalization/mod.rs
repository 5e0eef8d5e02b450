//! Pure field normalizers shared by the record builders and the validator.
pub mod datetime;
pub mod money;
pub mod text;

pub use datetime::{parse_datetime, split_date_time, to_utc_iso, Timestamps};
pub use money::decimal_to_cents;
pub use text::{join_name, normalize_str, safe_int};
