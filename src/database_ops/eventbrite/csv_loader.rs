use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;
use tracing::debug;

/// One export row: header -> raw cell, in header order.
pub type CsvRow = IndexMap<String, String>;

const UTF8_BOM: char = '\u{feff}';

/// Borrow a cell; a missing header reads the same as an absent value.
pub fn field<'a>(row: &'a CsvRow, column: &str) -> Option<&'a str> {
    row.get(column).map(String::as_str)
}

/// Load an export from disk. A missing file is an `io::ErrorKind::NotFound`.
pub fn load_csv(path: &Path) -> Result<Vec<CsvRow>> {
    if !path.exists() {
        return Err(std::io::Error::new(
            ErrorKind::NotFound,
            format!("CSV not found: {}", path.display()),
        )
        .into());
    }
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rows = read_rows(BufReader::with_capacity(1 << 20, file))
        .with_context(|| format!("read {}", path.display()))?;
    debug!(path = %path.display(), rows = rows.len(), "csv loaded");
    Ok(rows)
}

/// Header-driven decode of any reader. Ragged rows keep the columns they have;
/// invalid UTF-8 is replaced rather than rejected.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<CsvRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            let name = String::from_utf8_lossy(h);
            if idx == 0 {
                name.trim_start_matches(UTF8_BOM).to_string()
            } else {
                name.into_owned()
            }
        })
        .collect();

    let mut rows = Vec::new();
    let mut rec = ByteRecord::new();
    while rdr.read_byte_record(&mut rec)? {
        let row: CsvRow = headers
            .iter()
            .zip(rec.iter())
            .map(|(h, cell)| (h.clone(), String::from_utf8_lossy(cell).into_owned()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn strips_bom_and_keeps_header_order() {
        let data = "\u{feff}Order ID,Event ID,Gross sales\n1001,E1,\"1,250.00\"\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Order ID", "Event ID", "Gross sales"]);
        assert_eq!(field(&rows[0], "Gross sales"), Some("1,250.00"));
        assert_eq!(field(&rows[0], "Buyer email"), None);
    }

    #[test]
    fn short_rows_keep_present_columns() {
        let data = "a,b,c\n1,2\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(field(&rows[0], "b"), Some("2"));
        assert_eq!(field(&rows[0], "c"), None);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_csv(&dir.path().join("nope.csv")).unwrap_err();
        let io = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Order ID,Event ID\n1,E1\n2,E2\n").unwrap();
        let rows = load_csv(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(field(&rows[1], "Order ID"), Some("2"));
    }
}
