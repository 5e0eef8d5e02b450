use anyhow::{bail, Result};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

use ticketing_ingest::database_ops::eventbrite::{run_import, ImportInputs};
use ticketing_ingest::database_ops::supabase_rest::{BatchWriter, UpsertClient};

/// Merges rows per table on the declared conflict columns, like PostgREST
/// with `resolution=merge-duplicates`.
#[derive(Default)]
struct MemoryStore {
    tables: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    calls: Mutex<usize>,
    fail_table: Option<&'static str>,
}

impl MemoryStore {
    fn count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map_or(0, BTreeMap::len)
    }

    fn get(&self, table: &str, key: &str) -> Option<Value> {
        self.tables.lock().unwrap().get(table)?.get(key).cloned()
    }
}

#[async_trait::async_trait]
impl BatchWriter for MemoryStore {
    async fn write_batch(&self, table: &str, on_conflict: &str, batch: &[Value]) -> Result<()> {
        *self.calls.lock().unwrap() += 1;
        if self.fail_table == Some(table) {
            bail!("Supabase upsert failed for {table}: 500 Internal Server Error boom");
        }
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        for row in batch {
            let key = on_conflict
                .split(',')
                .map(|col| row[col].as_str().unwrap_or_default().to_string())
                .collect::<Vec<_>>()
                .join("|");
            rows.insert(key, row.clone());
        }
        Ok(())
    }
}

const ORDERS_CSV: &str = "\u{feff}Order ID,Order date,Event ID,Event name,Event start date,Event start time,Event timezone,Event location,Ticket quantity,Purchaser country,Currency,Payment status,Payment type,Buyer first name,Buyer last name,Buyer email,Gross sales,Net sales,Ticket + add-ons revenue,Ticket revenue,Eventbrite service fee,Eventbrite payment processing fee,Royalty,Eventbrite tax,Organiser tax
1001,2024-02-10 10:00:00,E1,Friday Late Show,2024-03-01,19:00:00,Australia/Sydney,The Basement,2,AU,AUD,Completed,Card,Ada,Lovelace,ada@example.com,100.00,88.00,80.00,80.00,2.00,0.50,0.50,3.00,2.00
1002,2024-02-12 09:30:00,E1,Friday Late Show,2024-03-01,19:00:00,Australia/Sydney,Enmore Theatre,1,AU,AUD,Completed,Card,Grace,Hopper,grace@example.com,\"1,040.00\",40.00,40.00,40.00,0,0,0,0,0
1003,not a date,E2,Open Mic,2024-04-05,,Mars/Base,Back Room,1,AU,AUD,Completed,Free,,,,0,0,0,0,0,0,0,0,0
,2024-02-13 09:30:00,E3,Orphan,2024-04-05,,,Nowhere,1,AU,AUD,Completed,Free,,,,0,0,0,0,0,0,0,0,0
";

const ATTENDEES_CSV: &str = "Order ID,Event ID,Barcode number,Ticket price,Ticket tier,Ticket type,Attendee first name,Attendee last name,Attendee email
1001,E1,BC-1,40.00,,General Admission,Ada,Lovelace,ada@example.com
1001,E1,,40.00,,General Admission,Charles,Babbage,
1002,E1,BC-3,40.00,,General Admission,Grace,Hopper,grace@example.com
9999,E1,BC-9,40.00,,General Admission,Nobody,Known,
";

struct Fixture {
    _dir: TempDir,
    inputs: ImportInputs,
}

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

fn fixture(orders: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let inputs = ImportInputs {
        orders: write(&dir, "orders.csv", orders),
        attendees: write(&dir, "attendees.csv", ATTENDEES_CSV),
        sales: None,
    };
    Fixture { _dir: dir, inputs }
}

fn client(store: MemoryStore, dry_run: bool) -> UpsertClient<MemoryStore> {
    UpsertClient::new(store, 2, dry_run).with_batch_delay(Duration::ZERO)
}

#[tokio::test]
async fn imports_all_collections_and_watermark() {
    let fx = fixture(ORDERS_CSV);
    let c = client(MemoryStore::default(), false);
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

    let summary = run_import(&fx.inputs, &c, now).await.unwrap();
    assert_eq!(summary.order_rows, 4);
    assert_eq!(summary.events, 3);
    assert_eq!(summary.orders, 3);
    assert_eq!(summary.tickets, 3);
    assert_eq!(summary.watermark.as_deref(), Some("2024-02-11T22:30:00Z"));

    let store = c.writer();
    assert_eq!(store.count("events_htx"), 3);
    assert_eq!(store.count("sessions_htx"), 3);
    assert_eq!(store.count("session_sources"), 3);
    assert_eq!(store.count("orders_eventbrite"), 3);
    assert_eq!(store.count("tickets_eventbrite"), 3);

    let event = store.get("events_htx", "eventbrite|E1").unwrap();
    assert_eq!(event["venue_name"], "The Basement");
    assert_eq!(event["start_date"], "2024-03-01T08:00:00Z");
    assert_eq!(event["raw"]["Order ID"], "1001");

    let order = store.get("orders_eventbrite", "1002").unwrap();
    assert_eq!(order["gross_sales_cents"], 104_000);
    assert_eq!(order["discounts_cents"], 100_000);
    let undated = store.get("orders_eventbrite", "1003").unwrap();
    assert!(undated["ordered_at"].is_null());

    assert!(store.get("tickets_eventbrite", "1001-ticket-1").is_some());
    assert!(store.get("tickets_eventbrite", "BC-9").is_none());

    let state = store.get("sync_state", "eventbrite:lastSync").unwrap();
    assert_eq!(state["value"], "2024-02-11T22:30:00Z");
    assert_eq!(state["updated_at"], "2024-05-01T00:00:00Z");
}

#[tokio::test]
async fn rerun_is_idempotent() {
    let fx = fixture(ORDERS_CSV);
    let c = client(MemoryStore::default(), false);
    run_import(&fx.inputs, &c, Utc::now()).await.unwrap();
    run_import(&fx.inputs, &c, Utc::now()).await.unwrap();

    let store = c.writer();
    assert_eq!(store.count("events_htx"), 3);
    assert_eq!(store.count("orders_eventbrite"), 3);
    assert_eq!(store.count("tickets_eventbrite"), 3);
    assert_eq!(store.count("sync_state"), 1);
}

#[tokio::test]
async fn dry_run_makes_no_calls() {
    let fx = fixture(ORDERS_CSV);
    let c = client(MemoryStore::default(), true);
    let summary = run_import(&fx.inputs, &c, Utc::now()).await.unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.orders, 3);
    assert_eq!(*c.writer().calls.lock().unwrap(), 0);
    assert_eq!(c.writer().count("sync_state"), 0);
}

#[tokio::test]
async fn no_order_times_leaves_watermark() {
    let orders = "Order ID,Order date,Event ID\n1,,E1\n2,garbage,E1\n";
    let fx = fixture(orders);
    let c = client(MemoryStore::default(), false);
    let summary = run_import(&fx.inputs, &c, Utc::now()).await.unwrap();

    assert_eq!(summary.orders, 2);
    assert_eq!(summary.watermark, None);
    assert_eq!(c.writer().count("sync_state"), 0);
}

#[tokio::test]
async fn remote_failure_aborts_before_watermark() {
    let fx = fixture(ORDERS_CSV);
    let store = MemoryStore {
        fail_table: Some("orders_eventbrite"),
        ..Default::default()
    };
    let c = client(store, false);
    let err = run_import(&fx.inputs, &c, Utc::now()).await.unwrap_err();

    assert!(format!("{err:#}").contains("500"));
    let store = c.writer();
    assert_eq!(store.count("events_htx"), 3);
    assert_eq!(store.count("tickets_eventbrite"), 0);
    assert_eq!(store.count("sync_state"), 0);
}

#[tokio::test]
async fn missing_export_fails_before_writes() {
    let mut fx = fixture(ORDERS_CSV);
    fx.inputs.attendees = fx.inputs.attendees.with_file_name("missing.csv");
    let c = client(MemoryStore::default(), false);
    let err = run_import(&fx.inputs, &c, Utc::now()).await.unwrap_err();

    let io = err.downcast_ref::<std::io::Error>().unwrap();
    assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
    assert_eq!(*c.writer().calls.lock().unwrap(), 0);
}
