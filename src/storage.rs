//! Durable append-only customer log backed by SQLite.

use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::record::CustomerRecord;

const CREATE_CUSTOMERS: &str = "CREATE TABLE IF NOT EXISTS customers (
    customer_id TEXT,
    age INTEGER,
    annual_income REAL,
    spending_score REAL
)";

/// Durable backing store for customer records.
///
/// Implementations keep records in append order and never persist cluster labels.
pub trait CustomerLog {
    /// Append one record.
    fn append(&mut self, record: &CustomerRecord) -> Result<()>;

    /// Append every record or none of them. Returns the number appended.
    fn append_all(&mut self, records: &[CustomerRecord]) -> Result<usize>;

    /// Every stored record, in storage order, with `cluster` unset.
    fn load_all(&self) -> Result<Vec<CustomerRecord>>;
}

/// SQLite implementation of [`CustomerLog`] over the single `customers` table.
pub struct SqliteLog {
    conn: Connection,
}

impl SqliteLog {
    /// Open (or create) a file-backed database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        apply_pragmas(&conn)?;
        tracing::debug!(path = %path.display(), "opened customer database");
        Self::initialize(conn)
    }

    /// Open a private in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch(CREATE_CUSTOMERS)?;
        Ok(Self { conn })
    }

    /// Number of rows in the durable table.
    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

/// WAL mode, NORMAL sync, 5s busy timeout.
fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )?;
    Ok(())
}

fn insert_row(conn: &Connection, record: &CustomerRecord) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO customers (customer_id, age, annual_income, spending_score)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            record.customer_id,
            record.age,
            record.annual_income,
            record.spending_score
        ],
    )
}

impl CustomerLog for SqliteLog {
    fn append(&mut self, record: &CustomerRecord) -> Result<()> {
        insert_row(&self.conn, record)?;
        Ok(())
    }

    fn append_all(&mut self, records: &[CustomerRecord]) -> Result<usize> {
        // Dropping the transaction without commit rolls it back.
        let tx = self.conn.transaction()?;
        for record in records {
            insert_row(&tx, record)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    fn load_all(&self) -> Result<Vec<CustomerRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, age, annual_income, spending_score
             FROM customers ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CustomerRecord::new(
                row.get::<_, String>(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
            ))
        })?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_load_preserves_order() {
        let mut log = SqliteLog::open_in_memory().unwrap();
        log.append(&CustomerRecord::new("b", 40, 80_000.0, 70.0)).unwrap();
        log.append(&CustomerRecord::new("a", 25, 30_000.0, 40.0)).unwrap();

        let records = log.load_all().unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(records[0].age, 40);
        assert_eq!(records[0].annual_income, 80_000.0);
        assert!(records.iter().all(|r| r.cluster.is_none()));
    }

    #[test]
    fn test_labels_are_not_persisted() {
        let mut log = SqliteLog::open_in_memory().unwrap();
        let mut record = CustomerRecord::new("a", 25, 30_000.0, 40.0);
        record.cluster = Some(3);
        log.append(&record).unwrap();

        assert_eq!(log.load_all().unwrap()[0].cluster, None);
    }

    #[test]
    fn test_append_all_counts_rows() {
        let mut log = SqliteLog::open_in_memory().unwrap();
        let batch = vec![
            CustomerRecord::new("a", 25, 30_000.0, 40.0),
            CustomerRecord::new("b", 40, 80_000.0, 70.0),
        ];
        assert_eq!(log.append_all(&batch).unwrap(), 2);
        assert_eq!(log.count().unwrap(), 2);
    }

    #[test]
    fn test_file_backed_log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("customers.db");

        {
            let mut log = SqliteLog::open(&path).unwrap();
            log.append(&CustomerRecord::new("persist", 33, 41_000.0, 55.0))
                .unwrap();
        }

        let log = SqliteLog::open(&path).unwrap();
        let records = log.load_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].customer_id, "persist");
    }
}
