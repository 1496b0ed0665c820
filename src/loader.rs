use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tracing::info;

use crate::cleaner::{CustomerRow, OrderRow};
use crate::error::LoadError;

/// Default rows per INSERT statement. Six columns at a hundred rows stays
/// well under SQLite's bind-parameter limit.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Bind-parameter floor across SQLite versions. Statements are sized so
/// `columns × rows` never reaches it, whatever batch size is configured.
const MAX_BIND_PARAMS: usize = 999;

/// A row type that knows its target table and surrenders its column values
/// in declaration order.
pub trait BatchRow {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<Value>;
}

impl BatchRow for CustomerRow {
    const TABLE: &'static str = "customers";
    const COLUMNS: &'static [&'static str] =
        &["customerid", "customername", "mobilenumber", "region"];

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.customerid.clone()),
            Value::Text(self.customername.clone()),
            Value::Text(self.mobilenumber.clone()),
            Value::Text(self.region.clone()),
        ]
    }
}

impl BatchRow for OrderRow {
    const TABLE: &'static str = "orders";
    const COLUMNS: &'static [&'static str] = &[
        "orderid",
        "mobilenumber",
        "orderdatetime",
        "skuid",
        "skucount",
        "totalamount",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.orderid.clone()),
            Value::Text(self.mobilenumber.clone()),
            Value::Text(self.orderdatetime.clone()),
            Value::Text(self.skuid.clone()),
            Value::Integer(self.skucount),
            Value::Real(self.totalamount),
        ]
    }
}

/// Appends cleaned rows into the store, one transaction per dataset.
///
/// The loader only ever inserts. Inserts are grouped into multi-row
/// statements of up to `batch_size` rows, capped per table so the statement
/// stays inside the bind-parameter limit; if any statement fails the
/// transaction is dropped and rolls back, leaving the table exactly as it
/// was.
pub struct BatchLoader {
    batch_size: usize,
}

impl BatchLoader {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Apply the table DDL. Idempotent, safe to run on every start.
    pub fn ensure_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(include_str!("../migrations/001_create_tables.sql"))
    }

    /// Append every row inside one transaction and return how many went in.
    /// An empty batch commits nothing and reports zero.
    pub fn load<R: BatchRow>(&self, conn: &mut Connection, rows: &[R]) -> Result<usize, LoadError> {
        let table_err = |source: rusqlite::Error| LoadError {
            table: R::TABLE.to_string(),
            source,
        };

        let tx = conn.transaction().map_err(table_err)?;
        let row_placeholder = format!("({})", vec!["?"; R::COLUMNS.len()].join(", "));
        let rows_per_statement = self
            .batch_size
            .min(MAX_BIND_PARAMS / R::COLUMNS.len())
            .max(1);

        for chunk in rows.chunks(rows_per_statement) {
            let placeholders = vec![row_placeholder.as_str(); chunk.len()].join(", ");
            let sql = format!(
                "INSERT INTO {} ({}) VALUES {}",
                R::TABLE,
                R::COLUMNS.join(", "),
                placeholders
            );
            let values: Vec<Value> = chunk.iter().flat_map(|row| row.values()).collect();
            tx.execute(&sql, params_from_iter(values)).map_err(table_err)?;
        }

        tx.commit().map_err(table_err)?;
        info!("Loaded {} rows into {}", rows.len(), R::TABLE);
        Ok(rows.len())
    }

    pub fn load_customers(
        &self,
        conn: &mut Connection,
        rows: &[CustomerRow],
    ) -> Result<usize, LoadError> {
        self.load(conn, rows)
    }

    pub fn load_orders(&self, conn: &mut Connection, rows: &[OrderRow]) -> Result<usize, LoadError> {
        self.load(conn, rows)
    }
}

impl Default for BatchLoader {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        BatchLoader::ensure_schema(&conn).unwrap();
        conn
    }

    fn customer_row(id: &str, mobile: &str) -> CustomerRow {
        CustomerRow {
            customerid: id.to_string(),
            customername: "Asha Rao".to_string(),
            mobilenumber: mobile.to_string(),
            region: "South".to_string(),
        }
    }

    fn order_row(id: &str) -> OrderRow {
        OrderRow {
            orderid: id.to_string(),
            mobilenumber: "9123456781".to_string(),
            orderdatetime: "2025-10-12 09:15:32".to_string(),
            skuid: "SKU-1001".to_string(),
            skucount: 2,
            totalamount: 7450.0,
        }
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_loads_customers_and_preserves_values() {
        let mut conn = open_store();
        let rows = vec![customer_row("C001", "9123456781"), customer_row("C002", "8877665544")];

        let loaded = BatchLoader::default().load_customers(&mut conn, &rows).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(count(&conn, "customers"), 2);

        let region: String = conn
            .query_row(
                "SELECT region FROM customers WHERE customerid = 'C001'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(region, "South");
    }

    #[test]
    fn test_loads_orders_with_typed_columns() {
        let mut conn = open_store();
        let rows = vec![order_row("ORD-2025-0001")];

        BatchLoader::default().load_orders(&mut conn, &rows).unwrap();

        let (skucount, totalamount): (i64, f64) = conn
            .query_row("SELECT skucount, totalamount FROM orders", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(skucount, 2);
        assert_eq!(totalamount, 7450.0);
    }

    #[test]
    fn test_chunked_load_inserts_every_row() {
        let mut conn = open_store();
        let rows: Vec<OrderRow> = (1..=5).map(|i| order_row(&format!("ORD-2025-{i:04}"))).collect();

        let loaded = BatchLoader::new(2).load_orders(&mut conn, &rows).unwrap();
        assert_eq!(loaded, 5);
        assert_eq!(count(&conn, "orders"), 5);
    }

    #[test]
    fn test_oversized_batch_size_is_capped_per_statement() {
        let mut conn = open_store();
        // 6000 rows at six columns would need 36000 binds in one statement
        let rows: Vec<OrderRow> = (1..=6000)
            .map(|i| order_row(&format!("ORD-2025-{i:04}")))
            .collect();

        let loaded = BatchLoader::new(usize::MAX).load_orders(&mut conn, &rows).unwrap();
        assert_eq!(loaded, 6000);
        assert_eq!(count(&conn, "orders"), 6000);
    }

    #[test]
    fn test_empty_batch_loads_zero_rows() {
        let mut conn = open_store();
        let loaded = BatchLoader::default()
            .load_customers(&mut conn, &[])
            .unwrap();
        assert_eq!(loaded, 0);
        assert_eq!(count(&conn, "customers"), 0);
    }

    #[test]
    fn test_appends_rather_than_replaces() {
        let mut conn = open_store();
        let rows = vec![order_row("ORD-2025-0001")];
        let loader = BatchLoader::default();

        loader.load_orders(&mut conn, &rows).unwrap();
        loader.load_orders(&mut conn, &rows).unwrap();
        assert_eq!(count(&conn, "orders"), 2);
    }

    struct GaugedRow(i64);

    impl BatchRow for GaugedRow {
        const TABLE: &'static str = "gauged";
        const COLUMNS: &'static [&'static str] = &["reading"];

        fn values(&self) -> Vec<Value> {
            vec![Value::Integer(self.0)]
        }
    }

    #[test]
    fn test_failed_batch_rolls_back_completely() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE gauged (reading INTEGER NOT NULL CHECK (reading >= 0))")
            .unwrap();

        let rows = vec![GaugedRow(1), GaugedRow(2), GaugedRow(-3), GaugedRow(4), GaugedRow(5)];
        let err = BatchLoader::new(1).load(&mut conn, &rows).unwrap_err();

        assert_eq!(err.table, "gauged");
        assert_eq!(count(&conn, "gauged"), 0);
    }
}
