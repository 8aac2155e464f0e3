//! Reading a stored table back for display.

use super::quote_ident;
use super::target::ConnectionTarget;
use crate::error::Result;
use crate::types::{CellValue, TableSnapshot};
use rusqlite::Connection;
use tracing::info;

/// Read every row of `table_name` from the database at `connection`.
pub fn fetch_table(connection: &str, table_name: &str) -> Result<TableSnapshot> {
    let target = ConnectionTarget::parse(connection)?;
    fetch_snapshot(&target, table_name)
}

/// Read every row of `table_name` from an already parsed target.
///
/// The database is opened read-only, so a missing file is reported instead
/// of silently created.
pub fn fetch_snapshot(target: &ConnectionTarget, table_name: &str) -> Result<TableSnapshot> {
    let conn = target.open_read_only()?;

    // fails with "no such table" when the table is absent
    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(table_name)))?;
    let columns = table_columns(&conn, table_name)?;
    let width = columns.len();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get_ref(i).map(CellValue::from))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    info!("Read {} rows from table '{}'", rows.len(), table_name);

    Ok(TableSnapshot { columns, rows })
}

/// Column names of `table_name` in declaration order.
fn table_columns(conn: &Connection, table_name: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table_name)))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;

    #[test]
    fn test_missing_database_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:///{}", dir.path().join("absent.db").display());

        assert!(matches!(
            fetch_table(&url, "sales_data"),
            Err(EtlError::Storage(_))
        ));
        assert!(!dir.path().join("absent.db").exists());
    }

    #[test]
    fn test_missing_table_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE other (x INTEGER);")
            .unwrap();

        let target = ConnectionTarget::File(path);
        assert!(matches!(
            fetch_snapshot(&target, "sales_data"),
            Err(EtlError::Storage(_))
        ));
    }

    #[test]
    fn test_empty_table_keeps_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE sales_data (ORDERNUMBER TEXT, SALES REAL);")
            .unwrap();

        let snapshot = fetch_snapshot(&ConnectionTarget::File(path), "sales_data").unwrap();
        assert_eq!(snapshot.columns, vec!["ORDERNUMBER", "SALES"]);
        assert_eq!(snapshot.row_count(), 0);
    }

    #[test]
    fn test_columns_follow_declaration_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE sales_data (SALES REAL, \"TOTAL VALUE\" REAL, ORDERNUMBER TEXT);
             INSERT INTO sales_data VALUES (2871.0, 2871.0, '10107');",
        )
        .unwrap();

        assert_eq!(
            table_columns(&conn, "sales_data").unwrap(),
            vec!["SALES", "TOTAL VALUE", "ORDERNUMBER"]
        );
        assert!(table_columns(&conn, "absent").unwrap().is_empty());

        let snapshot = fetch_snapshot(&ConnectionTarget::File(path), "sales_data").unwrap();
        assert_eq!(snapshot.columns, vec!["SALES", "TOTAL VALUE", "ORDERNUMBER"]);
        assert_eq!(snapshot.rows[0][2], CellValue::Text("10107".into()));
    }
}
