use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pipeline::PipelineStage;

// ============================================================================
// Cleaning
// ============================================================================

/// What the cleaner changed, for logs and the JSON summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    /// Rows removed for a missing quantity or total.
    pub rows_removed: usize,
    pub columns_dropped: Vec<String>,
    /// `ORDERDATE` cells that were present but could not be parsed.
    pub unparsed_dates: usize,
    pub unknown_order_numbers: usize,
    pub zero_filled_sales: usize,
    /// `PRICEEACH` cells that were present but not numeric.
    pub price_coercion_failures: usize,
    /// Median used to fill `PRICEEACH`; `None` when the column had no values.
    pub median_price: Option<f64>,
    /// Nulls left anywhere in the cleaned table.
    pub remaining_nulls: usize,
    pub processing_steps: Vec<String>,
}

// ============================================================================
// Storage read-back
// ============================================================================

/// One cell read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    /// Numeric view of the cell, used for natural ordering.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Real(f) => Some(*f),
            Self::Text(s) => crate::utils::parse_numeric_coerce(s),
            Self::Null | Self::Blob(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(f) => Self::Real(f),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Real(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
            Self::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Rows and ordered column names of a stored table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl TableSnapshot {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

// ============================================================================
// Run summary
// ============================================================================

/// Result of one pipeline run, serializable for `--json` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub success: bool,
    pub input_path: String,
    pub table_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_loaded: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning: Option<CleaningSummary>,
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<PipelineStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn new(input_path: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            success: false,
            input_path: input_path.into(),
            table_name: table_name.into(),
            rows_loaded: None,
            cleaning: None,
            saved: false,
            failed_stage: None,
            error_code: None,
            error: None,
            duration_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_display() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Integer(30).to_string(), "30");
        assert_eq!(CellValue::Real(95.7).to_string(), "95.7");
        assert_eq!(CellValue::Text("Paris".into()).to_string(), "Paris");
        assert_eq!(CellValue::Blob(vec![1, 2, 3]).to_string(), "<3 bytes>");
    }

    #[test]
    fn test_cell_value_as_f64() {
        assert_eq!(CellValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(CellValue::Text("2.5".into()).as_f64(), Some(2.5));
        assert_eq!(CellValue::Text("Unknown".into()).as_f64(), None);
        assert_eq!(CellValue::Null.as_f64(), None);
    }

    #[test]
    fn test_cell_value_from_value_ref() {
        assert_eq!(CellValue::from(ValueRef::Integer(7)), CellValue::Integer(7));
        assert_eq!(
            CellValue::from(ValueRef::Text(b"NYC")),
            CellValue::Text("NYC".to_string())
        );
        assert!(CellValue::from(ValueRef::Null).is_null());
    }

    #[test]
    fn test_run_summary_skips_empty_fields() {
        let summary = RunSummary::new("sales.csv", "sales_data");
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("cleaning").is_none());
        assert!(json.get("error").is_none());
        assert_eq!(json["table_name"], "sales_data");
    }
}
