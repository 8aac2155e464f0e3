//! Statistical and constant imputation.
//!
//! Each method rewrites one column of the DataFrame in place and appends a
//! human-readable entry to `processing_steps` when it changed something.

use crate::error::{EtlError, Result};
use crate::utils::{fill_numeric_nulls, fill_numeric_zero, fill_string_nulls, is_numeric_dtype};
use polars::prelude::*;
use tracing::{debug, warn};

/// Imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill nulls of a numeric column with the median of its non-null values.
    ///
    /// Returns the median used. When the column has no values at all the
    /// median is undefined: the fill is skipped and `None` is returned.
    pub fn apply_numeric_median(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<Option<f64>> {
        let series = Self::column(df, col_name)?;
        let missing = series.null_count();

        let Some(median_val) = series.median() else {
            warn!(
                "Column '{}' has no numeric values; median fill skipped",
                col_name
            );
            processing_steps.push(format!(
                "Skipped median fill for '{}': no numeric values",
                col_name
            ));
            return Ok(None);
        };

        if missing > 0 {
            let filled = fill_numeric_nulls(&series, median_val)?;
            df.replace(col_name, filled)?;
            processing_steps.push(format!(
                "Filled {} missing '{}' values with median {}",
                missing, col_name, median_val
            ));
            debug!("Filled '{}' with median {}", col_name, median_val);
        }

        Ok(Some(median_val))
    }

    /// Fill nulls with a constant string. The column becomes a string column
    /// only if something was filled.
    pub fn apply_constant_imputation(
        df: &mut DataFrame,
        col_name: &str,
        value: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<usize> {
        let series = Self::column(df, col_name)?;
        let missing = series.null_count();

        if missing > 0 {
            let filled = fill_string_nulls(&series, value)?;
            df.replace(col_name, filled)?;
            processing_steps.push(format!(
                "Filled {} missing '{}' values with constant '{}'",
                missing, col_name, value
            ));
        }

        Ok(missing)
    }

    /// Fill nulls with zero. Numeric columns keep their dtype; text columns
    /// receive the literal "0".
    pub fn apply_zero_imputation(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<usize> {
        let series = Self::column(df, col_name)?;
        let missing = series.null_count();

        if missing > 0 {
            let filled = if is_numeric_dtype(series.dtype()) {
                fill_numeric_zero(&series)?
            } else {
                fill_string_nulls(&series, "0")?
            };
            df.replace(col_name, filled)?;
            processing_steps.push(format!(
                "Filled {} missing '{}' values with 0",
                missing, col_name
            ));
        }

        Ok(missing)
    }

    fn column(df: &DataFrame, col_name: &str) -> Result<Series> {
        df.column(col_name)
            .map(|col| col.as_materialized_series().clone())
            .map_err(|_| EtlError::ColumnNotFound(col_name.to_string()))
    }
}
