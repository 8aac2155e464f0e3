//! Data cleaning for sales exports.
//!
//! [`SalesCleaner::clean`] applies a fixed sequence of column transformations
//! and row filters. The order matters, later steps read the coerced output
//! of earlier ones:
//!
//! 1. Drop `ADDRESSLINE2` if present
//! 2. Parse `ORDERDATE` (unparsable values become null)
//! 3. Fill missing `ORDERNUMBER` with `"Unknown"`
//! 4. Fill missing `SALES` with `0`
//! 5. Coerce `PRICEEACH` to numeric (unparsable values become null)
//! 6. Fill missing `PRICEEACH` with the column median
//! 7. Derive `TOTALVALUE = QUANTITYORDERED * PRICEEACH`
//! 8. Remove rows with a missing `QUANTITYORDERED` or `TOTALVALUE`
//! 9. Report the nulls left in the remaining columns
//!
//! A failure in any step aborts the run. No partially cleaned table is
//! ever returned.

mod converters;

pub use converters::parse_datetime_str;

use crate::columns::{
    ADDRESS_LINE_2, ORDER_DATE, ORDER_NUMBER, PRICE_EACH, QUANTITY_ORDERED, REQUIRED, SALES,
    TOTAL_VALUE, UNKNOWN_ORDER_NUMBER,
};
use crate::error::{EtlError, Result};
use crate::imputers::StatisticalImputer;
use crate::types::CleaningSummary;
use crate::utils::{is_numeric_dtype, total_null_count};
use converters::{coerce_to_datetime, coerce_to_float};
use polars::prelude::*;
use tracing::{debug, error, info, warn};

/// A cleaned table together with what was done to produce it.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub data: DataFrame,
    pub summary: CleaningSummary,
}

/// Cleaner for sales-record tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct SalesCleaner;

impl SalesCleaner {
    /// Clean a raw sales table.
    ///
    /// Logs the outcome. On failure the error is logged and returned, and
    /// the input table is consumed either way.
    pub fn clean(&self, df: DataFrame) -> Result<CleaningOutcome> {
        match self.run_steps(df) {
            Ok(outcome) => {
                info!("Data has been processed successfully.");
                Ok(outcome)
            }
            Err(e) => {
                error!("Error processing data: {}", e);
                Err(e)
            }
        }
    }

    fn run_steps(&self, mut df: DataFrame) -> Result<CleaningOutcome> {
        let mut summary = CleaningSummary {
            rows_before: df.height(),
            ..CleaningSummary::default()
        };
        let mut steps: Vec<String> = Vec::new();

        if let Some(missing) = REQUIRED
            .iter()
            .find(|name| df.get_column_index(name).is_none())
        {
            return Err(EtlError::ColumnNotFound(missing.to_string()));
        }

        // 1. Optional column, absence is fine
        if df.get_column_index(ADDRESS_LINE_2).is_some() {
            df = df.drop(ADDRESS_LINE_2)?;
            summary.columns_dropped.push(ADDRESS_LINE_2.to_string());
            steps.push(format!("Dropped column '{}'", ADDRESS_LINE_2));
            debug!("Dropped column '{}'", ADDRESS_LINE_2);
        }

        // 2.
        let raw_dates = required_series(&df, ORDER_DATE)?;
        let nulls_before = raw_dates.null_count();
        let dates = coerce_to_datetime(&raw_dates)
            .map_err(|e| conversion_error(ORDER_DATE, "datetime", e))?;
        summary.unparsed_dates = dates.null_count().saturating_sub(nulls_before);
        df.replace(ORDER_DATE, dates)?;
        steps.push(format!("Converted '{}' to datetime", ORDER_DATE));
        if summary.unparsed_dates > 0 {
            steps.push(format!(
                "{} '{}' values could not be parsed and were set to null",
                summary.unparsed_dates, ORDER_DATE
            ));
        }

        // 3. and 4.
        summary.unknown_order_numbers = StatisticalImputer::apply_constant_imputation(
            &mut df,
            ORDER_NUMBER,
            UNKNOWN_ORDER_NUMBER,
            &mut steps,
        )?;
        summary.zero_filled_sales =
            StatisticalImputer::apply_zero_imputation(&mut df, SALES, &mut steps)?;

        // 5.
        let raw_prices = required_series(&df, PRICE_EACH)?;
        let nulls_before = raw_prices.null_count();
        let prices = coerce_to_float(&raw_prices)
            .map_err(|e| conversion_error(PRICE_EACH, "numeric", e))?;
        summary.price_coercion_failures = prices.null_count().saturating_sub(nulls_before);
        df.replace(PRICE_EACH, prices)?;
        if summary.price_coercion_failures > 0 {
            steps.push(format!(
                "{} '{}' values were not numeric and were set to null",
                summary.price_coercion_failures, PRICE_EACH
            ));
        }

        // 6.
        summary.median_price =
            StatisticalImputer::apply_numeric_median(&mut df, PRICE_EACH, &mut steps)?;

        // 7.
        let mut quantity = required_series(&df, QUANTITY_ORDERED)?;
        // A column without a single value loads as text
        if quantity.null_count() == quantity.len() && !is_numeric_dtype(quantity.dtype()) {
            quantity = quantity.cast(&DataType::Float64)?;
            df.replace(QUANTITY_ORDERED, quantity.clone())?;
        }
        if !is_numeric_dtype(quantity.dtype()) {
            return Err(EtlError::TypeConversionFailed {
                column: QUANTITY_ORDERED.to_string(),
                target_type: "numeric".to_string(),
                reason: format!("column has dtype {}", quantity.dtype()),
            });
        }
        let quantity = quantity.cast(&DataType::Float64)?;
        let price = required_series(&df, PRICE_EACH)?;
        let total = (&quantity * &price)?.with_name(TOTAL_VALUE.into());
        df.with_column(total)?;
        steps.push(format!(
            "Added '{}' = '{}' * '{}'",
            TOTAL_VALUE, QUANTITY_ORDERED, PRICE_EACH
        ));

        // 8.
        let keep = complete_rows_mask(&df)?;
        df = df.filter(&keep)?;
        summary.rows_after = df.height();
        summary.rows_removed = summary.rows_before - summary.rows_after;
        if summary.rows_removed > 0 {
            steps.push(format!(
                "Removed {} rows with missing '{}' or '{}'",
                summary.rows_removed, QUANTITY_ORDERED, TOTAL_VALUE
            ));
        }

        // 9. informational only
        summary.remaining_nulls = total_null_count(&df);
        if summary.remaining_nulls > 0 {
            warn!(
                "Cleaned data still contains {} missing values",
                summary.remaining_nulls
            );
        }

        summary.processing_steps = steps;
        Ok(CleaningOutcome { data: df, summary })
    }
}

/// Clean a raw sales table with the default cleaner.
pub fn clean(df: DataFrame) -> Result<CleaningOutcome> {
    SalesCleaner.clean(df)
}

fn required_series(df: &DataFrame, name: &str) -> Result<Series> {
    df.column(name)
        .map(|col| col.as_materialized_series().clone())
        .map_err(|_| EtlError::ColumnNotFound(name.to_string()))
}

fn conversion_error(column: &str, target_type: &str, source: EtlError) -> EtlError {
    EtlError::TypeConversionFailed {
        column: column.to_string(),
        target_type: target_type.to_string(),
        reason: source.to_string(),
    }
}

/// Rows whose quantity and total are both present and not NaN.
fn complete_rows_mask(df: &DataFrame) -> Result<BooleanChunked> {
    let quantity = required_series(df, QUANTITY_ORDERED)?.cast(&DataType::Float64)?;
    let total = required_series(df, TOTAL_VALUE)?;

    let keep: Vec<bool> = quantity
        .f64()?
        .into_iter()
        .zip(total.f64()?.into_iter())
        .map(|pair| matches!(pair, (Some(q), Some(t)) if !q.is_nan() && !t.is_nan()))
        .collect();

    Ok(BooleanChunked::from_slice("keep".into(), &keep))
}
