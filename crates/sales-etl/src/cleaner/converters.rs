//! Type conversion functions for data cleaning.
//!
//! Both conversions coerce: a cell that cannot be converted becomes null
//! instead of failing the column.

use crate::error::Result;
use crate::utils::{is_numeric_dtype, parse_numeric_coerce};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Date-time layouts tried in order. US month-first layouts come first since
/// that is what the sales exports use ("2/24/2003 0:00").
const DATETIME_FORMATS: [&str; 9] = [
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: [&str; 6] = [
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%d %B %Y",
];

/// Parse a single cell as a date-time.
pub fn parse_datetime_str(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Convert a series to `Datetime(ms)`. Unparsable cells become null.
///
/// Columns that already hold dates are cast. Anything else is read through
/// its string form, so numeric cells never parse.
pub(crate) fn coerce_to_datetime(series: &Series) -> Result<Series> {
    let target = DataType::Datetime(TimeUnit::Milliseconds, None);

    if matches!(series.dtype(), DataType::Datetime(_, _) | DataType::Date) {
        return Ok(series.cast(&target)?);
    }

    let as_str = series.cast(&DataType::String)?;
    let millis: Vec<Option<i64>> = as_str
        .str()?
        .into_iter()
        .map(|opt| {
            opt.and_then(parse_datetime_str)
                .map(|dt| dt.and_utc().timestamp_millis())
        })
        .collect();

    Ok(Series::new(series.name().clone(), millis).cast(&target)?)
}

/// Convert a series to Float64. Unparsable cells and NaN become null.
pub(crate) fn coerce_to_float(series: &Series) -> Result<Series> {
    let values: Vec<Option<f64>> = if is_numeric_dtype(series.dtype()) {
        let floats = series.cast(&DataType::Float64)?;
        floats
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect()
    } else {
        let as_str = series.cast(&DataType::String)?;
        as_str
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_numeric_coerce))
            .collect()
    };

    Ok(Series::new(series.name().clone(), values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn millis(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    // ========================================================================
    // parse_datetime_str()
    // ========================================================================

    #[test]
    fn test_parse_us_export_layout() {
        let dt = parse_datetime_str("2/24/2003 0:00").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2003, 2, 24));
        assert_eq!(dt.hour(), 0);

        let dt = parse_datetime_str("12/1/2004 13:45").unwrap();
        assert_eq!((dt.month(), dt.day(), dt.hour(), dt.minute()), (12, 1, 13, 45));
    }

    #[test]
    fn test_parse_iso_layouts() {
        assert!(parse_datetime_str("2003-05-07").is_some());
        assert!(parse_datetime_str("2003-05-07 10:30:00").is_some());
        assert!(parse_datetime_str("2003-05-07T10:30:00").is_some());
        assert!(parse_datetime_str("2003-05-07T10:30:00+02:00").is_some());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_datetime_str("").is_none());
        assert!(parse_datetime_str("not a date").is_none());
        assert!(parse_datetime_str("13/45/2003").is_none());
        assert!(parse_datetime_str("20030224").is_none());
    }

    // ========================================================================
    // coerce_to_datetime()
    // ========================================================================

    #[test]
    fn test_coerce_to_datetime_mixed() {
        let series = Series::new(
            "ORDERDATE".into(),
            &[Some("2/24/2003 0:00"), Some("garbage"), None, Some("2003-05-07")],
        );
        let result = coerce_to_datetime(&series).unwrap();

        assert!(matches!(result.dtype(), DataType::Datetime(TimeUnit::Milliseconds, None)));
        assert_eq!(result.null_count(), 2);

        let as_int = result.cast(&DataType::Int64).unwrap();
        let ints = as_int.i64().unwrap();
        assert_eq!(ints.get(0), Some(millis(2003, 2, 24, 0, 0)));
        assert_eq!(ints.get(3), Some(millis(2003, 5, 7, 0, 0)));
    }

    #[test]
    fn test_coerce_to_datetime_numeric_column() {
        let series = Series::new("ORDERDATE".into(), &[20030224i64, 1]);
        let result = coerce_to_datetime(&series).unwrap();
        assert_eq!(result.null_count(), 2);
    }

    // ========================================================================
    // coerce_to_float()
    // ========================================================================

    #[test]
    fn test_coerce_to_float_from_strings() {
        let series = Series::new(
            "PRICEEACH".into(),
            &[Some("95.70"), Some("abc"), None, Some(" 81.35 ")],
        );
        let result = coerce_to_float(&series).unwrap();

        assert_eq!(result.dtype(), &DataType::Float64);
        assert_eq!(result.null_count(), 2);
        let floats = result.f64().unwrap();
        assert_eq!(floats.get(0), Some(95.7));
        assert_eq!(floats.get(3), Some(81.35));
    }

    #[test]
    fn test_coerce_to_float_from_integers() {
        let series = Series::new("PRICEEACH".into(), &[Some(100i64), None]);
        let result = coerce_to_float(&series).unwrap();

        assert_eq!(result.dtype(), &DataType::Float64);
        assert_eq!(result.f64().unwrap().get(0), Some(100.0));
        assert_eq!(result.null_count(), 1);
    }

    #[test]
    fn test_coerce_to_float_nan_is_null() {
        let series = Series::new("PRICEEACH".into(), &[f64::NAN, 2.5]);
        let result = coerce_to_float(&series).unwrap();
        assert_eq!(result.null_count(), 1);
    }
}
