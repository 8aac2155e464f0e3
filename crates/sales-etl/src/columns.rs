//! Column names of the sales export the cleaner knows about.
//!
//! Every other column passes through the pipeline untouched.

pub const ORDER_DATE: &str = "ORDERDATE";
pub const ORDER_NUMBER: &str = "ORDERNUMBER";
pub const SALES: &str = "SALES";
pub const PRICE_EACH: &str = "PRICEEACH";
pub const QUANTITY_ORDERED: &str = "QUANTITYORDERED";
pub const ADDRESS_LINE_2: &str = "ADDRESSLINE2";

/// Derived column: `QUANTITYORDERED * PRICEEACH`.
pub const TOTAL_VALUE: &str = "TOTALVALUE";

/// Literal used for missing order numbers.
pub const UNKNOWN_ORDER_NUMBER: &str = "Unknown";

/// Columns the cleaner reads and therefore requires.
pub const REQUIRED: [&str; 5] = [ORDER_DATE, ORDER_NUMBER, SALES, PRICE_EACH, QUANTITY_ORDERED];
