//! Imputation module for handling missing values.
//!
//! The cleaner uses three strategies: median fill for prices, a constant
//! marker for order numbers and zero for sales amounts.

mod statistical;

pub use statistical::StatisticalImputer;
