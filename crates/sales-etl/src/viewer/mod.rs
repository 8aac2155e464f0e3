//! Sortable text grid over a stored table.
//!
//! [`GridView`] holds a [`TableSnapshot`] and re-sorts all of its rows when a
//! column header is clicked. Each column remembers its own direction in a
//! [`SortState`] table: the first click sorts ascending, every later click on
//! the same column flips it.
//!
//! Ordering is natural. Two cells that both read as numbers compare
//! numerically, anything else compares as text, and nulls sort before
//! everything when ascending.

use crate::error::{EtlError, Result};
use crate::types::{CellValue, TableSnapshot};
use crate::utils::truncate_str;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

pub const EMPTY_MESSAGE: &str = "No data to display.";

/// Longer cells are cut to this many characters when rendered.
pub const MAX_CELL_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    fn indicator(self) -> &'static str {
        match self {
            Self::Ascending => "▲",
            Self::Descending => "▼",
        }
    }
}

/// Per-column sort directions plus the column sorted last.
#[derive(Debug, Clone, Default)]
pub struct SortState {
    directions: HashMap<String, SortDirection>,
    active: Option<String>,
}

impl SortState {
    /// Direction the next click on `column` will apply.
    pub fn next_direction(&self, column: &str) -> SortDirection {
        self.directions
            .get(column)
            .map_or(SortDirection::Ascending, |d| d.toggled())
    }

    /// Direction last applied to `column`, if it was ever clicked.
    pub fn direction(&self, column: &str) -> Option<SortDirection> {
        self.directions.get(column).copied()
    }

    /// The column the rows are currently ordered by.
    pub fn active(&self) -> Option<(&str, SortDirection)> {
        let column = self.active.as_deref()?;
        self.direction(column).map(|d| (column, d))
    }

    fn record(&mut self, column: &str) -> SortDirection {
        let direction = self.next_direction(column);
        self.directions.insert(column.to_string(), direction);
        self.active = Some(column.to_string());
        direction
    }
}

/// Compare two cells: nulls first, numbers before text, numbers by value.
pub fn natural_cmp(a: &CellValue, b: &CellValue) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }

    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.to_string().cmp(&b.to_string()),
    }
}

/// A sortable grid over a [`TableSnapshot`].
#[derive(Debug, Clone)]
pub struct GridView {
    snapshot: TableSnapshot,
    sort: SortState,
}

impl GridView {
    pub fn new(snapshot: TableSnapshot) -> Self {
        Self {
            snapshot,
            sort: SortState::default(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.snapshot.columns
    }

    /// Rows in their current display order.
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.snapshot.rows
    }

    pub fn row_count(&self) -> usize {
        self.snapshot.row_count()
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    /// Handle a click on a column header and return the applied direction.
    ///
    /// The sort is stable, so earlier orderings break ties.
    pub fn click_header(&mut self, column: &str) -> Result<SortDirection> {
        let index = self
            .snapshot
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| EtlError::ColumnNotFound(column.to_string()))?;

        let direction = self.sort.record(column);
        self.snapshot.rows.sort_by(|a, b| {
            let ordering = natural_cmp(&a[index], &b[index]);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        debug!("Sorted {} rows by '{}' {:?}", self.row_count(), column, direction);

        Ok(direction)
    }

    /// Render the grid as aligned text.
    ///
    /// `max_rows` limits the rows shown; the footer always counts all of them.
    pub fn render(&self, max_rows: Option<usize>) -> String {
        if self.snapshot.rows.is_empty() {
            return EMPTY_MESSAGE.to_string();
        }

        let active = self.sort.active();
        let headers: Vec<String> = self
            .snapshot
            .columns
            .iter()
            .map(|name| match active {
                Some((column, direction)) if column == name => {
                    format!("{} {}", name, direction.indicator())
                }
                _ => name.clone(),
            })
            .collect();

        let shown = max_rows.unwrap_or(usize::MAX).min(self.snapshot.rows.len());
        let cells: Vec<Vec<String>> = self.snapshot.rows[..shown]
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| truncate_str(&cell.to_string(), MAX_CELL_WIDTH))
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, &headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &rule, &widths);
        for row in &cells {
            push_line(&mut out, row, &widths);
        }
        if shown < self.snapshot.rows.len() {
            out.push_str(&format!("... {} more rows\n", self.snapshot.rows.len() - shown));
        }
        out.push_str(&format!("Total rows: {}", self.snapshot.rows.len()));
        out
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn snapshot() -> TableSnapshot {
        TableSnapshot {
            columns: vec!["ORDERNUMBER".into(), "CITY".into(), "SALES".into()],
            rows: vec![
                vec![text("10121"), text("Reims"), CellValue::Real(2765.9)],
                vec![text("10107"), text("NYC"), CellValue::Real(2871.0)],
                vec![text("Unknown"), CellValue::Null, CellValue::Real(0.0)],
                vec![text("9"), text("Paris"), CellValue::Real(2765.9)],
            ],
        }
    }

    fn column(view: &GridView, index: usize) -> Vec<String> {
        view.rows().iter().map(|r| r[index].to_string()).collect()
    }

    #[test]
    fn test_first_click_ascending_then_toggles() {
        let mut view = GridView::new(snapshot());

        assert_eq!(view.click_header("SALES").unwrap(), SortDirection::Ascending);
        assert_eq!(column(&view, 2), vec!["0", "2765.9", "2765.9", "2871"]);

        assert_eq!(view.click_header("SALES").unwrap(), SortDirection::Descending);
        assert_eq!(column(&view, 2), vec!["2871", "2765.9", "2765.9", "0"]);

        assert_eq!(view.click_header("SALES").unwrap(), SortDirection::Ascending);
    }

    #[test]
    fn test_directions_are_per_column() {
        let mut view = GridView::new(snapshot());
        view.click_header("SALES").unwrap();
        view.click_header("SALES").unwrap();

        // a fresh column starts ascending regardless of the other one
        assert_eq!(view.click_header("CITY").unwrap(), SortDirection::Ascending);
        assert_eq!(
            view.sort_state().direction("SALES"),
            Some(SortDirection::Descending)
        );
        assert_eq!(
            view.sort_state().next_direction("SALES"),
            SortDirection::Ascending
        );
        assert_eq!(
            view.sort_state().active(),
            Some(("CITY", SortDirection::Ascending))
        );
    }

    #[test]
    fn test_natural_order_numbers_then_text() {
        let mut view = GridView::new(snapshot());
        view.click_header("ORDERNUMBER").unwrap();
        // numeric text compares by value, so "9" precedes "10107"
        assert_eq!(column(&view, 0), vec!["9", "10107", "10121", "Unknown"]);
    }

    #[test]
    fn test_nulls_first_ascending() {
        let mut view = GridView::new(snapshot());
        view.click_header("CITY").unwrap();
        assert_eq!(column(&view, 1), vec!["", "NYC", "Paris", "Reims"]);

        view.click_header("CITY").unwrap();
        assert_eq!(column(&view, 1), vec!["Reims", "Paris", "NYC", ""]);
    }

    #[test]
    fn test_stable_sort_keeps_tie_order() {
        let mut view = GridView::new(snapshot());
        view.click_header("CITY").unwrap();
        view.click_header("SALES").unwrap();
        // equal SALES rows keep the CITY ordering from the previous click
        let cities: Vec<String> = column(&view, 1);
        assert_eq!(cities, vec!["", "Paris", "Reims", "NYC"]);
    }

    #[test]
    fn test_unknown_column() {
        let mut view = GridView::new(snapshot());
        assert!(matches!(
            view.click_header("MISSING"),
            Err(EtlError::ColumnNotFound(_))
        ));
        assert!(view.sort_state().active().is_none());
    }

    #[test]
    fn test_render_marks_active_column() {
        let mut view = GridView::new(snapshot());
        view.click_header("SALES").unwrap();
        view.click_header("SALES").unwrap();

        let rendered = view.render(None);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].contains("SALES ▼"));
        assert!(!lines[0].contains("CITY ▲"));
        assert!(lines[1].starts_with("-----"));
        assert!(lines[2].starts_with("10107"));
        assert_eq!(lines.last(), Some(&"Total rows: 4"));
    }

    #[test]
    fn test_render_max_rows() {
        let view = GridView::new(snapshot());
        let rendered = view.render(Some(2));
        assert!(rendered.contains("... 2 more rows"));
        assert!(rendered.ends_with("Total rows: 4"));
        assert_eq!(rendered.lines().count(), 2 + 2 + 1 + 1);
    }

    #[test]
    fn test_render_empty() {
        let view = GridView::new(TableSnapshot {
            columns: vec!["SALES".into()],
            rows: Vec::new(),
        });
        assert_eq!(view.render(None), EMPTY_MESSAGE);
    }

    #[test]
    fn test_render_truncates_long_cells() {
        let view = GridView::new(TableSnapshot {
            columns: vec!["ADDRESSLINE1".into()],
            rows: vec![vec![text(&"x".repeat(MAX_CELL_WIDTH + 10))]],
        });
        let rendered = view.render(None);
        let cell = rendered.lines().nth(2).unwrap();
        assert_eq!(cell.chars().count(), MAX_CELL_WIDTH);
        assert!(cell.ends_with("..."));
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp(&CellValue::Null, &text("a")), Ordering::Less);
        assert_eq!(
            natural_cmp(&CellValue::Integer(10), &CellValue::Real(9.5)),
            Ordering::Greater
        );
        assert_eq!(natural_cmp(&CellValue::Integer(1), &text("abc")), Ordering::Less);
        assert_eq!(natural_cmp(&text("abc"), &text("abd")), Ordering::Less);
    }
}
