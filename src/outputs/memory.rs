//! In-memory [`RowStore`] for tests.

use super::sheets::{RowStore, SheetRef};
use crate::errors::{HarvestError, Result};
use crate::models::{Cell, OutputRow};
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct MemorySheet {
    id: i64,
    row_count: usize,
    column_count: usize,
    rows: Vec<OutputRow>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: RefCell<BTreeMap<(String, String), MemorySheet>>,
    next_id: RefCell<i64>,
}

impl MemoryStore {
    fn new_id(&self) -> i64 {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        *next
    }

    /// Put `values` into 1-based `column` of a sheet, creating it if needed.
    pub fn seed_column(&self, spreadsheet_id: &str, title: &str, column: usize, values: &[&str]) {
        let id = self.new_id();
        let mut sheets = self.sheets.borrow_mut();
        let sheet = sheets
            .entry((spreadsheet_id.to_string(), title.to_string()))
            .or_insert_with(|| MemorySheet {
                id,
                row_count: 1000,
                column_count: 26,
                rows: Vec::new(),
            });
        for (i, value) in values.iter().enumerate() {
            if sheet.rows.len() <= i {
                sheet.rows.push(OutputRow(Vec::new()));
            }
            let row = &mut sheet.rows[i].0;
            if row.len() < column {
                row.resize(column, Cell::blank());
            }
            row[column - 1] = Cell::from(*value);
        }
    }

    /// Rows written to a sheet so far.
    pub fn sheet_rows(&self, spreadsheet_id: &str, title: &str) -> Option<Vec<OutputRow>> {
        self.sheets
            .borrow()
            .get(&(spreadsheet_id.to_string(), title.to_string()))
            .map(|s| s.rows.clone())
    }

    pub fn sheet_count(&self, spreadsheet_id: &str) -> usize {
        self.sheets
            .borrow()
            .keys()
            .filter(|(book, _)| book == spreadsheet_id)
            .count()
    }
}

impl RowStore for MemoryStore {
    async fn read_column(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
        column: usize,
    ) -> Result<Vec<String>> {
        let sheets = self.sheets.borrow();
        let found = sheets
            .get(&(spreadsheet_id.to_string(), sheet.to_string()))
            .ok_or_else(|| HarvestError::InputSheetMissing {
                spreadsheet_id: spreadsheet_id.to_string(),
                sheet: sheet.to_string(),
            })?;
        Ok(found
            .rows
            .iter()
            .map(|row| match row.0.get(column - 1) {
                Some(Cell::Text(s)) => s.clone(),
                Some(Cell::Number(n)) => n.to_string(),
                None => String::new(),
            })
            .collect())
    }

    async fn replace_sheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        rows: usize,
        columns: usize,
    ) -> Result<SheetRef> {
        let id = self.new_id();
        let key = (spreadsheet_id.to_string(), title.to_string());
        let mut sheets = self.sheets.borrow_mut();
        sheets.remove(&key);
        sheets.insert(
            key,
            MemorySheet {
                id,
                row_count: rows,
                column_count: columns,
                rows: Vec::new(),
            },
        );
        Ok(SheetRef {
            id,
            title: title.to_string(),
            row_count: rows,
            column_count: columns,
        })
    }

    async fn write_rows(
        &self,
        spreadsheet_id: &str,
        sheet: &SheetRef,
        start_row: usize,
        rows: &[OutputRow],
    ) -> Result<()> {
        let mut sheets = self.sheets.borrow_mut();
        let target = sheets
            .get_mut(&(spreadsheet_id.to_string(), sheet.title.clone()))
            .filter(|s| s.id == sheet.id)
            .ok_or_else(|| HarvestError::Sheets {
                status: 400,
                body: format!("no sheet with id {}", sheet.id),
            })?;

        let end = start_row - 1 + rows.len();
        if target.rows.len() < end {
            target.rows.resize(end, OutputRow(Vec::new()));
        }
        target.row_count = target.row_count.max(end);
        for (slot, row) in target.rows[start_row - 1..end].iter_mut().zip(rows) {
            if row.len() > target.column_count {
                return Err(HarvestError::Sheets {
                    status: 400,
                    body: format!("row of {} cells exceeds {} columns", row.len(), target.column_count),
                });
            }
            *slot = row.clone();
        }
        Ok(())
    }
}
