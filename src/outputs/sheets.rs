//! Spreadsheet row store.
//!
//! The harvester only needs four things from a spreadsheet service: read one
//! column of a named sheet, replace a sheet with an empty one, grow it, and
//! write a block of rows in one call. [`RowStore`] captures exactly that;
//! [`SheetsClient`] implements it on the Google Sheets v4 REST API.

use crate::errors::{HarvestError, Result};
use crate::models::OutputRow;
use crate::utils::{a1_cell, column_letter, quote_sheet_title};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// A sheet inside a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRef {
    pub id: i64,
    pub title: String,
    pub row_count: usize,
    pub column_count: usize,
}

/// Narrow key-value view of a spreadsheet service.
pub trait RowStore {
    /// Values of 1-based `column` of `sheet`, top to bottom, header included.
    ///
    /// Fails with [`HarvestError::InputSheetMissing`] when no such sheet exists.
    async fn read_column(&self, spreadsheet_id: &str, sheet: &str, column: usize)
    -> Result<Vec<String>>;

    /// Delete `title` if present, then add an empty sheet of the given size.
    async fn replace_sheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        rows: usize,
        columns: usize,
    ) -> Result<SheetRef>;

    /// Write `rows` starting at 1-based `start_row`, column A, in one update.
    /// The sheet is grown first when the rows would run past its last row.
    async fn write_rows(
        &self,
        spreadsheet_id: &str,
        sheet: &SheetRef,
        start_row: usize,
        rows: &[OutputRow],
    ) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
    #[serde(default)]
    grid_properties: GridProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridProperties {
    #[serde(default)]
    row_count: usize,
    #[serde(default)]
    column_count: usize,
}

impl From<SheetProperties> for SheetRef {
    fn from(p: SheetProperties) -> Self {
        SheetRef {
            id: p.sheet_id,
            title: p.title,
            row_count: p.grid_properties.row_count,
            column_count: p.grid_properties.column_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Google Sheets v4 client authorized with a bearer token.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: Client,
    base_url: String,
    token: String,
}

impl SheetsClient {
    pub fn new(http: Client, token: String) -> Self {
        Self::with_base_url(http, SHEETS_API_BASE, token)
    }

    pub fn with_base_url(http: Client, base_url: &str, token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn spreadsheet_url(&self, spreadsheet_id: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}",
            self.base_url,
            urlencoding::encode(spreadsheet_id)
        )
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/values/{}",
            self.spreadsheet_url(spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    async fn checked(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(HarvestError::Sheets {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn sheets(&self, spreadsheet_id: &str) -> Result<Vec<SheetRef>> {
        let response = self
            .http
            .get(self.spreadsheet_url(spreadsheet_id))
            .bearer_auth(&self.token)
            .query(&[("fields", "sheets.properties")])
            .send()
            .await?;
        let meta: SpreadsheetMeta = Self::checked(response).await?.json().await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.into()).collect())
    }

    async fn find_sheet(&self, spreadsheet_id: &str, title: &str) -> Result<Option<SheetRef>> {
        Ok(self
            .sheets(spreadsheet_id)
            .await?
            .into_iter()
            .find(|s| s.title == title))
    }

    async fn batch_update(&self, spreadsheet_id: &str, requests: Value) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}:batchUpdate", self.spreadsheet_url(spreadsheet_id)))
            .bearer_auth(&self.token)
            .json(&json!({ "requests": requests }))
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }
}

impl RowStore for SheetsClient {
    #[instrument(level = "info", skip_all, fields(%spreadsheet_id, %sheet, column = column))]
    async fn read_column(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
        column: usize,
    ) -> Result<Vec<String>> {
        if self.find_sheet(spreadsheet_id, sheet).await?.is_none() {
            return Err(HarvestError::InputSheetMissing {
                spreadsheet_id: spreadsheet_id.to_string(),
                sheet: sheet.to_string(),
            });
        }

        let letter = column_letter(column);
        let range = format!("{}!{letter}:{letter}", quote_sheet_title(sheet));
        let response = self
            .http
            .get(self.values_url(spreadsheet_id, &range))
            .bearer_auth(&self.token)
            .query(&[("majorDimension", "COLUMNS")])
            .send()
            .await?;
        let values: ValueRange = Self::checked(response).await?.json().await?;

        let cells: Vec<String> = values
            .values
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect();
        debug!(count = cells.len(), "Read column");
        Ok(cells)
    }

    #[instrument(level = "info", skip_all, fields(%spreadsheet_id, %title))]
    async fn replace_sheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        rows: usize,
        columns: usize,
    ) -> Result<SheetRef> {
        if let Some(existing) = self.find_sheet(spreadsheet_id, title).await? {
            self.batch_update(
                spreadsheet_id,
                json!([{ "deleteSheet": { "sheetId": existing.id } }]),
            )
            .await?;
            info!(sheet_id = existing.id, "Deleted existing sheet");
        }

        let reply = self
            .batch_update(
                spreadsheet_id,
                json!([{
                    "addSheet": {
                        "properties": {
                            "title": title,
                            "gridProperties": { "rowCount": rows, "columnCount": columns }
                        }
                    }
                }]),
            )
            .await?;
        let properties = reply
            .pointer("/replies/0/addSheet/properties")
            .cloned()
            .ok_or_else(|| HarvestError::Sheets {
                status: 200,
                body: format!("addSheet reply without properties: {reply}"),
            })?;
        let sheet: SheetRef = serde_json::from_value::<SheetProperties>(properties)?.into();
        info!(sheet_id = sheet.id, rows, columns, "Created sheet");
        Ok(sheet)
    }

    #[instrument(level = "info", skip_all, fields(%spreadsheet_id, sheet = %sheet.title, start_row = start_row, rows = rows.len()))]
    async fn write_rows(
        &self,
        spreadsheet_id: &str,
        sheet: &SheetRef,
        start_row: usize,
        rows: &[OutputRow],
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let last_row = start_row + rows.len() - 1;
        if last_row > sheet.row_count {
            let extra = last_row - sheet.row_count;
            self.batch_update(
                spreadsheet_id,
                json!([{
                    "appendDimension": { "sheetId": sheet.id, "dimension": "ROWS", "length": extra }
                }]),
            )
            .await?;
            debug!(extra, "Grew sheet");
        }

        let range = format!("{}!{}", quote_sheet_title(&sheet.title), a1_cell(1, start_row));
        let response = self
            .http
            .put(self.values_url(spreadsheet_id, &range))
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "range": range, "majorDimension": "ROWS", "values": rows }))
            .send()
            .await?;
        Self::checked(response).await?;
        info!(columns = sheet.column_count, "Wrote rows");
        Ok(())
    }
}
