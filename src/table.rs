//! CSV-backed SKU table: input loading and result assembly.
//!
//! The output file is the input file with twenty platform columns appended
//! (five fields per platform). Every cell starts as an empty placeholder, so
//! a SKU whose task never produced anything still serializes cleanly. Two
//! distinct missing-value markers matter downstream: an absent platform
//! leaves all five cells empty, while a found listing whose field could not
//! be parsed gets "N/A". Availability analysis keys off the url cell being
//! non-empty, so the two cases must never blur.

use std::path::Path;

use tracing::{info, warn};

use crate::connectors::{Platform, ProductDetails};
use crate::error::InputError;
use crate::pipeline::{SkuInput, SkuResult};

pub const ITEM_NAME_COLUMN: &str = "Item Name";
pub const UOM_COLUMN: &str = "UOM";

/// Per-platform output fields, in column order.
pub const PLATFORM_FIELDS: [&str; 5] = ["url", "mrp", "sale_price", "quantity", "uom"];

/// Marker for a field the listing page did not yield, on a platform where
/// the listing itself was found.
pub const UNPARSED_MARKER: &str = "N/A";

pub fn platform_column(platform: Platform, field: &str) -> String {
    format!("{}_{}", platform.as_str(), field)
}

#[derive(Debug, Clone)]
pub struct SkuTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SkuTable {
    // ==================== LOADING ====================

    /// Load the input CSV, validate the required columns, and append the
    /// empty platform columns.
    pub fn load(path: &Path, row_limit: Option<usize>) -> Result<Self, InputError> {
        let display_path = path.display().to_string();
        let mut reader = csv::Reader::from_path(path).map_err(|source| InputError::Unreadable {
            path: display_path.clone(),
            source,
        })?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|source| InputError::Unreadable {
                path: display_path.clone(),
                source,
            })?
            .iter()
            .map(str::to_string)
            .collect();

        for required in [ITEM_NAME_COLUMN, UOM_COLUMN] {
            if !headers.iter().any(|h| h == required) {
                return Err(InputError::MissingColumn {
                    path: display_path,
                    column: required.to_string(),
                });
            }
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| InputError::Unreadable {
                path: display_path.clone(),
                source,
            })?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            // Ragged rows happen in hand-edited files; normalize to the
            // header width.
            row.resize(headers.len(), String::new());
            rows.push(row);
            if let Some(limit) = row_limit {
                if rows.len() >= limit {
                    warn!("row limit reached, processing first {} rows only", limit);
                    break;
                }
            }
        }

        info!("loaded {} SKUs from {}", rows.len(), display_path);

        let mut table = Self { headers, rows };
        table.append_platform_columns();
        Ok(table)
    }

    fn append_platform_columns(&mut self) {
        for platform in Platform::ALL {
            for field in PLATFORM_FIELDS {
                let column = platform_column(platform, field);
                if self.headers.iter().any(|h| *h == column) {
                    continue;
                }
                self.headers.push(column);
                for row in &mut self.rows {
                    row.push(String::new());
                }
            }
        }
    }

    // ==================== ACCESS ====================

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// The work list: one entry per row, carrying the row index as identity.
    pub fn sku_inputs(&self) -> Vec<SkuInput> {
        let name_col = self
            .column_index(ITEM_NAME_COLUMN)
            .unwrap_or_default();
        let uom_col = self.column_index(UOM_COLUMN).unwrap_or_default();
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| SkuInput {
                index,
                item_name: row.get(name_col).cloned().unwrap_or_default(),
                uom: row.get(uom_col).cloned().unwrap_or_default(),
            })
            .collect()
    }

    // ==================== ASSEMBLY ====================

    /// Write one SKU's per-platform outcome into its row. Absent platforms
    /// leave the empty placeholders untouched.
    pub fn apply_result(&mut self, row_index: usize, result: &SkuResult) {
        for platform in Platform::ALL {
            let Some(Some(details)) = result.get(&platform) else {
                continue;
            };
            self.set_platform_cells(row_index, platform, details);
        }
    }

    fn set_platform_cells(&mut self, row_index: usize, platform: Platform, details: &ProductDetails) {
        let values = [
            details.url.clone(),
            marker_or(&details.mrp),
            marker_or(&details.sale_price),
            marker_or(&details.quantity),
            marker_or(&details.uom),
        ];
        for (field, value) in PLATFORM_FIELDS.iter().zip(values) {
            let Some(col) = self.column_index(&platform_column(platform, field)) else {
                continue;
            };
            if let Some(row) = self.rows.get_mut(row_index) {
                row[col] = value;
            }
        }
    }

    /// Append a derived column. Values are padded or truncated to the row
    /// count; an existing column with the same name is overwritten.
    pub fn add_column(&mut self, name: &str, mut values: Vec<String>) {
        values.resize(self.rows.len(), String::new());
        if let Some(col) = self.column_index(name) {
            for (row, value) in self.rows.iter_mut().zip(values) {
                row[col] = value;
            }
            return;
        }
        self.headers.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    // ==================== SAVING ====================

    pub fn save(&self, path: &Path) -> Result<(), InputError> {
        let display_path = path.display().to_string();
        let wrap = |source| InputError::WriteFailed {
            path: display_path.clone(),
            source,
        };

        let mut writer = csv::Writer::from_path(path).map_err(wrap)?;
        writer.write_record(&self.headers).map_err(wrap)?;
        for row in &self.rows {
            writer.write_record(row).map_err(wrap)?;
        }
        writer
            .flush()
            .map_err(|e| InputError::WriteFailed {
                path: display_path.clone(),
                source: csv::Error::from(e),
            })?;
        info!("wrote {} rows to {}", self.rows.len(), display_path);
        Ok(())
    }
}

fn marker_or(field: &Option<String>) -> String {
    field.clone().unwrap_or_else(|| UNPARSED_MARKER.to_string())
}
