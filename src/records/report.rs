use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Context, Result};
use crate::fetch::TimeOffset;

use super::faults::ChannelFault;

/// Column order shared by the JSON objects, the CSV export, and the table view.
pub const REPORT_COLUMNS: &[&str] = &[
    "symbol",
    "description",
    "day_0",
    "day_7",
    "day_30",
    "day_90",
    "year_1",
    "year_2",
    "year_3",
    "url",
];

/// One row of the whales report. Empty strings mark lookbacks that did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierReport {
    pub symbol: String,
    pub description: String,
    pub day_0: String,
    pub day_7: String,
    pub day_30: String,
    pub day_90: String,
    pub year_1: String,
    pub year_2: String,
    pub year_3: String,
    pub url: String,
}

impl IdentifierReport {
    pub fn new(symbol: &str, description: &str, url: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            description: description.to_string(),
            day_0: String::new(),
            day_7: String::new(),
            day_30: String::new(),
            day_90: String::new(),
            year_1: String::new(),
            year_2: String::new(),
            year_3: String::new(),
            url: url.to_string(),
        }
    }

    /// Value slot for one of the fixed offsets; `None` for any other offset.
    pub fn slot(&self, offset: TimeOffset) -> Option<&str> {
        let slot = match offset {
            TimeOffset::Days(0) => &self.day_0,
            TimeOffset::Days(7) => &self.day_7,
            TimeOffset::Days(30) => &self.day_30,
            TimeOffset::Days(90) => &self.day_90,
            TimeOffset::Years(1) => &self.year_1,
            TimeOffset::Years(2) => &self.year_2,
            TimeOffset::Years(3) => &self.year_3,
            _ => return None,
        };
        Some(slot.as_str())
    }

    pub fn slot_mut(&mut self, offset: TimeOffset) -> Option<&mut String> {
        match offset {
            TimeOffset::Days(0) => Some(&mut self.day_0),
            TimeOffset::Days(7) => Some(&mut self.day_7),
            TimeOffset::Days(30) => Some(&mut self.day_30),
            TimeOffset::Days(90) => Some(&mut self.day_90),
            TimeOffset::Years(1) => Some(&mut self.year_1),
            TimeOffset::Years(2) => Some(&mut self.year_2),
            TimeOffset::Years(3) => Some(&mut self.year_3),
            _ => None,
        }
    }

    fn columns(&self) -> [&str; 10] {
        [
            self.symbol.as_str(),
            self.description.as_str(),
            self.day_0.as_str(),
            self.day_7.as_str(),
            self.day_30.as_str(),
            self.day_90.as_str(),
            self.year_1.as_str(),
            self.year_2.as_str(),
            self.year_3.as_str(),
            self.url.as_str(),
        ]
    }
}

/// Ordered report rows (input order, dropped identifiers omitted) plus the remote faults
/// seen while building them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub records: Vec<IdentifierReport>,
    pub faults: Vec<ChannelFault>,
}

impl BatchReport {
    pub fn new(records: Vec<IdentifierReport>, faults: Vec<ChannelFault>) -> Self {
        Self { records, faults }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IdentifierReport> {
        self.records.iter()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.iter().map(|r| r.symbol.as_str()).collect()
    }

    /// Write the rows as a pretty-printed JSON array.
    pub fn save_json<P: AsRef<Path>>(&self, file_path: P) -> Result<()> {
        let path = file_path.as_ref();
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load rows written by `save_json`. Faults are not persisted there.
    pub fn load_json<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let path = file_path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read report {}", path.display()))?;
        let records: Vec<IdentifierReport> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse report {}", path.display()))?;
        Ok(Self::new(records, Vec::new()))
    }

    pub fn save_csv<P: AsRef<Path>>(&self, file_path: P) -> Result<()> {
        let path = file_path.as_ref();
        let mut writer = csv::Writer::from_path(path).context("Failed to create CSV writer")?;

        writer.write_record(REPORT_COLUMNS)?;
        for record in &self.records {
            writer.write_record(record.columns())?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Plain-text table of every row, URL column left out.
    pub fn render_table(&self) -> String {
        let headers = &REPORT_COLUMNS[..REPORT_COLUMNS.len() - 1];
        let rows: Vec<Vec<&str>> = self
            .iter()
            .map(|record| record.columns()[..headers.len()].to_vec())
            .collect();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let mut push_row = |cells: &[&str]| {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect();
            let _ = writeln!(out, "{}", line.join("  ").trim_end());
        };

        push_row(headers);
        for row in &rows {
            push_row(row.as_slice());
        }
        out
    }
}
