//! Enrollment chart data embedded in an inline script.
//!
//! The detail page draws its enrollment history with
//! `google.visualization.arrayToDataTable([...])`. Only the array literal is
//! read; each `['date', enrolled, remaining, registered]` row becomes a
//! [`SelectionRecord`]. Rows of any other shape (the header row included)
//! are ignored.

use regex::Regex;

use crate::error::Result;
use crate::models::SelectionRecord;
use crate::utils::parse_decimal;

/// Marker that identifies the chart script.
pub const CHART_CALL_MARKER: &str = "google.visualization.arrayToDataTable";

const CALL_PATTERN: &str = r"google\.visualization\.arrayToDataTable\(\s*\[\s*([\s\S]*?)\s*\]\s*\)";
const ROW_PATTERN: &str = r"\[\s*'([^']+)',\s*(\d+),\s*(\d+),\s*(\d+)\s*\]";

/// Compiled chart-data sub-parser.
#[derive(Debug, Clone)]
pub struct ChartParser {
    call: Regex,
    row: Regex,
}

impl ChartParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            call: Regex::new(CALL_PATTERN)?,
            row: Regex::new(ROW_PATTERN)?,
        })
    }

    /// Extract the chart rows from one script's text.
    ///
    /// Returns `None` when the script holds no chart call, and
    /// `Some(rows)` (possibly empty) when it does.
    pub fn extract(&self, script: &str) -> Option<Vec<SelectionRecord>> {
        if !script.contains(CHART_CALL_MARKER) {
            return None;
        }
        let data = self.call.captures(script)?.get(1)?.as_str();

        let rows = self
            .row
            .captures_iter(data)
            .filter_map(|caps| {
                Some(SelectionRecord {
                    date: caps.get(1)?.as_str().to_string(),
                    enrolled: parse_decimal(caps.get(2)?.as_str())?,
                    remaining: parse_decimal(caps.get(3)?.as_str())?,
                    registered: parse_decimal(caps.get(4)?.as_str())?,
                })
            })
            .collect();
        Some(rows)
    }

    /// Rows of the first script that carries a chart call.
    pub fn extract_first<S: AsRef<str>>(
        &self,
        scripts: impl IntoIterator<Item = S>,
    ) -> Vec<SelectionRecord> {
        scripts
            .into_iter()
            .find_map(|script| self.extract(script.as_ref()))
            .unwrap_or_default()
    }
}
