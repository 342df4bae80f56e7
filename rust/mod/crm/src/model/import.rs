use serde::Serialize;

/// Outcome of a CSV import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Data rows seen, header excluded.
    pub total_rows: usize,
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
}

/// A data row that was not imported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// 1-based data row number (the first row after the header is 1).
    pub row: usize,
    pub reason: String,
}
