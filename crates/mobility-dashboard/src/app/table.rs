//! Record table: search, sorting, clipboard copy, and CSV export

use mobility_data::{DatasetPage, cell_text};
use std::cmp::Ordering;

/// Table view state: search text and the active sort column.
#[derive(Clone, Debug, Default)]
pub struct TableState {
    pub search: String,
    /// Column index and direction; `true` is ascending.
    pub sort: Option<(usize, bool)>,
}

impl TableState {
    /// Clear search and sorting, used when a new page replaces the records.
    pub fn reset(&mut self) {
        self.search.clear();
        self.sort = None;
    }

    /// Cycle the sort on `column`: ascending, then descending, then off.
    pub fn toggle_sort(&mut self, column: usize) {
        self.sort = match self.sort {
            Some((c, true)) if c == column => Some((column, false)),
            Some((c, false)) if c == column => None,
            _ => Some((column, true)),
        };
    }

    /// Record indices to display, after filtering and sorting.
    ///
    /// The search is a case-insensitive substring match over every field.
    /// Sorting is numeric when both cells parse as numbers, lexicographic
    /// otherwise.
    pub fn visible_rows(&self, page: &DatasetPage) -> Vec<usize> {
        profiling::scope!("visible_rows");
        let needle = self.search.trim().to_lowercase();
        let mut rows: Vec<usize> = page
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                needle.is_empty()
                    || page
                        .fields
                        .iter()
                        .any(|f| cell_text(record, f).to_lowercase().contains(&needle))
            })
            .map(|(i, _)| i)
            .collect();

        if let Some((column, ascending)) = self.sort
            && let Some(field) = page.fields.get(column)
        {
            rows.sort_by(|&a, &b| {
                let va = cell_text(&page.records[a], field);
                let vb = cell_text(&page.records[b], field);
                let ordering = compare_cells(&va, &vb);
                if ascending { ordering } else { ordering.reverse() }
            });
        }
        rows
    }
}

/// Numeric-aware cell comparison. Empty cells sort last in ascending order.
fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(na), Ok(nb)) => na.partial_cmp(&nb).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Render the visible rows as tab-separated text for the clipboard, header
/// included.
pub fn rows_as_clipboard_text(page: &DatasetPage, rows: &[usize]) -> String {
    let mut out = page.fields.join("\t");
    out.push('\n');
    for &row in rows {
        let record = &page.records[row];
        let line: Vec<String> = page.fields.iter().map(|f| cell_text(record, f)).collect();
        out.push_str(&line.join("\t"));
        out.push('\n');
    }
    out
}

/// Write the visible rows to `path` as CSV, header included.
pub fn export_csv(
    page: &DatasetPage,
    rows: &[usize],
    path: &std::path::Path,
) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| e.to_string())?;
    writer
        .write_record(&page.fields)
        .map_err(|e| e.to_string())?;
    for &row in rows {
        let record = &page.records[row];
        let line: Vec<String> = page.fields.iter().map(|f| cell_text(record, f)).collect();
        writer.write_record(&line).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())?;
    tracing::info!(rows = rows.len(), path = %path.display(), "Exported CSV");
    Ok(())
}
