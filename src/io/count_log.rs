//! Counting ledger CSV export
//!
//! Rewrites the full file on each export: a quoted header row
//! `"Move In","In Time","Move Out","Out Time"` followed by the four ledger
//! columns zipped row-wise, shorter columns blank-filled. All fields are
//! quoted, matching the downstream consumer's expectations.

use crate::domain::report::CrossingLog;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// CSV writer for the crossing ledger
pub struct CountLogWriter {
    file_path: PathBuf,
}

impl CountLogWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let file_path = path.as_ref().to_path_buf();
        info!(file_path = %file_path.display(), "count_log_initialized");
        Self { file_path }
    }

    /// Write the ledger; returns true if successful, false otherwise
    pub fn write(&self, ledger: &CrossingLog) -> bool {
        match self.write_rows(ledger) {
            Ok(rows) => {
                info!(file = %self.file_path.display(), rows = %rows, "count_log_written");
                true
            }
            Err(e) => {
                error!(file = %self.file_path.display(), error = %e, "count_log_write_failed");
                false
            }
        }
    }

    fn write_rows(&self, ledger: &CrossingLog) -> std::io::Result<usize> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&self.file_path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "{}", csv_row(&["Move In", "In Time", "Move Out", "Out Time"]))?;

        let rows = ledger.longest();
        for i in 0..rows {
            let move_in = ledger.move_in.get(i).map(|n| n.to_string()).unwrap_or_default();
            let in_time = ledger.in_time.get(i).map(String::as_str).unwrap_or("");
            let move_out = ledger.move_out.get(i).map(|n| n.to_string()).unwrap_or_default();
            let out_time = ledger.out_time.get(i).map(String::as_str).unwrap_or("");
            writeln!(writer, "{}", csv_row(&[&move_in, in_time, &move_out, out_time]))?;
        }

        writer.flush()?;
        Ok(rows)
    }
}

/// Quote every field, doubling embedded quotes
fn csv_row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| format!("\"{}\"", field.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sample_ledger() -> CrossingLog {
        let mut ledger = CrossingLog::default();
        ledger.push_entry(1, "2026-01-05 10:00".to_string());
        ledger.push_entry(2, "2026-01-05 10:03".to_string());
        ledger.push_entry(3, "2026-01-05 10:07".to_string());
        ledger.push_exit(1, "2026-01-05 10:05".to_string());
        ledger
    }

    #[test]
    fn test_header_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counting_data.csv");
        let writer = CountLogWriter::new(&path);

        assert!(writer.write(&CrossingLog::default()));

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), r#""Move In","In Time","Move Out","Out Time""#);
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_shorter_columns_are_blank_filled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counting_data.csv");
        let writer = CountLogWriter::new(&path);

        assert!(writer.write(&sample_ledger()));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4); // header + 3 rows

        assert_eq!(lines[1], r#""1","2026-01-05 10:00","1","2026-01-05 10:05""#);
        // Exit column ran out after one row
        assert_eq!(lines[2], r#""2","2026-01-05 10:03","",""#);
        assert_eq!(lines[3], r#""3","2026-01-05 10:07","",""#);
    }

    #[test]
    fn test_rewrite_replaces_previous_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counting_data.csv");
        let writer = CountLogWriter::new(&path);

        writer.write(&sample_ledger());
        writer.write(&CrossingLog::default());

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1); // header only
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("data").join("logs").join("counting_data.csv");
        let writer = CountLogWriter::new(&nested);

        assert!(writer.write(&sample_ledger()));
        assert!(nested.exists());
    }

    #[test]
    fn test_quote_escaping() {
        assert_eq!(csv_row(&["a\"b", "c"]), r#""a""b","c""#);
    }
}
