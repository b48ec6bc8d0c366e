//! CSV report writer
//!
//! The file is truncated and given its header once at start. Every row is
//! appended with its own open/close so a crash never loses earlier rows.

use super::OutputError;
use crate::crawler::PageResult;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str =
    "URL,Status,Title,Length,Redirects,Depth,SensitiveTypes,SensitiveCounts,SensitiveDetails,IsDuplicate";

/// Status written for URLs skipped by the danger keyword guard
pub const DANGEROUS_STATUS: &str = "DANGEROUS";

/// Status written for external URLs that were never fetched
pub const UNVISITED_EXTERNAL_STATUS: &str = "UNVISITED_EXTERNAL";

/// Append-only CSV report
#[derive(Debug)]
pub struct CsvReport {
    path: PathBuf,
}

impl CsvReport {
    /// Creates (or truncates) the report and writes the header
    pub fn create(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::create(&path).map_err(|source| OutputError::Write {
            path: path.display().to_string(),
            source,
        })?;
        writeln!(file, "{}", CSV_HEADER)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one result row
    pub fn append(&self, result: &PageResult) -> Result<(), OutputError> {
        self.append_line(&format_row(result))
    }

    /// Appends an appendix row carrying only a URL and a status tag
    pub fn append_marker(&self, url: &str, status: &str) -> Result<(), OutputError> {
        let row = [url, status, "", "0", "", "", "", "", "", "false"]
            .iter()
            .map(|field| escape(field))
            .collect::<Vec<_>>()
            .join(",");
        self.append_line(&row)
    }

    fn append_line(&self, line: &str) -> Result<(), OutputError> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|source| OutputError::Write {
                path: self.path.display().to_string(),
                source,
            })?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// Formats a result as one CSV line (without the newline)
pub fn format_row(result: &PageResult) -> String {
    let types = result
        .findings
        .iter()
        .map(|f| f.pattern_name.as_str())
        .collect::<Vec<_>>()
        .join("|");
    let counts = result
        .findings
        .iter()
        .map(|f| f.unique_match_count.to_string())
        .collect::<Vec<_>>()
        .join("|");
    let details = result
        .findings
        .iter()
        .map(|f| format!("{}: {}", f.pattern_name, f.sample_values.join("; ")))
        .collect::<Vec<_>>()
        .join("|");

    [
        result.url.to_string(),
        result.status.to_string(),
        result.title.clone(),
        result.length.to_string(),
        result.redirects.join("|"),
        result.depth.to_string(),
        types,
        counts,
        details,
        result.is_duplicate.to_string(),
    ]
    .iter()
    .map(|field| escape(field))
    .collect::<Vec<_>>()
    .join(",")
}

/// Quotes a field when it contains a delimiter, quote or line break
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::FetchStatus;
    use crate::sensitive::SensitiveFinding;
    use std::time::Duration;
    use tempfile::TempDir;
    use url::Url;

    fn sample() -> PageResult {
        let url = Url::parse("https://example.com/login").unwrap();
        PageResult {
            url: url.clone(),
            original_url: url,
            status: FetchStatus::Code(200),
            title: "Login, please".to_string(),
            length: 512,
            redirects: vec!["https://example.com/a".to_string(), "https://example.com/b".to_string()],
            elapsed: Duration::from_millis(30),
            content_type: "html".to_string(),
            findings: vec![
                SensitiveFinding {
                    pattern_name: "email".to_string(),
                    unique_match_count: 2,
                    sample_values: vec!["a@x.com".to_string(), "b@x.com".to_string()],
                },
                SensitiveFinding {
                    pattern_name: "jwt".to_string(),
                    unique_match_count: 1,
                    sample_values: vec!["eyJ...".to_string()],
                },
            ],
            depth: 1,
            is_duplicate: false,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_format_row() {
        let row = format_row(&sample());
        assert_eq!(
            row,
            "https://example.com/login,200,\"Login, please\",512,\
             https://example.com/a|https://example.com/b,1,email|jwt,2|1,\
             email: a@x.com; b@x.com|jwt: eyJ...,false"
        );
    }

    #[test]
    fn test_header_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");

        let report = CsvReport::create(&path).unwrap();
        report.append(&sample()).unwrap();
        report
            .append_marker("https://example.com/delete", DANGEROUS_STATUS)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("https://example.com/login,200,"));
        assert_eq!(lines[2], "https://example.com/delete,DANGEROUS,,0,,,,,,false");
    }

    #[test]
    fn test_create_fails_for_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("report.csv");
        assert!(CsvReport::create(&path).is_err());
    }
}
