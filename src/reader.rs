use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::ImportError;
use crate::model::table::{Row, Table};

/// Load a CSV file with a header row into a [`Table`].
pub fn read_table(path: &Path) -> Result<Table, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::File {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(BufReader::new(file), path)
}

/// Parse CSV from any reader; `path` is only used in error messages.
///
/// Rows shorter than the header are accepted and their missing cells read as absent. Rows
/// with more cells than the header are rejected.
pub fn parse_table<R: Read>(reader: R, path: &Path) -> Result<Table, ImportError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| classify(e, path))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(ImportError::Format {
            path: path.to_path_buf(),
            message: "missing header row".into(),
        });
    }
    if let Some(duplicate) = first_duplicate(&headers) {
        return Err(ImportError::Format {
            path: path.to_path_buf(),
            message: format!("duplicate column \"{duplicate}\" in header row"),
        });
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| classify(e, path))?;
        if record.len() > headers.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(ImportError::Format {
                path: path.to_path_buf(),
                message: format!(
                    "line {line} has {} fields, but the header has {}",
                    record.len(),
                    headers.len()
                ),
            });
        }
        let values: HashMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(Row::new(values));
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "read input table");
    Ok(Table::new(headers, rows))
}

fn first_duplicate(headers: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    headers
        .iter()
        .filter(|h| !h.is_empty())
        .find(|h| !seen.insert(h.as_str()))
        .map(String::as_str)
}

fn classify(err: csv::Error, path: &Path) -> ImportError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => ImportError::File {
            path: path.to_path_buf(),
            source,
        },
        _ => ImportError::Format {
            path: path.to_path_buf(),
            message,
        },
    }
}
