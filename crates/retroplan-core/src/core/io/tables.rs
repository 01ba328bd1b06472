use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Missing column '{column}' in '{path}'")]
    MissingColumn { path: String, column: &'static str },
    #[error("Invalid record {record} in '{path}': {message}")]
    InvalidRecord {
        path: String,
        record: usize,
        message: String,
    },
}

pub(crate) fn open_csv(path: &Path) -> Result<csv::Reader<File>, TableLoadError> {
    let file = File::open(path).map_err(|e| TableLoadError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file))
}

/// Finds the first header column whose name matches one of `names`, ignoring case.
pub(crate) fn find_column(
    reader: &mut csv::Reader<File>,
    names: &[&'static str],
    path: &Path,
) -> Result<Option<usize>, TableLoadError> {
    let headers = reader.headers().map_err(|e| TableLoadError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(names.iter().find_map(|name| {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
    }))
}

/// Deserializes every record of a CSV file with a header row.
pub(crate) fn read_records<T>(path: &Path) -> Result<Vec<T>, TableLoadError>
where
    T: serde::de::DeserializeOwned,
{
    let mut reader = open_csv(path)?;
    reader
        .deserialize()
        .enumerate()
        .map(|(idx, record)| {
            record.map_err(|e| TableLoadError::InvalidRecord {
                path: path.display().to_string(),
                record: idx + 1,
                message: e.to_string(),
            })
        })
        .collect()
}
