//! Flat-file storage for the ledger.
//!
//! Every file is a headerless, comma separated list of records, one per line.
//! Saving always rewrites the whole file from the in-memory collection.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A type that is stored as one line of a ledger file.
pub trait Record: Sized {
    fn to_fields(&self) -> Vec<String>;
    fn from_fields(fields: &csv::StringRecord) -> Result<Self, RecordError>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected at least {expected} fields, found {found}")]
    MissingField { expected: usize, found: usize },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("malformed line: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("failed to access {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to read or write {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{}:{line}: {source}", .path.display())]
    Record {
        path: PathBuf,
        line: u64,
        source: RecordError,
    },
}

/// How saves replace the previous file contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Truncate and rewrite in place. A crash mid-write can leave a partial file.
    #[default]
    Overwrite,

    /// Write a sibling temporary file, then rename it over the target.
    Atomic,
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::None);
    builder
}

fn writer_builder() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder.has_headers(false).flexible(true);
    builder
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(|field| field.is_empty())
}

/// Reads every record of `path`. Returns `Ok(None)` when the file does not exist.
pub fn read_records<T: Record>(path: &Path) -> Result<Option<Vec<T>>, PersistenceError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut records = Vec::new();
    for result in reader_builder().from_reader(file).into_records() {
        let raw = result.map_err(|source| PersistenceError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if is_blank(&raw) {
            continue;
        }

        let record = T::from_fields(&raw).map_err(|source| PersistenceError::Record {
            path: path.to_path_buf(),
            line: raw.position().map_or(0, |p| p.line()),
            source,
        })?;
        records.push(record);
    }

    debug!("read {} records from {}", records.len(), path.display());
    Ok(Some(records))
}

/// Replaces the contents of `path` with `records`, one per line.
pub fn write_records<'a, T, I>(path: &Path, records: I, mode: WriteMode) -> Result<(), PersistenceError>
where
    T: Record + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let io_err = |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let target = match mode {
        WriteMode::Overwrite => path.to_path_buf(),
        WriteMode::Atomic => temporary_path(path),
    };

    let file = File::create(&target).map_err(io_err)?;
    let mut writer = writer_builder().from_writer(file);
    let mut count = 0usize;
    for record in records {
        writer
            .write_record(record.to_fields())
            .map_err(|source| PersistenceError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
        count += 1;
    }

    let file = writer.into_inner().map_err(|e| io_err(e.into_error()))?;
    if mode == WriteMode::Atomic {
        file.sync_all().map_err(io_err)?;
        fs::rename(&target, path).map_err(io_err)?;
    }

    debug!("wrote {count} records to {}", path.display());
    Ok(())
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Encodes a single record without the line terminator.
pub fn encode_line<T: Record>(record: &T) -> Result<String, RecordError> {
    let mut writer = writer_builder().from_writer(vec![]);
    writer
        .write_record(record.to_fields())
        .map_err(|e| RecordError::Malformed(e.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| RecordError::Malformed(e.error().to_string()))?;
    let line = String::from_utf8(bytes).map_err(|e| RecordError::Malformed(e.to_string()))?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

/// Decodes a single line previously produced by [`encode_line`] or found in a ledger file.
pub fn decode_line<T: Record>(line: &str) -> Result<T, RecordError> {
    let mut reader = reader_builder().from_reader(line.as_bytes());
    let mut raw = csv::StringRecord::new();
    let found = reader
        .read_record(&mut raw)
        .map_err(|e| RecordError::Malformed(e.to_string()))?;
    if !found {
        return Err(RecordError::Malformed("empty line".to_string()));
    }
    T::from_fields(&raw)
}
