//! CSV files (or standard input) as record sources.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use csv::StringRecordsIntoIter;
use sgmt_core::{CoreError, Record, RowSource};
use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{IngestError, Result};

/// Path that stands for standard input or standard output.
pub const STDIO_PATH: &str = "-";

pub fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO_PATH
}

/// A CSV stream whose header line names the record fields.
///
/// Values are paired with header names by position. Extra values on a
/// row are ignored; missing values leave the field absent.
pub struct CsvSource {
    path: PathBuf,
    label: String,
    fields: Vec<String>,
    records: StringRecordsIntoIter<Box<dyn Read>>,
}

impl CsvSource {
    /// Open `path` (`-` reads standard input) and read its header line.
    pub fn open(path: &Path, dialect: Dialect) -> Result<Self> {
        let input: Box<dyn Read> = if is_stdio(path) {
            Box::new(io::stdin())
        } else {
            let file = File::open(path).map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    IngestError::FileNotFound {
                        path: path.to_path_buf(),
                    }
                } else {
                    IngestError::FileRead {
                        path: path.to_path_buf(),
                        source,
                    }
                }
            })?;
            Box::new(file)
        };
        Self::from_reader(input, path, dialect)
    }

    /// Read CSV from an already opened reader; `path` is only used in messages.
    pub fn from_reader(input: Box<dyn Read>, path: &Path, dialect: Dialect) -> Result<Self> {
        let mut reader = dialect.reader_builder().from_reader(input);
        let fields = reader
            .headers()
            .map_err(|source| IngestError::CsvParse {
                path: path.to_path_buf(),
                source,
            })?
            .iter()
            .map(|name| name.trim_matches('\u{feff}').to_string())
            .collect::<Vec<_>>();
        let label = if is_stdio(path) {
            "<stdin>".to_string()
        } else {
            path.display().to_string()
        };
        debug!(source = %label, dialect = %dialect, fields = fields.len(), "read CSV header");
        Ok(Self {
            path: path.to_path_buf(),
            label,
            fields,
            records: reader.into_records(),
        })
    }

    /// Next data row, or `None` at the end of the input.
    pub fn next_record(&mut self) -> Option<Result<Record>> {
        let row = match self.records.next()? {
            Ok(row) => row,
            Err(source) => {
                return Some(Err(IngestError::CsvParse {
                    path: self.path.clone(),
                    source,
                }));
            }
        };
        let mut record = Record::new();
        for (name, value) in self.fields.iter().zip(row.iter()) {
            record.set(name.as_str(), value);
        }
        Some(Ok(record))
    }
}

impl Iterator for CsvSource {
    type Item = sgmt_core::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().map(|row| row.map_err(CoreError::from))
    }
}

impl RowSource for CsvSource {
    fn field_names(&self) -> &[String] {
        &self.fields
    }

    fn label(&self) -> &str {
        &self.label
    }
}
